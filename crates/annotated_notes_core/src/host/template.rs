//! Template evaluation contract and a small reference renderer.
//!
//! # Responsibility
//! - Define how the core asks the host to evaluate an annotation template.
//! - Provide `SimpleTemplateRenderer` for the in-process host and the CLI.
//!
//! # Invariants
//! - Evaluation is side-effect free with respect to the bound records.
//! - Unterminated tags, unknown bindings and unknown filters are errors, not
//!   silently rendered text.

use crate::model::record::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("valid template tag regex"));
static EXPRESSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([A-Za-z_][A-Za-z0-9_]*)(?:\.([A-Za-z_][A-Za-z0-9_]*))?\s*((?:\|\s*[A-Za-z_]+\s*)*)$",
    )
    .expect("valid template expression regex")
});

/// Name -> record bindings visible to one evaluation.
#[derive(Default)]
pub struct TemplateContext<'a> {
    bindings: Vec<(String, &'a dyn Record)>,
}

impl<'a> TemplateContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `record` under `name`, replacing an earlier binding of the same
    /// name.
    pub fn bind(&mut self, name: impl Into<String>, record: &'a dyn Record) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(bound, _)| *bound == name) {
            Some(slot) => slot.1 = record,
            None => self.bindings.push((name, record)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a dyn Record> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, record)| *record)
    }

    /// Bound names in binding order.
    pub fn names(&self) -> Vec<&str> {
        self.bindings.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Host template service.
pub trait TemplateEvaluator {
    fn render(&self, template: &str, context: &TemplateContext<'_>)
        -> Result<String, TemplateError>;
}

/// Template evaluation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Syntax(String),
    UnknownVariable(String),
    UnknownFilter(String),
    /// Failure reported by a host evaluator.
    Host(String),
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(details) => write!(f, "template syntax error: {details}"),
            Self::UnknownVariable(name) => write!(f, "unknown template variable: {name}"),
            Self::UnknownFilter(name) => write!(f, "unknown template filter: {name}"),
            Self::Host(details) => write!(f, "template evaluation failed: {details}"),
        }
    }
}

impl Error for TemplateError {}

/// Renders `{{ binding.attribute | filter }}` placeholders.
///
/// A bare `{{ binding }}` renders the record's `title`. Missing attributes
/// render as empty text. Supported filters: `lower`, `upper`, `trim`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTemplateRenderer;

impl TemplateEvaluator for SimpleTemplateRenderer {
    fn render(
        &self,
        template: &str,
        context: &TemplateContext<'_>,
    ) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(template.len());
        let mut last_end = 0;
        for captures in TAG_RE.captures_iter(template) {
            let Some(tag) = captures.get(0) else {
                continue;
            };
            push_literal(&template[last_end..tag.start()], &mut output)?;
            let expression = captures.get(1).map_or("", |m| m.as_str());
            output.push_str(&evaluate_expression(expression, context)?);
            last_end = tag.end();
        }
        push_literal(&template[last_end..], &mut output)?;
        Ok(output)
    }
}

fn push_literal(segment: &str, output: &mut String) -> Result<(), TemplateError> {
    if segment.contains("{{") {
        return Err(TemplateError::Syntax("unterminated `{{` tag".to_string()));
    }
    output.push_str(segment);
    Ok(())
}

fn evaluate_expression(
    expression: &str,
    context: &TemplateContext<'_>,
) -> Result<String, TemplateError> {
    let captures = EXPRESSION_RE.captures(expression).ok_or_else(|| {
        TemplateError::Syntax(format!("invalid expression `{}`", expression.trim()))
    })?;
    let name = captures.get(1).map_or("", |m| m.as_str());
    let record = context
        .get(name)
        .ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;

    let attribute = captures.get(2).map_or("title", |m| m.as_str());
    let mut value = record.attribute(attribute).unwrap_or_default();

    let filters = captures.get(3).map_or("", |m| m.as_str());
    for filter in filters.split('|').map(str::trim).filter(|f| !f.is_empty()) {
        value = apply_filter(filter, value)?;
    }
    Ok(value)
}

fn apply_filter(filter: &str, value: String) -> Result<String, TemplateError> {
    match filter {
        "lower" => Ok(value.to_lowercase()),
        "upper" => Ok(value.to_uppercase()),
        "trim" => Ok(value.trim().to_string()),
        other => Err(TemplateError::UnknownFilter(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{SimpleTemplateRenderer, TemplateContext, TemplateError, TemplateEvaluator};
    use crate::model::record::{ContentRecord, RecordKind};

    fn render(template: &str, record: &ContentRecord) -> Result<String, TemplateError> {
        let mut context = TemplateContext::new();
        context.bind("element", record);
        context.bind("entry", record);
        SimpleTemplateRenderer.render(template, &context)
    }

    fn entry() -> ContentRecord {
        ContentRecord::new(12, 1, RecordKind::Entry).with_attribute("title", " Hello ")
    }

    #[test]
    fn renders_attributes_from_any_binding() {
        let record = entry();
        assert_eq!(
            render("{{ element.id }}/{{entry.siteId}}", &record).expect("renders"),
            "12/1"
        );
    }

    #[test]
    fn applies_filters_in_order() {
        let record = entry();
        assert_eq!(
            render("{{ element.title | trim | upper }}!", &record).expect("renders"),
            "HELLO!"
        );
    }

    #[test]
    fn bare_binding_renders_title_and_missing_attribute_is_empty() {
        let record = entry();
        assert_eq!(render("[{{ entry }}]", &record).expect("renders"), "[ Hello ]");
        assert_eq!(render("[{{ entry.slug }}]", &record).expect("renders"), "[]");
    }

    #[test]
    fn empty_template_renders_empty_text() {
        assert_eq!(render("", &entry()).expect("renders"), "");
    }

    #[test]
    fn reports_syntax_and_lookup_errors() {
        let record = entry();
        assert!(matches!(
            render("{{ element.title", &record),
            Err(TemplateError::Syntax(_))
        ));
        assert!(matches!(
            render("{{ element..title }}", &record),
            Err(TemplateError::Syntax(_))
        ));
        assert_eq!(
            render("{{ asset.title }}", &record),
            Err(TemplateError::UnknownVariable("asset".to_string()))
        );
        assert_eq!(
            render("{{ element.title | shout }}", &record),
            Err(TemplateError::UnknownFilter("shout".to_string()))
        );
    }

    #[test]
    fn rebinding_a_name_replaces_it() {
        let first = entry();
        let second = ContentRecord::new(99, 1, RecordKind::Entry);
        let mut context = TemplateContext::new();
        context.bind("element", &first);
        context.bind("element", &second);
        assert_eq!(context.names(), vec!["element"]);
        assert_eq!(
            SimpleTemplateRenderer
                .render("{{ element.id }}", &context)
                .expect("renders"),
            "99"
        );
    }
}
