//! Annotation engine.
//!
//! # Responsibility
//! - Find annotated-notes fields in a record's layout.
//! - Evaluate each field's template against the record and fill annotatable
//!   rows.
//!
//! # Invariants
//! - Only rows with a non-empty note and an empty annotation are changed.
//! - Row order and row count are preserved.
//! - A field contributes to the result only when at least one row changed,
//!   so an empty result means "nothing to save".
//! - Template failures are logged and skip the field; they never escape.

use crate::field::definition::{FieldDefinition, FieldKind};
use crate::field::settings::AnnotatedNotesSettings;
use crate::host::{RenderEnvironment, SiteRenderScope, TemplateContext, TemplateEvaluator};
use crate::logging::sanitize_message;
use crate::model::record::{AnnotatedContent, Record};
use crate::model::row::NoteRow;
use log::{debug, warn};

/// Binding name under which every record is visible to templates.
pub const ELEMENT_BINDING: &str = "element";

const MAX_LOGGED_ERROR_CHARS: usize = 240;

/// Annotation engine bound to one host's template services.
pub struct AnnotationService<'h, H: TemplateEvaluator + RenderEnvironment + ?Sized> {
    host: &'h H,
}

impl<'h, H: TemplateEvaluator + RenderEnvironment + ?Sized> AnnotationService<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Computes annotated rows for every annotated-notes field of the
    /// record's own layout. Records without a layout yield no content.
    pub fn annotated_content(&self, record: &dyn Record) -> AnnotatedContent {
        match record.field_layout() {
            Some(fields) => self.compute_annotated_content(record, fields),
            None => AnnotatedContent::new(),
        }
    }

    /// Computes `handle -> rows` for fields of `fields` whose rows changed.
    pub fn compute_annotated_content(
        &self,
        record: &dyn Record,
        fields: &[FieldDefinition],
    ) -> AnnotatedContent {
        let mut content = AnnotatedContent::new();

        for field in fields {
            let FieldKind::AnnotatedNotes(settings) = &field.kind else {
                continue;
            };
            let rows = match record.table_rows(&field.handle) {
                Some(rows) if !rows.is_empty() => rows,
                _ => continue,
            };
            let Some(annotation) = self.calculate_annotation(settings, &field.handle, record)
            else {
                continue;
            };

            let filled = fill_rows(rows, &annotation);
            let changed = filled
                .iter()
                .zip(rows)
                .filter(|(after, before)| after != before)
                .count();
            if changed == 0 {
                continue;
            }

            debug!(
                "event=annotation_field_filled module=engine record={} field={} rows={}",
                record.key(),
                field.handle,
                changed
            );
            content.insert(field.handle.clone(), filled);
        }

        content
    }

    /// Evaluates the field template for `record` in site render mode.
    ///
    /// Returns `None` when evaluation fails; the failure is logged.
    pub fn calculate_annotation(
        &self,
        settings: &AnnotatedNotesSettings,
        field_handle: &str,
        record: &dyn Record,
    ) -> Option<String> {
        let context = evaluation_context(record);

        let rendered = {
            let _scope = SiteRenderScope::enter(self.host);
            self.host.render(settings.annotation_template(), &context)
        };

        match rendered {
            Ok(annotation) => Some(annotation),
            Err(err) => {
                let key = record.key();
                warn!(
                    "event=annotation_render_failed module=engine status=error record_id={} site_id={} field={} error={}",
                    key.record_id,
                    key.site_id,
                    field_handle,
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                None
            }
        }
    }
}

/// Builds the bindings a template sees: the record as `element`, and again
/// under its lower-cased reference handle when it has one.
pub fn evaluation_context(record: &dyn Record) -> TemplateContext<'_> {
    let mut context = TemplateContext::new();
    context.bind(ELEMENT_BINDING, record);
    if let Some(ref_handle) = record.ref_handle() {
        context.bind(ref_handle.to_lowercase(), record);
    }
    context
}

/// Sets `annotation` on every row that has a note but no annotation.
///
/// Pure and total; other rows are copied unchanged.
pub fn fill_rows(rows: &[NoteRow], annotation: &str) -> Vec<NoteRow> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            if row.is_annotatable() {
                row.set_annotation(annotation);
            }
            row
        })
        .collect()
}
