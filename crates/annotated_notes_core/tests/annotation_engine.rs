use annotated_notes_core::{
    fill_rows, AnnotatedNotesSettings, AnnotationService, ContentRecord, ExtensionRegistry,
    FieldDefinition, FieldKind, FieldValue, InMemoryHost, NoteRow, Record, RecordKind,
    RenderEnvironment, SimpleTemplateRenderer, TemplateContext, TemplateError, TemplateEvaluator,
    TemplateMode,
};
use serde_json::json;

fn notes_field(handle: &str, template: &str) -> FieldDefinition {
    FieldDefinition::annotated_notes(handle, AnnotatedNotesSettings::new(template))
}

fn entry(rows: Vec<NoteRow>) -> ContentRecord {
    ContentRecord::new(5, 1, RecordKind::Entry)
        .with_attribute("title", "Hello")
        .with_field(
            notes_field("notes", "{{ element.title }}"),
            Some(FieldValue::Rows(rows)),
        )
}

fn host() -> InMemoryHost {
    InMemoryHost::new(ExtensionRegistry::new())
}

#[test]
fn fills_annotation_from_record_title() {
    let host = host();
    let record = entry(vec![NoteRow::new("world", "")]);

    let content = AnnotationService::new(&host).annotated_content(&record);

    assert_eq!(content.len(), 1);
    assert_eq!(content["notes"], vec![NoteRow::new("world", "Hello")]);
}

#[test]
fn rows_without_annotatable_entries_produce_no_content() {
    let host = host();
    let record = entry(vec![NoteRow::new("", ""), NoteRow::new("x", "y")]);

    assert!(AnnotationService::new(&host)
        .annotated_content(&record)
        .is_empty());
}

struct FailingEvaluator;

impl TemplateEvaluator for FailingEvaluator {
    fn render(&self, _: &str, _: &TemplateContext<'_>) -> Result<String, TemplateError> {
        Err(TemplateError::Host("template exploded".to_string()))
    }
}

#[test]
fn evaluation_failure_yields_empty_content() {
    let host = InMemoryHost::with_evaluator(ExtensionRegistry::new(), Box::new(FailingEvaluator));
    let record = entry(vec![NoteRow::new("world", "")]);

    assert!(AnnotationService::new(&host)
        .annotated_content(&record)
        .is_empty());
}

#[test]
fn malformed_template_skips_only_that_field() {
    let host = host();
    let record = ContentRecord::new(9, 2, RecordKind::Entry)
        .with_attribute("title", "Kept")
        .with_field(
            notes_field("broken", "{{ element.title"),
            Some(FieldValue::Rows(vec![NoteRow::new("a", "")])),
        )
        .with_field(
            notes_field("working", "{{ entry.title }}"),
            Some(FieldValue::Rows(vec![NoteRow::new("b", "")])),
        );

    let content = AnnotationService::new(&host).annotated_content(&record);

    assert!(!content.contains_key("broken"));
    assert_eq!(content["working"], vec![NoteRow::new("b", "Kept")]);
}

#[test]
fn empty_template_result_is_applied() {
    let host = host();
    let record = ContentRecord::new(1, 1, RecordKind::Entry).with_field(
        notes_field("notes", ""),
        Some(FieldValue::Rows(vec![NoteRow::from_value(json!({"note": "n"}))
            .expect("row parses")])),
    );

    let content = AnnotationService::new(&host).annotated_content(&record);

    let rows = content.get("notes").expect("annotation cell added");
    assert_eq!(rows[0].cell("annotation"), Some(&json!("")));
}

#[test]
fn unchanged_fields_are_left_out_of_mixed_layouts() {
    let host = host();
    let record = ContentRecord::new(3, 1, RecordKind::Category)
        .with_attribute("title", "Cat")
        .with_field(
            notes_field("done", "{{ category.title }}"),
            Some(FieldValue::Rows(vec![NoteRow::new("x", "already")])),
        )
        .with_field(
            notes_field("todo", "{{ category.title | lower }}"),
            Some(FieldValue::Rows(vec![NoteRow::new("x", "")])),
        )
        .with_field(
            FieldDefinition::new("summary", FieldKind::PlainText),
            Some(FieldValue::Text("text".to_string())),
        )
        .with_field(notes_field("missing", "{{ element.title }}"), None);

    let content = AnnotationService::new(&host).annotated_content(&record);

    assert_eq!(content.keys().collect::<Vec<_>>(), vec!["todo"]);
    assert_eq!(content["todo"], vec![NoteRow::new("x", "cat")]);
}

#[test]
fn extra_cells_pass_through_and_order_is_kept() {
    let host = host();
    let mut record = ContentRecord::new(4, 1, RecordKind::Entry)
        .with_attribute("title", "T")
        .with_field(notes_field("notes", "{{ element.title }}"), None);
    record
        .set_rows_json(
            "notes",
            json!([
                {"note": "first", "annotation": "", "col1": "first", "col2": "", "flag": true},
                {"note": "", "annotation": ""},
                {"note": "third", "annotation": "old"}
            ]),
        )
        .expect("rows parse");
    let before = record.table_rows("notes").expect("rows").to_vec();

    let content = AnnotationService::new(&host).annotated_content(&record);
    let rows = &content["notes"];

    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0].clone().into_value(),
        json!({"note": "first", "annotation": "T", "col1": "first", "col2": "T", "flag": true})
    );
    assert_eq!(rows[1], before[1]);
    assert_eq!(rows[2], before[2]);
}

#[test]
fn rows_with_filled_alias_column_are_left_alone() {
    let host = host();
    let mut record = ContentRecord::new(8, 1, RecordKind::Entry)
        .with_attribute("title", "NEW")
        .with_field(notes_field("notes", "{{ element.title }}"), None);
    record
        .set_rows_json(
            "notes",
            json!([
                {"note": "x", "annotation": "", "col1": "x", "col2": "kept"},
                {"note": "x", "annotation": null, "col2": "kept"}
            ]),
        )
        .expect("rows parse");
    let before = record.table_rows("notes").expect("rows").to_vec();

    assert_eq!(fill_rows(&before, "NEW"), before);
    assert!(AnnotationService::new(&host)
        .annotated_content(&record)
        .is_empty());
}

#[test]
fn fill_rows_preserves_count_and_never_overwrites() {
    let rows = vec![
        NoteRow::new("a", ""),
        NoteRow::new("", ""),
        NoteRow::new("c", "kept"),
        NoteRow::empty(),
    ];
    let filled = fill_rows(&rows, "A");

    assert_eq!(filled.len(), rows.len());
    assert_eq!(filled[0].annotation(), "A");
    assert_eq!(filled[1], rows[1]);
    assert_eq!(filled[2].annotation(), "kept");
    assert_eq!(filled[3], NoteRow::empty());
    assert_eq!(fill_rows(&filled, "A"), filled);
}

#[test]
fn compute_accepts_padded_rows_from_input_normalization() {
    let settings = AnnotatedNotesSettings::new("{{ element.title }}").with_min_rows(4);
    let padded = settings.input_rows(&[NoteRow::new("n", "")]);
    let record = ContentRecord::new(6, 1, RecordKind::Entry)
        .with_attribute("title", "P")
        .with_field(
            FieldDefinition::annotated_notes("notes", settings),
            Some(FieldValue::Rows(padded)),
        );

    let content = AnnotationService::new(&SimpleHost).annotated_content(&record);

    let rows = &content["notes"];
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], NoteRow::new("n", "P"));
    assert_eq!(rows[3], NoteRow::empty());
}

/// Minimal host that only renders; render settings are inert.
struct SimpleHost;

impl TemplateEvaluator for SimpleHost {
    fn render(
        &self,
        template: &str,
        context: &TemplateContext<'_>,
    ) -> Result<String, TemplateError> {
        SimpleTemplateRenderer.render(template, context)
    }
}

impl RenderEnvironment for SimpleHost {
    fn template_mode(&self) -> TemplateMode {
        TemplateMode::Site
    }
    fn set_template_mode(&self, _mode: TemplateMode) {}
    fn eager_transforms(&self) -> bool {
        true
    }
    fn set_eager_transforms(&self, _enabled: bool) {}
}
