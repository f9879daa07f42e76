//! Field definitions attached to a record's field layout.

use crate::field::capability::FieldCapability;
use crate::field::settings::AnnotatedNotesSettings;
use serde::{Deserialize, Serialize};

/// Type id of the annotated-notes field.
pub const ANNOTATED_NOTES_FIELD_TYPE: &str = "annotated-notes";
/// Type id of the host's generic table field.
pub const TABLE_FIELD_TYPE: &str = "table";
/// Type id of the host's plain-text field.
pub const PLAIN_TEXT_FIELD_TYPE: &str = "plain-text";

/// Closed set of field types the core can see in a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "kebab-case")]
pub enum FieldKind {
    AnnotatedNotes(AnnotatedNotesSettings),
    Table,
    PlainText,
}

impl FieldKind {
    /// Stable type id as registered with the host.
    pub fn type_id(&self) -> &'static str {
        match self {
            Self::AnnotatedNotes(_) => ANNOTATED_NOTES_FIELD_TYPE,
            Self::Table => TABLE_FIELD_TYPE,
            Self::PlainText => PLAIN_TEXT_FIELD_TYPE,
        }
    }

    pub fn capabilities(&self) -> &'static [FieldCapability] {
        match self {
            Self::AnnotatedNotes(_) => &[FieldCapability::Tabular, FieldCapability::Annotating],
            Self::Table => &[FieldCapability::Tabular],
            Self::PlainText => &[FieldCapability::Text],
        }
    }

    pub fn has_capability(&self, capability: FieldCapability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// One field of a record's layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique within one record's field set.
    pub handle: String,
    pub kind: FieldKind,
}

impl FieldDefinition {
    pub fn new(handle: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            handle: handle.into(),
            kind,
        }
    }

    /// Shorthand for an annotated-notes field.
    pub fn annotated_notes(handle: impl Into<String>, settings: AnnotatedNotesSettings) -> Self {
        Self::new(handle, FieldKind::AnnotatedNotes(settings))
    }
}

/// Cell editor used by one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    #[serde(rename = "multiline")]
    MultiLine,
    #[serde(rename = "singleline")]
    SingleLine,
}

/// Display metadata for one fixed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Host column id (`col1`, `col2`).
    pub id: &'static str,
    /// Row key (`note`, `annotation`).
    pub handle: &'static str,
    pub heading: String,
    /// Percentage string such as `80%`.
    pub width: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

#[cfg(test)]
mod tests {
    use super::{FieldDefinition, FieldKind};
    use crate::field::capability::FieldCapability;
    use crate::field::settings::AnnotatedNotesSettings;

    #[test]
    fn annotated_notes_is_tabular_and_annotating() {
        let kind = FieldKind::AnnotatedNotes(AnnotatedNotesSettings::default());
        assert_eq!(kind.type_id(), "annotated-notes");
        assert!(kind.has_capability(FieldCapability::Tabular));
        assert!(kind.has_capability(FieldCapability::Annotating));
        assert!(!FieldKind::Table.has_capability(FieldCapability::Annotating));
    }

    #[test]
    fn deserializes_layout_entries_by_type_tag() {
        let field: FieldDefinition = serde_json::from_str(
            r#"{"handle": "notes", "kind": {"type": "annotated-notes",
                "settings": {"annotationTemplate": "{{ element.title }}", "noteColumnWidth": 70}}}"#,
        )
        .expect("layout entry should parse");
        let FieldKind::AnnotatedNotes(settings) = &field.kind else {
            panic!("expected annotated-notes kind");
        };
        assert_eq!(settings.annotation_template(), "{{ element.title }}");
        assert_eq!(settings.note_column_width(), 70);

        let plain: FieldDefinition =
            serde_json::from_str(r#"{"handle": "summary", "kind": {"type": "plain-text"}}"#)
                .expect("unit kind should parse");
        assert_eq!(plain.kind, FieldKind::PlainText);
    }
}
