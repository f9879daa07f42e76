//! Annotated-notes field settings and load-time normalization.
//!
//! # Responsibility
//! - Deserialize persisted field settings from the host's JSON document.
//! - Correct invalid settings at load time so save processing never sees
//!   them.
//!
//! # Invariants
//! - `note_column_width` is always within
//!   `MIN_NOTE_COLUMN_WIDTH..=MAX_NOTE_COLUMN_WIDTH`.
//! - Headings are never blank.

use crate::field::definition::{ColumnDefinition, ColumnType};
use crate::model::row::{NoteRow, ANNOTATION_COLUMN_ID, ANNOTATION_KEY, NOTE_COLUMN_ID, NOTE_KEY};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_NOTE_COLUMN_WIDTH: u8 = 80;
pub const MIN_NOTE_COLUMN_WIDTH: u8 = 10;
pub const MAX_NOTE_COLUMN_WIDTH: u8 = 90;
pub const DEFAULT_ANNOTATION_HEADING: &str = "Annotation";
pub const DEFAULT_NOTE_HEADING: &str = "Note";
pub const DEFAULT_ADD_ROW_LABEL: &str = "Add a row";

/// Effective configuration of one annotated-notes field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSettings", rename_all = "camelCase")]
pub struct AnnotatedNotesSettings {
    annotation_template: String,
    annotation_heading: String,
    note_heading: String,
    note_column_width: u8,
    min_rows: Option<u32>,
    max_rows: Option<u32>,
    add_row_label: String,
}

impl Default for AnnotatedNotesSettings {
    fn default() -> Self {
        Self {
            annotation_template: String::new(),
            annotation_heading: DEFAULT_ANNOTATION_HEADING.to_string(),
            note_heading: DEFAULT_NOTE_HEADING.to_string(),
            note_column_width: DEFAULT_NOTE_COLUMN_WIDTH,
            min_rows: None,
            max_rows: None,
            add_row_label: DEFAULT_ADD_ROW_LABEL.to_string(),
        }
    }
}

impl AnnotatedNotesSettings {
    /// Creates default settings with the given annotation template.
    pub fn new(annotation_template: impl Into<String>) -> Self {
        Self {
            annotation_template: annotation_template.into(),
            ..Self::default()
        }
    }

    /// Loads settings from a persisted JSON document.
    ///
    /// # Errors
    /// - Returns [`SettingsError::Json`] when the document is not a JSON
    ///   object with the expected value types. Out-of-range values are
    ///   defaulted, not rejected.
    pub fn from_json(document: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(document).map_err(SettingsError::Json)
    }

    /// Sets the note column width, defaulting values outside `10..=90`.
    pub fn with_note_column_width(mut self, width: i64) -> Self {
        self.note_column_width = resolve_note_column_width(Some(&Value::from(width)));
        self
    }

    pub fn with_headings(mut self, note: &str, annotation: &str) -> Self {
        self.note_heading = heading_or_default(Some(note.to_string()), DEFAULT_NOTE_HEADING);
        self.annotation_heading =
            heading_or_default(Some(annotation.to_string()), DEFAULT_ANNOTATION_HEADING);
        self
    }

    pub fn with_min_rows(mut self, min_rows: u32) -> Self {
        self.min_rows = Some(min_rows);
        self
    }

    pub fn annotation_template(&self) -> &str {
        &self.annotation_template
    }

    pub fn annotation_heading(&self) -> &str {
        &self.annotation_heading
    }

    pub fn note_heading(&self) -> &str {
        &self.note_heading
    }

    pub fn note_column_width(&self) -> u8 {
        self.note_column_width
    }

    /// Remainder of the row width left to the annotation column.
    pub fn annotation_column_width(&self) -> u8 {
        100 - self.note_column_width
    }

    pub fn min_rows(&self) -> Option<u32> {
        self.min_rows
    }

    pub fn max_rows(&self) -> Option<u32> {
        self.max_rows
    }

    pub fn add_row_label(&self) -> &str {
        &self.add_row_label
    }

    /// Column metadata for the two fixed columns, note first.
    pub fn columns(&self) -> [ColumnDefinition; 2] {
        [
            ColumnDefinition {
                id: NOTE_COLUMN_ID,
                handle: NOTE_KEY,
                heading: self.note_heading.clone(),
                width: format!("{}%", self.note_column_width),
                column_type: ColumnType::MultiLine,
            },
            ColumnDefinition {
                id: ANNOTATION_COLUMN_ID,
                handle: ANNOTATION_KEY,
                heading: self.annotation_heading.clone(),
                width: format!("{}%", self.annotation_column_width()),
                column_type: ColumnType::SingleLine,
            },
        ]
    }

    /// Pads `rows` with empty rows up to `min_rows` for input display.
    ///
    /// Presentation-only: the annotation engine never depends on it.
    pub fn input_rows(&self, rows: &[NoteRow]) -> Vec<NoteRow> {
        let mut padded = rows.to_vec();
        let min_rows = self.min_rows.unwrap_or(0) as usize;
        while padded.len() < min_rows {
            padded.push(NoteRow::empty());
        }
        padded
    }
}

/// Raw persisted settings before defaults are applied.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default, alias = "annotationTwig")]
    annotation_template: Option<String>,
    #[serde(default)]
    annotation_heading: Option<String>,
    #[serde(default)]
    note_heading: Option<String>,
    #[serde(default)]
    note_column_width: Option<Value>,
    #[serde(default)]
    min_rows: Option<u32>,
    #[serde(default)]
    max_rows: Option<u32>,
    #[serde(default)]
    add_row_label: Option<String>,
}

impl From<RawSettings> for AnnotatedNotesSettings {
    fn from(raw: RawSettings) -> Self {
        Self {
            annotation_template: raw.annotation_template.unwrap_or_default(),
            annotation_heading: heading_or_default(
                raw.annotation_heading,
                DEFAULT_ANNOTATION_HEADING,
            ),
            note_heading: heading_or_default(raw.note_heading, DEFAULT_NOTE_HEADING),
            note_column_width: resolve_note_column_width(raw.note_column_width.as_ref()),
            min_rows: raw.min_rows,
            max_rows: raw.max_rows,
            add_row_label: heading_or_default(raw.add_row_label, DEFAULT_ADD_ROW_LABEL),
        }
    }
}

fn heading_or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => default.to_string(),
    }
}

/// Resolves a persisted width to an integer in `10..=90`.
///
/// Integers and integer-valued strings are accepted; anything else falls
/// back to the default.
fn resolve_note_column_width(value: Option<&Value>) -> u8 {
    let Some(value) = value else {
        return DEFAULT_NOTE_COLUMN_WIDTH;
    };
    if value.is_null() {
        return DEFAULT_NOTE_COLUMN_WIDTH;
    }

    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(width)
            if (i64::from(MIN_NOTE_COLUMN_WIDTH)..=i64::from(MAX_NOTE_COLUMN_WIDTH))
                .contains(&width) =>
        {
            width as u8
        }
        _ => {
            warn!(
                "event=settings_defaulted module=field setting=noteColumnWidth value={} default={}",
                value, DEFAULT_NOTE_COLUMN_WIDTH
            );
            DEFAULT_NOTE_COLUMN_WIDTH
        }
    }
}

/// Settings document load errors.
#[derive(Debug)]
pub enum SettingsError {
    Json(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid field settings document: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnnotatedNotesSettings, DEFAULT_NOTE_COLUMN_WIDTH};
    use crate::field::definition::ColumnType;
    use crate::model::row::NoteRow;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = AnnotatedNotesSettings::from_json("{}").expect("empty object loads");
        assert_eq!(settings.annotation_template(), "");
        assert_eq!(settings.annotation_heading(), "Annotation");
        assert_eq!(settings.note_heading(), "Note");
        assert_eq!(settings.note_column_width(), DEFAULT_NOTE_COLUMN_WIDTH);
        assert_eq!(settings.add_row_label(), "Add a row");
    }

    #[test]
    fn out_of_range_width_falls_back_to_default() {
        for document in [
            r#"{"noteColumnWidth": 95}"#,
            r#"{"noteColumnWidth": 120}"#,
            r#"{"noteColumnWidth": 5}"#,
            r#"{"noteColumnWidth": 50.5}"#,
            r#"{"noteColumnWidth": "wide"}"#,
        ] {
            let settings = AnnotatedNotesSettings::from_json(document).expect("document loads");
            assert_eq!(settings.note_column_width(), 80, "{document}");
            assert_eq!(settings.annotation_column_width(), 20, "{document}");
        }
    }

    #[test]
    fn accepts_bounds_and_numeric_strings() {
        let low = AnnotatedNotesSettings::from_json(r#"{"noteColumnWidth": 10}"#).expect("loads");
        assert_eq!(low.note_column_width(), 10);
        let high =
            AnnotatedNotesSettings::from_json(r#"{"noteColumnWidth": "90"}"#).expect("loads");
        assert_eq!(high.note_column_width(), 90);
    }

    #[test]
    fn legacy_template_key_is_accepted() {
        let settings =
            AnnotatedNotesSettings::from_json(r#"{"annotationTwig": "{{ entry.title }}"}"#)
                .expect("legacy key loads");
        assert_eq!(settings.annotation_template(), "{{ entry.title }}");
    }

    #[test]
    fn blank_headings_are_defaulted() {
        let settings = AnnotatedNotesSettings::new("").with_headings(" ", "By");
        assert_eq!(settings.note_heading(), "Note");
        assert_eq!(settings.annotation_heading(), "By");
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(AnnotatedNotesSettings::from_json("[1, 2]").is_err());
    }

    #[test]
    fn columns_split_width_between_note_and_annotation() {
        let settings = AnnotatedNotesSettings::new("").with_note_column_width(65);
        let [note, annotation] = settings.columns();
        assert_eq!(note.handle, "note");
        assert_eq!(note.width, "65%");
        assert_eq!(note.column_type, ColumnType::MultiLine);
        assert_eq!(annotation.handle, "annotation");
        assert_eq!(annotation.width, "35%");
        assert_eq!(annotation.column_type, ColumnType::SingleLine);
    }

    #[test]
    fn input_rows_pads_to_min_rows_only() {
        let settings = AnnotatedNotesSettings::new("").with_min_rows(3);
        let padded = settings.input_rows(&[NoteRow::new("a", "")]);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[0], NoteRow::new("a", ""));
        assert_eq!(padded[2], NoteRow::empty());

        let already_full = settings.input_rows(&vec![NoteRow::new("x", "y"); 4]);
        assert_eq!(already_full.len(), 4);
    }
}
