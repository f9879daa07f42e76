//! Annotated-notes table row model.
//!
//! # Responsibility
//! - Wrap one persisted table row without losing unknown cells.
//! - Expose the `note`/`annotation` view the annotation engine works on.
//!
//! # Invariants
//! - Cells other than `note`, `annotation` and their column-id aliases are
//!   passed through unmodified.
//! - A row is annotatable iff its note is non-empty and its annotation is
//!   empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Row key holding the free-form note text.
pub const NOTE_KEY: &str = "note";
/// Row key holding the computed annotation.
pub const ANNOTATION_KEY: &str = "annotation";
/// Host table column id aliasing [`NOTE_KEY`].
pub const NOTE_COLUMN_ID: &str = "col1";
/// Host table column id aliasing [`ANNOTATION_KEY`].
pub const ANNOTATION_COLUMN_ID: &str = "col2";

/// One row of an annotated-notes field value.
///
/// Serialized transparently as the JSON object stored by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteRow {
    cells: Map<String, Value>,
}

impl NoteRow {
    /// Creates a row with the two logical cells set.
    pub fn new(note: impl Into<String>, annotation: impl Into<String>) -> Self {
        let mut cells = Map::new();
        cells.insert(NOTE_KEY.to_string(), Value::String(note.into()));
        cells.insert(ANNOTATION_KEY.to_string(), Value::String(annotation.into()));
        Self { cells }
    }

    /// Creates a row with no cells, used for display padding.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps one persisted JSON value.
    ///
    /// # Errors
    /// - Returns [`RowError::NotAnObject`] when `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, RowError> {
        match value {
            Value::Object(cells) => Ok(Self { cells }),
            other => Err(RowError::NotAnObject(json_kind(&other))),
        }
    }

    /// Returns the note text, falling back to the `col1` alias.
    pub fn note(&self) -> String {
        self.cell_text(NOTE_KEY, NOTE_COLUMN_ID)
    }

    /// Returns the annotation text, falling back to the `col2` alias.
    pub fn annotation(&self) -> String {
        self.cell_text(ANNOTATION_KEY, ANNOTATION_COLUMN_ID)
    }

    /// Returns one raw cell by key.
    pub fn cell(&self, key: &str) -> Option<&Value> {
        self.cells.get(key)
    }

    /// Returns whether the row has a note and still lacks an annotation.
    ///
    /// A filled `col2` counts as an annotation even when `annotation` is
    /// present but empty.
    pub fn is_annotatable(&self) -> bool {
        !self.note().is_empty()
            && self.annotation().is_empty()
            && self.text(ANNOTATION_COLUMN_ID).map_or(true, |text| text.is_empty())
    }

    /// Writes the annotation cell, keeping the `col2` alias in sync when the
    /// row carries it.
    pub fn set_annotation(&mut self, annotation: &str) {
        if self.cells.contains_key(ANNOTATION_COLUMN_ID) {
            self.cells.insert(
                ANNOTATION_COLUMN_ID.to_string(),
                Value::String(annotation.to_string()),
            );
        }
        self.cells.insert(
            ANNOTATION_KEY.to_string(),
            Value::String(annotation.to_string()),
        );
    }

    /// Consumes the row and returns its JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.cells)
    }

    /// `null` cells read as missing so the alias is consulted.
    fn cell_text(&self, key: &str, alias: &str) -> String {
        self.text(key)
            .or_else(|| self.text(alias))
            .unwrap_or_default()
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.cells.get(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Parses a persisted field value into rows.
///
/// `null` is treated as an empty table.
pub fn rows_from_value(value: Value) -> Result<Vec<NoteRow>, RowError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(NoteRow::from_value).collect(),
        other => Err(RowError::NotAnArray(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Persisted row shape errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    NotAnObject(&'static str),
    NotAnArray(&'static str),
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject(kind) => write!(f, "table row must be an object, got {kind}"),
            Self::NotAnArray(kind) => write!(f, "table value must be an array, got {kind}"),
        }
    }
}

impl Error for RowError {}
