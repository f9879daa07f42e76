//! Content record contract and reference record model.
//!
//! # Responsibility
//! - Define the read/patch surface the core needs from host records.
//! - Provide a concrete serde-friendly record for the reference host.
//!
//! # Invariants
//! - A record is identified by `(record_id, site_id)`; the pair is stable for
//!   the lifetime of a save wave.
//! - The core only reads field values and patches annotated-notes rows; it
//!   never removes fields.

use crate::field::definition::FieldDefinition;
use crate::model::row::{rows_from_value, NoteRow, RowError};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Host record identifier.
pub type RecordId = i64;
/// Host site identifier.
pub type SiteId = i64;

/// Field handle -> rows mapping produced by the annotation engine.
pub type AnnotatedContent = BTreeMap<String, Vec<NoteRow>>;

/// Identity of one record on one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub record_id: RecordId,
    pub site_id: SiteId,
}

impl RecordKey {
    pub fn new(record_id: RecordId, site_id: SiteId) -> Self {
        Self { record_id, site_id }
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}__{}", self.record_id, self.site_id)
    }
}

/// Validation scenario a record is saved under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationScenario {
    #[default]
    Default,
    Live,
    Essentials,
    /// Upload-driven: a file is being attached to a new record.
    Create,
    /// Upload-driven: file operations on an existing record.
    FileOps,
    /// Upload-driven: the underlying file is being replaced.
    Replace,
}

impl ValidationScenario {
    /// Returns whether the scenario only makes sense during an upload pass.
    pub fn is_upload_driven(self) -> bool {
        matches!(self, Self::Create | Self::FileOps | Self::Replace)
    }
}

/// Surface a host record exposes to the annotation core.
pub trait Record {
    /// Returns the `(record_id, site_id)` identity.
    fn key(&self) -> RecordKey;

    /// Returns the type-specific template alias, e.g. `entry`.
    fn ref_handle(&self) -> Option<&str> {
        None
    }

    /// Returns the ordered field layout, or `None` when the record type has
    /// no layout.
    fn field_layout(&self) -> Option<&[FieldDefinition]>;

    /// Returns the table rows stored under `handle`.
    fn table_rows(&self, handle: &str) -> Option<&[NoteRow]>;

    /// Returns one attribute rendered as text, used by template evaluation.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Replaces the values of the handles present in `content`; other field
    /// values stay untouched.
    fn set_field_values(&mut self, content: &AnnotatedContent);

    /// Returns whether the record type carries upload-driven validation
    /// scenarios.
    fn carries_upload_scenarios(&self) -> bool {
        false
    }

    /// Switches the record back to its default validation scenario.
    fn reset_validation_scenario(&mut self) {}
}

/// Built-in record types known to the reference host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Entry,
    Asset,
    Category,
    User,
    GlobalSet,
    Tag,
}

impl RecordKind {
    /// Reference handle used as the type-specific template alias.
    pub fn ref_handle(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Asset => "asset",
            Self::Category => "category",
            Self::User => "user",
            Self::GlobalSet => "globalset",
            Self::Tag => "tag",
        }
    }
}

/// Stored value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Rows(Vec<NoteRow>),
    Text(String),
}

/// Concrete record used by the in-process host and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: RecordId,
    pub site_id: SiteId,
    pub kind: RecordKind,
    #[serde(default)]
    pub scenario: ValidationScenario,
    /// Native attributes such as `title` or `slug`.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// `None` models record types without a field layout.
    #[serde(default)]
    pub field_layout: Option<Vec<FieldDefinition>>,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
}

impl ContentRecord {
    /// Creates a record with an empty field layout.
    pub fn new(id: RecordId, site_id: SiteId, kind: RecordKind) -> Self {
        Self {
            id,
            site_id,
            kind,
            scenario: ValidationScenario::Default,
            attributes: BTreeMap::new(),
            field_layout: Some(Vec::new()),
            values: BTreeMap::new(),
        }
    }

    /// Sets one native attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Appends one field to the layout and stores its value.
    pub fn with_field(mut self, field: FieldDefinition, value: Option<FieldValue>) -> Self {
        if let Some(value) = value {
            self.values.insert(field.handle.clone(), value);
        }
        self.field_layout.get_or_insert_with(Vec::new).push(field);
        self
    }

    /// Stores a raw persisted JSON table value under `handle`.
    pub fn set_rows_json(&mut self, handle: &str, value: Value) -> Result<(), RowError> {
        let rows = rows_from_value(value)?;
        self.values
            .insert(handle.to_string(), FieldValue::Rows(rows));
        Ok(())
    }

    /// Returns the stored value of one field.
    pub fn value(&self, handle: &str) -> Option<&FieldValue> {
        self.values.get(handle)
    }
}

impl Record for ContentRecord {
    fn key(&self) -> RecordKey {
        RecordKey::new(self.id, self.site_id)
    }

    fn ref_handle(&self) -> Option<&str> {
        Some(self.kind.ref_handle())
    }

    fn field_layout(&self) -> Option<&[FieldDefinition]> {
        self.field_layout.as_deref()
    }

    fn table_rows(&self, handle: &str) -> Option<&[NoteRow]> {
        match self.values.get(handle)? {
            FieldValue::Rows(rows) => Some(rows.as_slice()),
            FieldValue::Text(_) => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "siteId" => Some(self.site_id.to_string()),
            _ => self.attributes.get(name).cloned(),
        }
    }

    fn set_field_values(&mut self, content: &AnnotatedContent) {
        for (handle, rows) in content {
            self.values
                .insert(handle.clone(), FieldValue::Rows(rows.clone()));
        }
    }

    fn carries_upload_scenarios(&self) -> bool {
        self.kind == RecordKind::Asset
    }

    fn reset_validation_scenario(&mut self) {
        if self.scenario.is_upload_driven() {
            debug!(
                "event=scenario_reset module=model record={} from={:?}",
                self.key(),
                self.scenario
            );
        }
        self.scenario = ValidationScenario::Default;
    }
}
