//! Capability tags carried by field-type variants.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Behavior a field type contributes to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldCapability {
    /// Value is an ordered list of rows.
    Tabular,
    /// Rows are auto-filled on save from a template.
    Annotating,
    /// Value is a single text cell.
    Text,
}

impl FieldCapability {
    /// Stable string id used in manifests and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tabular => FIELD_CAPABILITY_TABULAR,
            Self::Annotating => FIELD_CAPABILITY_ANNOTATING,
            Self::Text => FIELD_CAPABILITY_TEXT,
        }
    }

    /// Operator-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Tabular => "Stores an ordered table of rows with fixed columns.",
            Self::Annotating => "Fills empty annotation cells from a template after save.",
            Self::Text => "Stores one text value.",
        }
    }
}

/// String value for the tabular capability.
pub const FIELD_CAPABILITY_TABULAR: &str = "tabular";
/// String value for the annotating capability.
pub const FIELD_CAPABILITY_ANNOTATING: &str = "annotating";
/// String value for the text capability.
pub const FIELD_CAPABILITY_TEXT: &str = "text";

/// Parses one capability from its string id.
pub fn parse_field_capability(value: &str) -> Result<FieldCapability, FieldCapabilityError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(FieldCapabilityError::EmptyCapability);
    }

    match normalized {
        FIELD_CAPABILITY_TABULAR => Ok(FieldCapability::Tabular),
        FIELD_CAPABILITY_ANNOTATING => Ok(FieldCapability::Annotating),
        FIELD_CAPABILITY_TEXT => Ok(FieldCapability::Text),
        other => Err(FieldCapabilityError::UnsupportedCapability(
            other.to_string(),
        )),
    }
}

/// Capability parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCapabilityError {
    EmptyCapability,
    UnsupportedCapability(String),
}

impl Display for FieldCapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCapability => write!(f, "field capability value must not be empty"),
            Self::UnsupportedCapability(value) => {
                write!(f, "field capability is unsupported: {value}")
            }
        }
    }
}

impl Error for FieldCapabilityError {}
