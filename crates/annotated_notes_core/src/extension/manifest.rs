//! Plugin manifest declaration and validation.

use crate::field::capability::{parse_field_capability, FieldCapabilityError};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Host lifecycle hooks a plugin can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleHook {
    /// Fired synchronously after a record has been persisted.
    AfterSave,
}

impl LifecycleHook {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterSave => "after_save",
        }
    }
}

/// One field type contributed by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTypeDeclaration {
    /// Stable type id, e.g. `annotated-notes`.
    pub type_id: String,
    pub display_name: String,
    /// Capability ids (`tabular|annotating|text`).
    pub capabilities: Vec<String>,
}

/// Declarative plugin manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    /// Stable plugin identifier, e.g. `annotated-notes`.
    pub id: String,
    /// Plugin release version (`major.minor.patch`).
    pub version: String,
    /// Version of the persisted settings/value schema.
    pub schema_version: String,
    pub field_types: Vec<FieldTypeDeclaration>,
    pub hooks: Vec<LifecycleHook>,
}

impl PluginManifest {
    /// Validates declaration-level manifest invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.id.trim().is_empty() {
            return Err(ManifestValidationError::EmptyId);
        }
        if !is_valid_identifier(self.id.trim()) {
            return Err(ManifestValidationError::InvalidId(self.id.clone()));
        }
        if !is_semver_triplet(self.version.trim()) {
            return Err(ManifestValidationError::InvalidVersion(
                self.version.clone(),
            ));
        }
        if !is_semver_triplet(self.schema_version.trim()) {
            return Err(ManifestValidationError::InvalidVersion(
                self.schema_version.clone(),
            ));
        }
        if self.field_types.is_empty() && self.hooks.is_empty() {
            return Err(ManifestValidationError::MissingContributions);
        }

        let mut type_ids = BTreeSet::<&str>::new();
        for declaration in &self.field_types {
            let type_id = declaration.type_id.trim();
            if !is_valid_identifier(type_id) {
                return Err(ManifestValidationError::InvalidFieldType(
                    declaration.type_id.clone(),
                ));
            }
            if !type_ids.insert(type_id) {
                return Err(ManifestValidationError::DuplicateFieldType(
                    type_id.to_string(),
                ));
            }
            if declaration.display_name.trim().is_empty() {
                return Err(ManifestValidationError::EmptyDisplayName(
                    type_id.to_string(),
                ));
            }
            for capability in &declaration.capabilities {
                parse_field_capability(capability)
                    .map_err(ManifestValidationError::InvalidCapability)?;
            }
        }

        let mut hooks = BTreeSet::new();
        for hook in &self.hooks {
            if !hooks.insert(*hook) {
                return Err(ManifestValidationError::DuplicateHook(hook.as_str()));
            }
        }
        Ok(())
    }

    pub fn declares_hook(&self, hook: LifecycleHook) -> bool {
        self.hooks.contains(&hook)
    }
}

fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if c == '.' || c == '_' || c == '-' {
            if prev_separator {
                return false;
            }
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

fn is_semver_triplet(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Manifest validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    EmptyId,
    InvalidId(String),
    InvalidVersion(String),
    MissingContributions,
    InvalidFieldType(String),
    DuplicateFieldType(String),
    EmptyDisplayName(String),
    InvalidCapability(FieldCapabilityError),
    DuplicateHook(&'static str),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "manifest id must not be empty"),
            Self::InvalidId(value) => write!(f, "manifest id is invalid: {value}"),
            Self::InvalidVersion(value) => write!(
                f,
                "manifest version is invalid: {value} (expected major.minor.patch)"
            ),
            Self::MissingContributions => {
                write!(f, "manifest must declare a field type or a hook")
            }
            Self::InvalidFieldType(value) => write!(f, "field type id is invalid: {value}"),
            Self::DuplicateFieldType(value) => write!(f, "field type is duplicated: {value}"),
            Self::EmptyDisplayName(value) => {
                write!(f, "field type has an empty display name: {value}")
            }
            Self::InvalidCapability(err) => write!(f, "{err}"),
            Self::DuplicateHook(value) => write!(f, "hook is declared twice: {value}"),
        }
    }
}

impl Error for ManifestValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCapability(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldTypeDeclaration, LifecycleHook, ManifestValidationError, PluginManifest};
    use crate::field::capability::FieldCapabilityError;

    fn valid_manifest() -> PluginManifest {
        PluginManifest {
            id: "annotated-notes".to_string(),
            version: "1.0.0".to_string(),
            schema_version: "1.0.0".to_string(),
            field_types: vec![FieldTypeDeclaration {
                type_id: "annotated-notes".to_string(),
                display_name: "Annotated Notes".to_string(),
                capabilities: vec!["tabular".to_string(), "annotating".to_string()],
            }],
            hooks: vec![LifecycleHook::AfterSave],
        }
    }

    #[test]
    fn validates_baseline_manifest() {
        assert!(valid_manifest().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_id_format() {
        let mut manifest = valid_manifest();
        manifest.id = "Annotated Notes".to_string();
        assert!(matches!(
            manifest.validate(),
            Err(ManifestValidationError::InvalidId(_))
        ));

        manifest.id = "annotated--notes".to_string();
        assert!(matches!(
            manifest.validate(),
            Err(ManifestValidationError::InvalidId(_))
        ));
    }

    #[test]
    fn rejects_invalid_versions() {
        let mut manifest = valid_manifest();
        manifest.schema_version = "v1".to_string();
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::InvalidVersion("v1".to_string()))
        );
    }

    #[test]
    fn rejects_manifest_without_contributions() {
        let mut manifest = valid_manifest();
        manifest.field_types.clear();
        manifest.hooks.clear();
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::MissingContributions)
        );
    }

    #[test]
    fn rejects_duplicate_field_types_and_hooks() {
        let mut manifest = valid_manifest();
        manifest.field_types.push(manifest.field_types[0].clone());
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::DuplicateFieldType(
                "annotated-notes".to_string()
            ))
        );

        let mut manifest = valid_manifest();
        manifest.hooks.push(LifecycleHook::AfterSave);
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::DuplicateHook("after_save"))
        );
    }

    #[test]
    fn rejects_unknown_capabilities() {
        let mut manifest = valid_manifest();
        manifest.field_types[0]
            .capabilities
            .push("uploads".to_string());
        assert_eq!(
            manifest.validate(),
            Err(ManifestValidationError::InvalidCapability(
                FieldCapabilityError::UnsupportedCapability("uploads".to_string())
            ))
        );
    }
}
