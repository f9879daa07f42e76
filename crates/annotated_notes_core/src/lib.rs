//! Core logic for the annotated-notes field extension.
//! This crate owns the annotation-fill rules and the re-entrant save wave.

pub mod extension;
pub mod field;
pub mod host;
pub mod logging;
pub mod model;
pub mod service;

pub use extension::kernel::{
    AfterSaveHandler, ExtensionAdapter, ExtensionKernelError, ExtensionRegistry,
    RegisteredExtension,
};
pub use extension::manifest::{
    FieldTypeDeclaration, LifecycleHook, ManifestValidationError, PluginManifest,
};
pub use extension::plugin::{AnnotatedNotesPlugin, PLUGIN_ID};
pub use field::capability::{parse_field_capability, FieldCapability, FieldCapabilityError};
pub use field::definition::{
    ColumnDefinition, ColumnType, FieldDefinition, FieldKind, ANNOTATED_NOTES_FIELD_TYPE,
};
pub use field::settings::{AnnotatedNotesSettings, SettingsError};
pub use host::memory::InMemoryHost;
pub use host::{
    Host, RenderEnvironment, SaveOptions, SaveService, SimpleTemplateRenderer, SiteRenderScope,
    TemplateContext, TemplateError, TemplateEvaluator, TemplateMode, UploadState,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{
    AnnotatedContent, ContentRecord, FieldValue, Record, RecordId, RecordKey, RecordKind, SiteId,
    ValidationScenario,
};
pub use model::row::{rows_from_value, NoteRow, RowError};
pub use service::annotation_service::{evaluation_context, fill_rows, AnnotationService};
pub use service::save_coordinator::{SaveContext, SaveCycleCoordinator, SaveWaveOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
