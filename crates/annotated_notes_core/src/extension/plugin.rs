//! The annotated-notes plugin: field type plus after-save handler.

use crate::extension::kernel::{
    AfterSaveHandler, ExtensionAdapter, ExtensionKernelError, ExtensionRegistry,
};
use crate::extension::manifest::{FieldTypeDeclaration, LifecycleHook, PluginManifest};
use crate::field::capability::FieldCapability;
use crate::field::definition::ANNOTATED_NOTES_FIELD_TYPE;
use crate::host::Host;
use crate::model::record::Record;
use crate::service::save_coordinator::{SaveContext, SaveCycleCoordinator};
use std::sync::Arc;

pub const PLUGIN_ID: &str = "annotated-notes";
pub const PLUGIN_SCHEMA_VERSION: &str = "1.0.0";
pub const FIELD_DISPLAY_NAME: &str = "Annotated Notes";

impl AfterSaveHandler for SaveCycleCoordinator {
    fn after_save(&self, record: &mut dyn Record, ctx: &SaveContext, host: &dyn Host) {
        self.on_after_save(record, ctx, host);
    }
}

/// Plugin adapter registering the annotated-notes field type and the
/// save-cycle coordinator.
#[derive(Debug, Clone)]
pub struct AnnotatedNotesPlugin {
    manifest: PluginManifest,
    coordinator: Arc<SaveCycleCoordinator>,
}

impl Default for AnnotatedNotesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotatedNotesPlugin {
    pub fn new() -> Self {
        Self {
            manifest: PluginManifest {
                id: PLUGIN_ID.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                schema_version: PLUGIN_SCHEMA_VERSION.to_string(),
                field_types: vec![FieldTypeDeclaration {
                    type_id: ANNOTATED_NOTES_FIELD_TYPE.to_string(),
                    display_name: FIELD_DISPLAY_NAME.to_string(),
                    capabilities: vec![
                        FieldCapability::Tabular.as_str().to_string(),
                        FieldCapability::Annotating.as_str().to_string(),
                    ],
                }],
                hooks: vec![LifecycleHook::AfterSave],
            },
            coordinator: Arc::new(SaveCycleCoordinator::new()),
        }
    }

    /// Builds a registry with this plugin registered.
    pub fn registry() -> Result<ExtensionRegistry, ExtensionKernelError> {
        let mut registry = ExtensionRegistry::new();
        registry.register_adapter(&Self::new())?;
        Ok(registry)
    }
}

impl ExtensionAdapter for AnnotatedNotesPlugin {
    fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn hook_handlers(&self) -> Vec<(LifecycleHook, Arc<dyn AfterSaveHandler>)> {
        vec![(
            LifecycleHook::AfterSave,
            self.coordinator.clone() as Arc<dyn AfterSaveHandler>,
        )]
    }
}
