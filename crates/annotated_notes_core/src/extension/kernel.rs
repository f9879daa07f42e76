//! Extension registry: field types and lifecycle hook wiring.

use crate::extension::manifest::{LifecycleHook, ManifestValidationError, PluginManifest};
use crate::host::Host;
use crate::model::record::Record;
use crate::service::save_coordinator::SaveContext;
use log::{debug, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Handler invoked for [`LifecycleHook::AfterSave`].
pub trait AfterSaveHandler {
    fn after_save(&self, record: &mut dyn Record, ctx: &SaveContext, host: &dyn Host);
}

/// Adapter contract a plugin implements to register with the kernel.
pub trait ExtensionAdapter {
    fn manifest(&self) -> &PluginManifest;
    /// `(hook, handler)` pairs wired at registration, in dispatch order.
    fn hook_handlers(&self) -> Vec<(LifecycleHook, Arc<dyn AfterSaveHandler>)>;
}

/// Registered plugin snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredExtension {
    pub manifest: PluginManifest,
}

/// One entry of the explicit hook list.
pub struct HookRegistration {
    pub hook: LifecycleHook,
    pub extension_id: String,
    handler: Arc<dyn AfterSaveHandler>,
}

/// In-process registry of plugins, their field types and hook handlers.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: BTreeMap<String, RegisteredExtension>,
    field_type_owners: BTreeMap<String, String>,
    hooks: Vec<HookRegistration>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one adapter after manifest validation.
    ///
    /// Nothing is registered when any check fails.
    pub fn register_adapter(
        &mut self,
        adapter: &impl ExtensionAdapter,
    ) -> Result<(), ExtensionKernelError> {
        let manifest = adapter.manifest().clone();
        manifest
            .validate()
            .map_err(ExtensionKernelError::InvalidManifest)?;
        let id = manifest.id.trim().to_string();
        if self.entries.contains_key(id.as_str()) {
            return Err(ExtensionKernelError::DuplicateExtensionId(id));
        }
        for declaration in &manifest.field_types {
            let type_id = declaration.type_id.trim();
            if self.field_type_owners.contains_key(type_id) {
                return Err(ExtensionKernelError::DuplicateFieldType(
                    type_id.to_string(),
                ));
            }
        }
        let handlers = adapter.hook_handlers();
        for (hook, _) in &handlers {
            if !manifest.declares_hook(*hook) {
                return Err(ExtensionKernelError::UndeclaredHook {
                    extension_id: id,
                    hook: hook.as_str(),
                });
            }
        }

        for declaration in &manifest.field_types {
            self.field_type_owners
                .insert(declaration.type_id.trim().to_string(), id.clone());
        }
        for (hook, handler) in handlers {
            self.hooks.push(HookRegistration {
                hook,
                extension_id: id.clone(),
                handler,
            });
        }
        info!(
            "event=plugin_init module=kernel status=ok plugin={} version={} field_types={} hooks={}",
            id,
            manifest.version,
            manifest.field_types.len(),
            manifest.hooks.len()
        );
        self.entries
            .insert(id, RegisteredExtension { manifest });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, extension_id: &str) -> Option<&RegisteredExtension> {
        self.entries.get(extension_id)
    }

    /// Returns the id of the plugin that registered `type_id`.
    pub fn field_type_owner(&self, type_id: &str) -> Option<&str> {
        self.field_type_owners.get(type_id).map(String::as_str)
    }

    /// Registered field type ids, sorted.
    pub fn field_types(&self) -> Vec<&str> {
        self.field_type_owners.keys().map(String::as_str).collect()
    }

    pub fn hook_count(&self, hook: LifecycleHook) -> usize {
        self.hooks.iter().filter(|entry| entry.hook == hook).count()
    }

    /// Invokes every after-save handler in registration order.
    pub fn dispatch_after_save(
        &self,
        record: &mut dyn Record,
        ctx: &SaveContext,
        host: &dyn Host,
    ) {
        for entry in self
            .hooks
            .iter()
            .filter(|entry| entry.hook == LifecycleHook::AfterSave)
        {
            debug!(
                "event=hook_dispatch module=kernel hook={} plugin={} record={}",
                entry.hook.as_str(),
                entry.extension_id,
                record.key()
            );
            entry.handler.after_save(record, ctx, host);
        }
    }
}

impl Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("field_types", &self.field_type_owners)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionKernelError {
    InvalidManifest(ManifestValidationError),
    DuplicateExtensionId(String),
    DuplicateFieldType(String),
    UndeclaredHook {
        extension_id: String,
        hook: &'static str,
    },
}

impl Display for ExtensionKernelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidManifest(err) => write!(f, "invalid plugin manifest: {err}"),
            Self::DuplicateExtensionId(value) => {
                write!(f, "plugin id already registered: {value}")
            }
            Self::DuplicateFieldType(value) => {
                write!(f, "field type already registered: {value}")
            }
            Self::UndeclaredHook { extension_id, hook } => {
                write!(f, "plugin {extension_id} handles undeclared hook {hook}")
            }
        }
    }
}

impl Error for ExtensionKernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidManifest(err) => Some(err),
            _ => None,
        }
    }
}
