//! In-process reference host.
//!
//! # Responsibility
//! - Implement every host contract in memory for the CLI and tests.
//! - Dispatch registered after-save hooks synchronously from `save_record`.
//!
//! # Invariants
//! - No `RefCell` borrow is held while hooks run, so re-entrant saves are
//!   safe.
//! - A rejected save persists nothing and fires no hooks.

use crate::extension::kernel::ExtensionRegistry;
use crate::field::capability::FieldCapability;
use crate::host::{
    RenderEnvironment, SaveOptions, SaveService, SimpleTemplateRenderer, TemplateContext,
    TemplateError, TemplateEvaluator, TemplateMode, UploadState,
};
use crate::model::record::{AnnotatedContent, Record, RecordKey};
use crate::model::row::NoteRow;
use crate::service::save_coordinator::SaveContext;
use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

/// Memory-backed host platform.
pub struct InMemoryHost {
    registry: ExtensionRegistry,
    evaluator: Box<dyn TemplateEvaluator>,
    template_mode: Cell<TemplateMode>,
    eager_transforms: Cell<bool>,
    pending_uploads: RefCell<Vec<String>>,
    rejected: RefCell<BTreeSet<RecordKey>>,
    saves: RefCell<Vec<(RecordKey, SaveOptions)>>,
    stored: RefCell<BTreeMap<RecordKey, AnnotatedContent>>,
}

impl InMemoryHost {
    /// Creates a host in control-panel mode using [`SimpleTemplateRenderer`].
    pub fn new(registry: ExtensionRegistry) -> Self {
        Self::with_evaluator(registry, Box::new(SimpleTemplateRenderer))
    }

    pub fn with_evaluator(
        registry: ExtensionRegistry,
        evaluator: Box<dyn TemplateEvaluator>,
    ) -> Self {
        Self {
            registry,
            evaluator,
            template_mode: Cell::new(TemplateMode::ControlPanel),
            eager_transforms: Cell::new(false),
            pending_uploads: RefCell::new(Vec::new()),
            rejected: RefCell::new(BTreeSet::new()),
            saves: RefCell::new(Vec::new()),
            stored: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Buffers one uploaded file name for the current request.
    pub fn stage_upload(&self, file_name: impl Into<String>) {
        self.pending_uploads.borrow_mut().push(file_name.into());
    }

    pub fn pending_uploads(&self) -> Vec<String> {
        self.pending_uploads.borrow().clone()
    }

    /// Makes every later save of `key` fail.
    pub fn reject_saves_for(&self, key: RecordKey) {
        self.rejected.borrow_mut().insert(key);
    }

    /// Makes saves of `key` succeed again.
    pub fn accept_saves_for(&self, key: RecordKey) {
        self.rejected.borrow_mut().remove(&key);
    }

    /// Every save call so far, in call order.
    pub fn save_log(&self) -> Vec<(RecordKey, SaveOptions)> {
        self.saves.borrow().clone()
    }

    /// Persisted rows of one annotated-notes field.
    pub fn stored_rows(&self, key: RecordKey, handle: &str) -> Option<Vec<NoteRow>> {
        self.stored.borrow().get(&key)?.get(handle).cloned()
    }

    /// Persisted annotated-notes values of one record.
    pub fn stored_content(&self, key: RecordKey) -> Option<AnnotatedContent> {
        self.stored.borrow().get(&key).cloned()
    }

    fn snapshot(record: &dyn Record) -> AnnotatedContent {
        let mut content = AnnotatedContent::new();
        for field in record.field_layout().unwrap_or_default() {
            if field.kind.has_capability(FieldCapability::Annotating) {
                let rows = record.table_rows(&field.handle).unwrap_or_default();
                content.insert(field.handle.clone(), rows.to_vec());
            }
        }
        content
    }
}

impl TemplateEvaluator for InMemoryHost {
    fn render(
        &self,
        template: &str,
        context: &TemplateContext<'_>,
    ) -> Result<String, TemplateError> {
        self.evaluator.render(template, context)
    }
}

impl RenderEnvironment for InMemoryHost {
    fn template_mode(&self) -> TemplateMode {
        self.template_mode.get()
    }

    fn set_template_mode(&self, mode: TemplateMode) {
        self.template_mode.set(mode);
    }

    fn eager_transforms(&self) -> bool {
        self.eager_transforms.get()
    }

    fn set_eager_transforms(&self, enabled: bool) {
        self.eager_transforms.set(enabled);
    }
}

impl UploadState for InMemoryHost {
    fn reset_uploads(&self) {
        let dropped = std::mem::take(&mut *self.pending_uploads.borrow_mut());
        if !dropped.is_empty() {
            debug!("event=uploads_reset module=host dropped={}", dropped.len());
        }
    }
}

impl SaveService for InMemoryHost {
    fn save_record(
        &self,
        record: &mut dyn Record,
        options: SaveOptions,
        ctx: &SaveContext,
    ) -> bool {
        let key = record.key();
        self.saves.borrow_mut().push((key, options));
        if self.rejected.borrow().contains(&key) {
            return false;
        }

        let content = Self::snapshot(&*record);
        self.stored.borrow_mut().insert(key, content);

        self.registry.dispatch_after_save(record, ctx, self);
        true
    }
}
