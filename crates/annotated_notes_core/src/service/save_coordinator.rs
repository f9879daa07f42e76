//! Save-cycle coordinator.
//!
//! # Responsibility
//! - React to the host's after-save hook by running the annotation engine.
//! - Apply engine output and re-save the record exactly once per save wave.
//!
//! # Invariants
//! - A `(record_id, site_id)` key is marked processed before the engine runs;
//!   the nested after-save fired by the re-save sees the mark and does
//!   nothing.
//! - Marks live in the request-scoped [`SaveContext`], never in globals.
//! - A failed re-save is logged and swallowed; the first save already
//!   succeeded.

use crate::host::{Host, SaveOptions, SaveService, UploadState};
use crate::model::record::{Record, RecordKey};
use crate::service::annotation_service::AnnotationService;
use log::{debug, error, info};
use std::cell::RefCell;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Request-scoped state threaded through one request's saves.
///
/// Holds the set of record keys already run through the annotation engine.
/// A fresh context starts empty; dropping it forgets every mark.
#[derive(Debug)]
pub struct SaveContext {
    request_id: Uuid,
    processed: RefCell<BTreeSet<RecordKey>>,
}

impl Default for SaveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            processed: RefCell::new(BTreeSet::new()),
        }
    }

    /// Correlation id included in coordinator log events.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn is_processed(&self, key: RecordKey) -> bool {
        self.processed.borrow().contains(&key)
    }

    /// Marks `key` processed. Returns `false` when it already was.
    pub fn mark_processed(&self, key: RecordKey) -> bool {
        self.processed.borrow_mut().insert(key)
    }

    pub fn processed_count(&self) -> usize {
        self.processed.borrow().len()
    }
}

/// Result of one after-save invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveWaveOutcome {
    /// Key already seen in this context; nothing ran.
    AlreadyProcessed,
    /// Engine ran and found nothing to annotate.
    NoChanges,
    /// Annotations applied and the record re-saved.
    Resaved { fields: usize },
    /// Annotations applied but the host rejected the re-save.
    ResaveFailed { fields: usize },
}

/// After-save handler that fills annotations and re-saves.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveCycleCoordinator;

impl SaveCycleCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Handles one after-save event for `record`.
    pub fn on_after_save(
        &self,
        record: &mut dyn Record,
        ctx: &SaveContext,
        host: &dyn Host,
    ) -> SaveWaveOutcome {
        let key = record.key();
        if !ctx.mark_processed(key) {
            debug!(
                "event=save_wave_skipped module=coordinator request={} record={}",
                ctx.request_id(),
                key
            );
            return SaveWaveOutcome::AlreadyProcessed;
        }

        let content = AnnotationService::new(host).annotated_content(&*record);
        if content.is_empty() {
            return SaveWaveOutcome::NoChanges;
        }
        let fields = content.len();

        host.reset_uploads();
        if record.carries_upload_scenarios() {
            record.reset_validation_scenario();
        }
        record.set_field_values(&content);

        info!(
            "event=annotation_resave module=coordinator request={} record_id={} site_id={} fields={}",
            ctx.request_id(),
            key.record_id,
            key.site_id,
            fields
        );
        if host.save_record(record, SaveOptions::RESAVE, ctx) {
            SaveWaveOutcome::Resaved { fields }
        } else {
            error!(
                "event=annotation_resave_failed module=coordinator status=error request={} record_id={} site_id={}",
                ctx.request_id(),
                key.record_id,
                key.site_id
            );
            SaveWaveOutcome::ResaveFailed { fields }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordKey, SaveContext};

    #[test]
    fn mark_processed_reports_first_insert_only() {
        let ctx = SaveContext::new();
        let key = RecordKey::new(5, 1);
        assert!(!ctx.is_processed(key));
        assert!(ctx.mark_processed(key));
        assert!(!ctx.mark_processed(key));
        assert!(ctx.is_processed(key));
        assert_eq!(ctx.processed_count(), 1);
    }

    #[test]
    fn keys_differ_by_site() {
        let ctx = SaveContext::new();
        assert!(ctx.mark_processed(RecordKey::new(5, 1)));
        assert!(ctx.mark_processed(RecordKey::new(5, 2)));
    }

    #[test]
    fn contexts_do_not_share_marks() {
        let first = SaveContext::new();
        let second = SaveContext::new();
        first.mark_processed(RecordKey::new(5, 1));
        assert!(!second.is_processed(RecordKey::new(5, 1)));
        assert_ne!(first.request_id(), second.request_id());
    }
}
