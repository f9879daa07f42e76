//! Host platform contracts.
//!
//! # Responsibility
//! - Define the services the core consumes from the content platform:
//!   template rendering, render environment switches, saving and upload
//!   state.
//! - Keep the core independent of any concrete host.
//!
//! # Invariants
//! - Host services take `&self`; hosts hold mutable state behind interior
//!   mutability so a re-entrant save can reach the same services.
//! - A save performed through [`SaveService`] fires the after-save hooks
//!   synchronously with the same [`SaveContext`].

pub mod memory;
pub mod render_scope;
pub mod template;

use crate::model::record::Record;
use crate::service::save_coordinator::SaveContext;

pub use render_scope::SiteRenderScope;
pub use template::{SimpleTemplateRenderer, TemplateContext, TemplateError, TemplateEvaluator};

/// Template lookup mode of the host's view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMode {
    /// Front-end site templates.
    Site,
    /// Administrative templates.
    ControlPanel,
}

/// Render settings the core flips around template evaluation.
pub trait RenderEnvironment {
    fn template_mode(&self) -> TemplateMode;
    fn set_template_mode(&self, mode: TemplateMode);
    /// Whether derived-media URLs are generated eagerly rather than deferred
    /// to page render.
    fn eager_transforms(&self) -> bool;
    fn set_eager_transforms(&self, enabled: bool);
}

/// Flags passed to the host save operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub validate: bool,
    pub propagate: bool,
}

impl SaveOptions {
    /// Regular first-pass save.
    pub const FULL: Self = Self {
        validate: true,
        propagate: true,
    };

    /// Second-pass save after annotation: no re-validation, no propagation
    /// to related records.
    pub const RESAVE: Self = Self {
        validate: false,
        propagate: false,
    };
}

/// Host save operation.
pub trait SaveService {
    /// Persists `record` and fires after-save hooks. Returns `false` when the
    /// host rejected the save.
    fn save_record(&self, record: &mut dyn Record, options: SaveOptions, ctx: &SaveContext)
        -> bool;
}

/// Host upload buffer for the current request.
pub trait UploadState {
    /// Drops every buffered uploaded-file reference.
    fn reset_uploads(&self);
}

/// Everything the save coordinator needs from the host.
pub trait Host: TemplateEvaluator + RenderEnvironment + SaveService + UploadState {}

impl<T> Host for T where T: TemplateEvaluator + RenderEnvironment + SaveService + UploadState {}
