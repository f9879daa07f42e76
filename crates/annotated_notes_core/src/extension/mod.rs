//! Plugin kernel contracts.
//!
//! This module defines plugin manifests, the in-process registry of field
//! types and lifecycle hooks, and the annotated-notes plugin itself. Hooks are
//! an explicit list of `(hook, handler)` pairs wired at registration time.

pub mod kernel;
pub mod manifest;
pub mod plugin;
