//! Annotated-notes field type definition.
//!
//! # Responsibility
//! - Describe field layouts as a closed set of typed variants.
//! - Own annotated-notes settings, column metadata and display padding.
//!
//! # Invariants
//! - Configuration errors are corrected when settings load; nothing here
//!   fails during save processing.

pub mod capability;
pub mod definition;
pub mod settings;
