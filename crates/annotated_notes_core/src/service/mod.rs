//! Core use-case services.
//!
//! # Responsibility
//! - Compute annotations for a record (`annotation_service`).
//! - Coordinate the after-save re-save wave (`save_coordinator`).

pub mod annotation_service;
pub mod save_coordinator;
