//! Domain model for records and annotated-notes rows.
//!
//! # Responsibility
//! - Define the record contract the core reads and patches.
//! - Define the persisted row shape of annotated-notes fields.
//!
//! # Invariants
//! - Every record is identified by a stable `(record_id, site_id)` pair.
//! - Row cells the core does not own are preserved byte-for-byte.

pub mod record;
pub mod row;
