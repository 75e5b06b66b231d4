//! Storage Module
//!
//! SQLite-based persistence for hosting applications:
//! - Catalog records (one row per item, JSON payload)
//! - Learner snapshots keyed by learner id
//! - Append-only review log
//! - Versioned schema migrations

mod migrations;
mod sqlite;

pub use migrations::{Migration, MIGRATIONS};
pub use sqlite::{LearnerRecord, Result, ReviewLogEntry, SnapshotStore, StorageError};
