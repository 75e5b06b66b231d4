//! Database Migrations
//!
//! Schema migration definitions for the snapshot store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: catalog items and learner snapshots",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Review log",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS catalog_items (
    id TEXT PRIMARY KEY,
    content_type TEXT NOT NULL,
    difficulty REAL NOT NULL,
    data TEXT NOT NULL,           -- JSON: serialized ContentItem
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_catalog_type ON catalog_items(content_type);

CREATE TABLE IF NOT EXISTS learners (
    id TEXT PRIMARY KEY,
    snapshot_version INTEGER NOT NULL,
    snapshot TEXT NOT NULL,       -- JSON: serialized LearnerSnapshot
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Review log
const MIGRATION_V2_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    learner_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    quality INTEGER NOT NULL,
    response_time_seconds REAL NOT NULL,
    content_type TEXT NOT NULL,
    review_type TEXT NOT NULL,
    interval_days INTEGER NOT NULL,
    ease_factor REAL NOT NULL,
    reviewed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_log_learner ON review_log(learner_id, reviewed_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
