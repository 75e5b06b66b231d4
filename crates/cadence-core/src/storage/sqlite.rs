//! SQLite Snapshot Store
//!
//! Persists the catalog, one snapshot per learner and an append-only review
//! log. The store never interprets learner state beyond the snapshot format;
//! hosts load a snapshot, run operations through the engine and save it back.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::catalog::{ContentCatalog, ContentItem};
use crate::error::CadenceError;
use crate::queue::{GradeOutcome, ReviewEvent};
use crate::snapshot::LearnerSnapshot;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Stored data failed core validation
    #[error(transparent)]
    Core(#[from] CadenceError),
    /// Stored JSON could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// RECORDS
// ============================================================================

/// Stored learner metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerRecord {
    /// Learner id
    pub learner_id: String,
    /// Snapshot format version
    pub snapshot_version: u32,
    /// First save
    pub created_at: DateTime<Utc>,
    /// Last save
    pub updated_at: DateTime<Utc>,
}

/// One row of the review log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    /// Learner id
    pub learner_id: String,
    /// Item id
    pub item_id: String,
    /// Grade 0-5
    pub quality: u8,
    /// Response latency
    pub response_time_seconds: f64,
    /// Content type name
    pub content_type: String,
    /// Classification after the review
    pub review_type: String,
    /// Interval chosen by the review
    pub interval_days: u32,
    /// Ease after the review
    pub ease_factor: f64,
    /// When the review happened
    pub reviewed_at: DateTime<Utc>,
}

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed snapshot store.
///
/// All methods take `&self`; the connection sits behind a mutex so the store
/// can be shared as `Arc<SnapshotStore>`.
pub struct SnapshotStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SnapshotStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cadence", "core").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        // Restrict directory permissions to owner-only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            let _ = std::fs::set_permissions(data_dir, perms);
        }
        Ok(data_dir.join("cadence.db"))
    }

    /// Open (or create) a store. `None` uses [`SnapshotStore::default_path`].
    pub fn open(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => {
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                p
            }
            None => Self::default_path()?,
        };

        let conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&conn)?;
        let applied = super::migrations::apply_migrations(&conn)?;
        tracing::debug!(path = %path.display(), applied, "Opened snapshot store");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Store that lives only as long as the value
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn)?;
        super::migrations::apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Init("Connection lock poisoned".into()))
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.lock()?;
        Ok(super::migrations::get_current_version(&conn)?)
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    // ========================================================================
    // CATALOG
    // ========================================================================

    /// Insert or replace one catalog record
    pub fn upsert_item(&self, item: &ContentItem) -> Result<()> {
        item.validate()?;
        let data = serde_json::to_string(item)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO catalog_items (id, content_type, difficulty, data, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                content_type = excluded.content_type,
                difficulty = excluded.difficulty,
                data = excluded.data,
                updated_at = excluded.updated_at",
            params![
                item.id,
                item.content_type.as_str(),
                item.difficulty,
                data,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Write every record of a catalog in one transaction
    pub fn save_catalog(&self, catalog: &ContentCatalog) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO catalog_items (id, content_type, difficulty, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    content_type = excluded.content_type,
                    difficulty = excluded.difficulty,
                    data = excluded.data,
                    updated_at = excluded.updated_at",
            )?;
            for item in catalog.iter() {
                let data = serde_json::to_string(item)?;
                stmt.execute(params![
                    item.id,
                    item.content_type.as_str(),
                    item.difficulty,
                    data,
                    now
                ])?;
            }
        }
        tx.commit()?;
        tracing::info!(items = catalog.len(), "Saved catalog");
        Ok(catalog.len())
    }

    /// Load the whole catalog
    pub fn load_catalog(&self) -> Result<ContentCatalog> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data FROM catalog_items ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut catalog = ContentCatalog::new();
        for data in rows {
            let item: ContentItem = serde_json::from_str(&data?)?;
            catalog.upsert(item)?;
        }
        Ok(catalog)
    }

    /// Delete one catalog record
    pub fn delete_item(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM catalog_items WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // ========================================================================
    // LEARNERS
    // ========================================================================

    /// Insert or replace a learner snapshot
    pub fn save_learner(&self, snapshot: &LearnerSnapshot) -> Result<()> {
        snapshot.check_version()?;
        let data = serde_json::to_string(snapshot)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO learners (id, snapshot_version, snapshot, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                snapshot_version = excluded.snapshot_version,
                snapshot = excluded.snapshot,
                updated_at = excluded.updated_at",
            params![
                snapshot.learner_id,
                snapshot.version,
                data,
                snapshot.created_at.to_rfc3339(),
                Utc::now().to_rfc3339()
            ],
        )?;
        tracing::debug!(learner_id = %snapshot.learner_id, "Saved learner snapshot");
        Ok(())
    }

    /// Load a learner snapshot
    pub fn load_learner(&self, learner_id: &str) -> Result<Option<LearnerSnapshot>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM learners WHERE id = ?1",
                params![learner_id],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            Some(json) => Ok(Some(LearnerSnapshot::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Stored learners in id order
    pub fn list_learners(&self) -> Result<Vec<LearnerRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, snapshot_version, created_at, updated_at FROM learners ORDER BY id",
        )?;
        let records = stmt
            .query_map([], |row| {
                let created: String = row.get(2)?;
                let updated: String = row.get(3)?;
                Ok(LearnerRecord {
                    learner_id: row.get(0)?,
                    snapshot_version: row.get(1)?,
                    created_at: Self::parse_timestamp(&created, "created_at")?,
                    updated_at: Self::parse_timestamp(&updated, "updated_at")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Delete a learner and their review log
    pub fn delete_learner(&self, learner_id: &str) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM review_log WHERE learner_id = ?1",
            params![learner_id],
        )?;
        let rows = tx.execute("DELETE FROM learners WHERE id = ?1", params![learner_id])?;
        tx.commit()?;
        if rows > 0 {
            tracing::info!(learner_id, "Deleted learner");
        }
        Ok(rows > 0)
    }

    // ========================================================================
    // REVIEW LOG
    // ========================================================================

    /// Append one graded review
    pub fn append_review(
        &self,
        learner_id: &str,
        event: &ReviewEvent,
        outcome: &GradeOutcome,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO review_log (
                learner_id, item_id, quality, response_time_seconds, content_type,
                review_type, interval_days, ease_factor, reviewed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                learner_id,
                event.item_id,
                event.quality.value(),
                event.response_time_seconds,
                outcome.content_type.as_str(),
                outcome.review_type.as_str(),
                outcome.state.interval_days,
                outcome.state.ease_factor,
                reviewed_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Most recent reviews of a learner, newest first
    pub fn recent_reviews(&self, learner_id: &str, limit: usize) -> Result<Vec<ReviewLogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT learner_id, item_id, quality, response_time_seconds, content_type,
                    review_type, interval_days, ease_factor, reviewed_at
             FROM review_log WHERE learner_id = ?1
             ORDER BY reviewed_at DESC, id DESC LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let entries = stmt
            .query_map(params![learner_id, limit], |row| {
                let reviewed: String = row.get(8)?;
                Ok(ReviewLogEntry {
                    learner_id: row.get(0)?,
                    item_id: row.get(1)?,
                    quality: row.get(2)?,
                    response_time_seconds: row.get(3)?,
                    content_type: row.get(4)?,
                    review_type: row.get(5)?,
                    interval_days: row.get(6)?,
                    ease_factor: row.get(7)?,
                    reviewed_at: Self::parse_timestamp(&reviewed, "reviewed_at")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

// ============================================================================
// TESTS
// ============================================================================
