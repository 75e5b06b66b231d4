//! Test Store Manager
//!
//! Provides isolated snapshot stores for testing:
//! - Temporary databases that are automatically cleaned up
//! - Catalog seeding and learner creation
//! - Reopening the same database to test persistence

use std::path::PathBuf;

use cadence_core::{
    CadenceConfig, CadenceEngine, ContentCatalog, LearnerState, SnapshotStore,
};
use chrono::{DateTime, Utc};
use tempfile::TempDir;

/// Manager for test stores
///
/// Creates an isolated database per test. The temporary directory is deleted
/// when the manager is dropped.
///
/// # Example
///
/// ```rust,ignore
/// let mut manager = TestStoreManager::new_temp();
/// manager.seed_catalog(&CatalogFactory::language_course());
/// let learner = manager.create_learner("ana", now);
/// ```
pub struct TestStoreManager {
    /// The store instance
    pub store: SnapshotStore,
    /// Engine used to import and export learners
    pub engine: CadenceEngine,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestStoreManager {
    /// Create a new test store in a temporary directory
    pub fn new_temp() -> Self {
        Self::with_config(CadenceConfig::default())
    }

    /// Temporary store with a specific engine configuration
    pub fn with_config(config: CadenceConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_cadence.db");
        let store = SnapshotStore::open(Some(db_path.clone())).expect("Failed to create test store");
        let engine = CadenceEngine::new(config).expect("Invalid test configuration");

        Self {
            store,
            engine,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Close and reopen the database file
    pub fn reopen(&mut self) {
        self.store = SnapshotStore::open(Some(self.db_path.clone())).expect("Failed to reopen store");
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Store a catalog
    pub fn seed_catalog(&self, catalog: &ContentCatalog) -> usize {
        self.store.save_catalog(catalog).expect("Failed to save catalog")
    }

    /// Stored catalog
    pub fn catalog(&self) -> ContentCatalog {
        self.store.load_catalog().expect("Failed to load catalog")
    }

    /// Create a learner over the stored catalog, queue every item and save them
    pub fn create_learner(&self, learner_id: &str, now: DateTime<Utc>) -> LearnerState {
        let catalog = self.catalog();
        let mut learner = self
            .engine
            .new_learner(learner_id, &catalog, None, now)
            .expect("Failed to create learner");
        self.engine.enqueue_catalog(&mut learner, &catalog, now);
        self.save(&learner, now);
        learner
    }

    /// Persist a learner
    pub fn save(&self, learner: &LearnerState, now: DateTime<Utc>) {
        self.store
            .save_learner(&self.engine.export(learner, now))
            .expect("Failed to save learner");
    }

    /// Load a learner back through the snapshot format
    pub fn load(&self, learner_id: &str) -> Option<LearnerState> {
        self.store
            .load_learner(learner_id)
            .expect("Failed to read learner")
            .map(|snapshot| self.engine.import(snapshot).expect("Failed to import learner"))
    }

    /// Number of stored learners
    pub fn learner_count(&self) -> usize {
        self.store.list_learners().map(|l| l.len()).unwrap_or(0)
    }
}
