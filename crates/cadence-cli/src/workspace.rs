//! Workspace
//!
//! Engine, catalog and snapshot store resolved from the command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cadence_core::{
    CadenceConfig, CadenceEngine, ContentCatalog, LearnerState, SnapshotStore,
};
use chrono::Utc;
use directories::ProjectDirs;

/// Config file picked up from the platform config directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Database file inside `--data-dir`
const DATABASE_FILE: &str = "cadence.db";

/// Everything a command needs
pub struct Workspace {
    pub engine: CadenceEngine,
    pub store: SnapshotStore,
}

impl Workspace {
    /// Resolve configuration and open the store
    pub fn open(config: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let config = load_config(config)?;
        let engine = CadenceEngine::new(config).context("invalid configuration")?;
        let store = SnapshotStore::open(data_dir.map(|dir| dir.join(DATABASE_FILE)))
            .context("failed to open the snapshot store")?;
        tracing::debug!(path = ?store.path(), "Workspace ready");
        Ok(Self { engine, store })
    }

    /// Stored catalog
    pub fn catalog(&self) -> anyhow::Result<ContentCatalog> {
        Ok(self.store.load_catalog()?)
    }

    /// Load a learner, failing if they were never initialized
    pub fn learner(&self, learner_id: &str) -> anyhow::Result<LearnerState> {
        let Some(snapshot) = self.store.load_learner(learner_id)? else {
            bail!("unknown learner '{}' (run `cadence init {}` first)", learner_id, learner_id);
        };
        Ok(self.engine.import(snapshot)?)
    }

    /// Persist a learner
    pub fn save(&self, learner: &LearnerState) -> anyhow::Result<()> {
        let snapshot = self.engine.export(learner, Utc::now());
        self.store.save_learner(&snapshot)?;
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "cadence", "core")
        .map(|dirs| dirs.config_dir().join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CadenceConfig> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };
    match path {
        Some(p) => CadenceConfig::load(&p)
            .with_context(|| format!("failed to load configuration from {}", p.display())),
        None => Ok(CadenceConfig::default()),
    }
}
