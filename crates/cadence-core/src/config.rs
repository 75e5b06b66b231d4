//! Engine configuration
//!
//! Every section has defaults and accepts partial JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analytics::AnalyzerConfig;
use crate::error::{CadenceError, Result};
use crate::interval::IntervalParams;
use crate::queue::SchedulerConfig;
use crate::recommend::RecommenderConfig;
use crate::zpd::ZpdConfig;

/// Configuration of every component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CadenceConfig {
    /// SM-2 parameters
    pub interval: IntervalParams,
    /// Due queue
    pub scheduler: SchedulerConfig,
    /// Performance analyzer
    pub analyzer: AnalyzerConfig,
    /// ZPD tracker
    pub zpd: ZpdConfig,
    /// Recommender
    pub recommender: RecommenderConfig,
}

impl CadenceConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.interval.validate()?;
        self.scheduler.validate()?;
        self.analyzer.validate()?;
        self.zpd.validate()?;
        self.recommender.validate()
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CadenceError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
