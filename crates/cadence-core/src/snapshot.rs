//! Learner snapshots
//!
//! A versioned, self-contained picture of one learner's state. Importing an
//! exported snapshot reproduces the state exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyzerSnapshot;
use crate::error::{CadenceError, Result};
use crate::queue::QueueSnapshot;
use crate::recommend::InteractionHistory;
use crate::zpd::ZpdProfile;

/// Snapshot format written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSnapshot {
    /// Format version
    pub version: u32,
    /// Learner id
    pub learner_id: String,
    /// When the learner was created
    pub created_at: DateTime<Utc>,
    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,
    /// Item states, queue entries and scheduler counters
    pub queue: QueueSnapshot,
    /// Performance windows and sessions
    pub performance: AnalyzerSnapshot,
    /// Skills and difficulty band
    pub profile: ZpdProfile,
    /// Interactions
    pub history: InteractionHistory,
}

impl LearnerSnapshot {
    /// Reject versions this build cannot read
    pub fn check_version(&self) -> Result<()> {
        if self.version == 0 || self.version > SNAPSHOT_VERSION {
            return Err(CadenceError::UnsupportedSnapshot {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        if self.profile.learner_id != self.learner_id {
            return Err(CadenceError::InvalidInput(format!(
                "snapshot for '{}' carries a profile for '{}'",
                self.learner_id, self.profile.learner_id
            )));
        }
        Ok(())
    }

    /// Compact JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON and check the version
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }
}
