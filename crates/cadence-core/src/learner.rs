//! Per-learner state
//!
//! All mutable data belonging to one learner. A hosting application may keep
//! many of these and shard them across threads; each one must only ever have
//! a single writer.

use chrono::{DateTime, Utc};

use crate::analytics::PerformanceAnalyzer;
use crate::queue::DueQueue;
use crate::recommend::{InteractionHistory, RankingContext};
use crate::zpd::ZpdProfile;

/// One learner's queue, statistics, skills and history
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerState {
    /// Learner id
    pub learner_id: String,
    /// When the learner was created
    pub created_at: DateTime<Utc>,
    /// Review queue and item states
    pub queue: DueQueue,
    /// Review statistics
    pub performance: PerformanceAnalyzer,
    /// Skills and difficulty band
    pub profile: ZpdProfile,
    /// Interactions
    pub history: InteractionHistory,
}

impl LearnerState {
    /// Read-only view for the recommender
    pub fn ranking_context(&self, now: DateTime<Utc>) -> RankingContext<'_> {
        RankingContext {
            profile: &self.profile,
            history: &self.history,
            performance: Some(&self.performance),
            now,
        }
    }
}
