//! Scoring weights and recommender configuration

use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, Result};

/// Tolerance on the weight sum
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Days a completed item stays out of recommendations
pub const DEFAULT_RECENCY_WINDOW_DAYS: f64 = 3.0;

/// Most picks of one content type in a session
pub const DEFAULT_MAX_PER_TYPE: usize = 3;

/// Session budget multiplier (20% buffer)
pub const DEFAULT_TIME_BUFFER: f64 = 1.2;

/// Weak skills considered for weakness targeting
pub const DEFAULT_WEAK_SKILL_COUNT: usize = 5;

/// Timing score of never-seen content
pub const NEVER_SEEN_TIMING_SCORE: f64 = 0.8;

/// Component weights of the recommendation score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationWeights {
    /// Closeness of item difficulty to the learner's optimal difficulty
    pub difficulty_match: f64,
    /// Share of the item's skills already tracked
    pub skill_relevance: f64,
    /// Share of weak skills the item addresses
    pub weakness_targeting: f64,
    /// Closeness of time since last exposure to the ideal gap
    pub spaced_timing: f64,
    /// Penalty for repeating a content type
    pub variety: f64,
    /// Running engagement of the item
    pub engagement: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        Self {
            difficulty_match: 0.25,
            skill_relevance: 0.20,
            weakness_targeting: 0.20,
            spaced_timing: 0.15,
            variety: 0.10,
            engagement: 0.10,
        }
    }
}

impl RecommendationWeights {
    /// Weights as `(name, value)` pairs
    pub fn as_pairs(&self) -> [(&'static str, f64); 6] {
        [
            ("difficulty_match", self.difficulty_match),
            ("skill_relevance", self.skill_relevance),
            ("weakness_targeting", self.weakness_targeting),
            ("spaced_timing", self.spaced_timing),
            ("variety", self.variety),
            ("engagement", self.engagement),
        ]
    }

    /// Sum of all weights
    pub fn sum(&self) -> f64 {
        self.as_pairs().iter().map(|(_, w)| w).sum()
    }

    /// Weights must be non-negative and sum to 1.0
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in self.as_pairs() {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(CadenceError::Configuration(format!(
                    "weight '{}' must be non-negative, got {}",
                    name, weight
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(CadenceError::Configuration(format!(
                "recommendation weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Recommender configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommenderConfig {
    /// Component weights
    pub weights: RecommendationWeights,
    /// Days a completed item is filtered out
    pub recency_window_days: f64,
    /// Days of history the variety term looks at
    pub variety_window_days: f64,
    /// Most picks of one content type per session
    pub max_per_type: usize,
    /// Session budget multiplier
    pub time_buffer: f64,
    /// Weak skills considered
    pub weak_skill_count: usize,
    /// EMA rate of item engagement
    pub engagement_alpha: f64,
    /// Interactions kept per learner
    pub max_history: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            weights: RecommendationWeights::default(),
            recency_window_days: DEFAULT_RECENCY_WINDOW_DAYS,
            variety_window_days: DEFAULT_RECENCY_WINDOW_DAYS,
            max_per_type: DEFAULT_MAX_PER_TYPE,
            time_buffer: DEFAULT_TIME_BUFFER,
            weak_skill_count: DEFAULT_WEAK_SKILL_COUNT,
            engagement_alpha: 0.2,
            max_history: 500,
        }
    }
}

impl RecommenderConfig {
    /// Check configuration consistency
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(self.recency_window_days.is_finite() && self.recency_window_days >= 0.0)
            || !(self.variety_window_days.is_finite() && self.variety_window_days >= 0.0)
        {
            return Err(CadenceError::Configuration(
                "recommender windows must be non-negative".to_string(),
            ));
        }
        if self.max_per_type == 0 || self.weak_skill_count == 0 || self.max_history == 0 {
            return Err(CadenceError::Configuration(
                "max_per_type, weak_skill_count and max_history must be positive".to_string(),
            ));
        }
        if !(self.time_buffer.is_finite() && self.time_buffer >= 1.0) {
            return Err(CadenceError::Configuration(format!(
                "time_buffer must be at least 1.0, got {}",
                self.time_buffer
            )));
        }
        if !(self.engagement_alpha > 0.0 && self.engagement_alpha <= 1.0) {
            return Err(CadenceError::Configuration(format!(
                "engagement_alpha must be in (0, 1], got {}",
                self.engagement_alpha
            )));
        }
        Ok(())
    }
}
