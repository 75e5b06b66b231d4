//! Zone of Proximal Development Module
//!
//! Per-learner skill mastery and target difficulty:
//! - EMA skill levels weighted by attempted difficulty
//! - Confidence- and stability-weighted difficulty band
//! - Optimal difficulty biased a quarter band-width above the mean
//! - Zone classification and challenge adjustment

mod profile;
mod tracker;

pub use profile::{LearningZone, SkillAssessment, ZpdProfile, ZpdRange, classify_zone};
pub use tracker::{
    DEFAULT_FRUSTRATION_THRESHOLD, DEFAULT_MASTERY_THRESHOLD, DEFAULT_SKILL_CONFIDENCE,
    DEFAULT_SKILL_LEARNING_RATE, DEFAULT_SKILL_LEVEL, DEFAULT_ZPD_WIDTH, DifficultyRecommendation,
    MAX_CHALLENGE_ADJUSTMENT, MAX_ZPD_WIDTH, MIN_STABILITY, MIN_ZPD_WIDTH, SkillObservation,
    TREND_HISTORY, ZpdConfig, ZpdTracker,
};
