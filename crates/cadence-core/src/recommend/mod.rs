//! Recommendation Module
//!
//! Ranks catalog content for a learner:
//! - Six externally weighted components (weights sum to 1.0)
//! - Urgency boosts from weak skills or the due queue
//! - Recency, prerequisite, type and time-budget filters
//! - Greedy session selection with a per-type cap

mod history;
mod ranker;
mod weights;

pub use history::{Exposure, InteractionEvent, InteractionHistory, InteractionType};
pub use ranker::{
    RankOptions, RankingContext, RecommendationScore, Recommender, ScoreComponents, SessionPlan,
    timing_score, variety_score,
};
pub use weights::{
    DEFAULT_MAX_PER_TYPE, DEFAULT_RECENCY_WINDOW_DAYS, DEFAULT_TIME_BUFFER,
    DEFAULT_WEAK_SKILL_COUNT, NEVER_SEEN_TIMING_SCORE, RecommendationWeights, RecommenderConfig,
    WEIGHT_SUM_TOLERANCE,
};
