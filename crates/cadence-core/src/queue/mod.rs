//! Due-Queue Module
//!
//! Per-learner review queue:
//! - One live entry per item, indexed by id
//! - Time-dependent priority recomputed on every poll
//! - Global performance factor, scaled by learning velocity, fed back into the interval engine
//! - Advisory daily review cap

mod entry;
mod scheduler;

pub use entry::{DueReview, ReviewEvent, ReviewQueueEntry, ReviewType};
pub use scheduler::{
    DEFAULT_ARCHIVED_PRIORITY_FACTOR, DEFAULT_MAX_DAILY_REVIEWS, DEFAULT_PERFORMANCE_ALPHA,
    DEFAULT_VELOCITY_WEIGHT, DueQueue, GradeOutcome, MAX_PERFORMANCE_FACTOR,
    MIN_PERFORMANCE_FACTOR, NEUTRAL_VELOCITY, NEW_ITEM_PRIORITY, QueueSnapshot, QueueStats,
    SchedulerConfig, classify, latency_multiplier, review_priority,
};
