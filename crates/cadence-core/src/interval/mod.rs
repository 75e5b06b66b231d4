//! Interval Engine Module
//!
//! SM-2 review scheduling with three extra multipliers:
//! - Streak bonus: long runs of correct answers stretch intervals (up to 2x)
//! - Difficulty penalty: items with a success rate under 60% are shortened
//! - Global performance factor: supplied by the due queue per learner
//!
//! ## Core Formulas:
//! - Ease: EF' = clamp(EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), 1.3, 4.0)
//! - Interval: 1 day, then 4 days, then ceil(I * EF'), scaled and clamped to [1, 365]
//! - Retention: exp(-(0.1/EF) * t) * (0.5 + 0.5 * success_rate)

mod engine;
mod quality;

pub use engine::{
    difficulty_penalty, item_learning_velocity, next_ease, streak_bonus, AdvanceOutcome,
    IntervalEngine, IntervalParams, IntervalPreview, ItemState, DEFAULT_EASE,
    GRADUATION_INTERVAL_DAYS, GRADUATION_SUCCESS_RATE, INITIAL_INTERVAL_DAYS, MAX_EASE,
    MAX_INTERVAL_DAYS, MAX_ITEM_VELOCITY, MAX_STREAK_BONUS, MIN_DIFFICULTY_PENALTY, MIN_EASE,
    MIN_ITEM_VELOCITY,
};
pub use quality::{Quality, MAX_QUALITY, PASSING_QUALITY};
