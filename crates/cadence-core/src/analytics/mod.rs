//! Performance Analytics Module
//!
//! Rolling-window statistics over a learner's reviews:
//! - Accuracy, speed and quality trends (least-squares slope by position)
//! - Consistency and learning velocity
//! - Per-content-type mastery
//! - Session tracking and optimal session length

mod analyzer;
mod window;

pub use analyzer::{
    ActiveSession, AnalyzerConfig, AnalyzerSnapshot, DEFAULT_RECENT_SAMPLES,
    DEFAULT_SESSION_MINUTES, IDEAL_RESPONSE_SECONDS, MAX_LEARNING_VELOCITY, MIN_LEARNING_VELOCITY,
    PerformanceAnalyzer, PerformanceSummary, SessionRecord,
};
pub use window::{
    DEFAULT_WINDOW_SIZE, PerformanceWindow, RingBuffer, SampleWindow, mean, std_dev, trend,
};
