//! # Cadence Core
//!
//! Adaptive learning scheduler. Decides what a learner should study next and
//! when to review it:
//!
//! - **SM-2 intervals**: ease, repetitions and interval per item, extended with
//!   a streak bonus, a difficulty penalty and a per-learner performance factor
//! - **Due queue**: one live entry per item, priority by overdueness, ease and
//!   difficulty, with an advisory daily review cap
//! - **Performance analytics**: rolling accuracy, latency and quality windows,
//!   trends, consistency, learning velocity and per-type mastery
//! - **Zone of Proximal Development**: per-skill mastery and a target
//!   difficulty band
//! - **Recommendations**: weighted multi-factor ranking of catalog content and
//!   greedy time-boxed session selection
//!
//! All learner data lives in a [`LearnerState`]. The engine itself only holds
//! validated configuration, so one engine can serve any number of learners.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadence_core::prelude::*;
//!
//! let engine = CadenceEngine::new(CadenceConfig::default())?;
//! let catalog = ContentCatalog::from_items([
//!     ContentItem::new("hola", ContentType::Vocabulary, 0.2)?.with_skills(["greetings"]),
//! ])?;
//!
//! let now = chrono::Utc::now();
//! let mut learner = engine.new_learner("ana", &catalog, None, now)?;
//! engine.enqueue_catalog(&mut learner, &catalog, now);
//!
//! for due in engine.poll_due(&mut learner, 10, false, now) {
//!     let event = ReviewEvent::new(&due.item_id, Quality::new(4)?, 6.5, due.content_type)?;
//!     let outcome = engine.grade(&mut learner, &event, now)?;
//!     println!("{} next due {}", outcome.item_id, outcome.next_due);
//! }
//!
//! let snapshot = engine.export(&learner, now).to_json()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `storage` (default): SQLite snapshot store in the platform data directory

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod interval;
pub mod learner;
pub mod queue;
pub mod recommend;
pub mod snapshot;
pub mod zpd;

#[cfg(feature = "storage")]
#[cfg_attr(docsrs, doc(cfg(feature = "storage")))]
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use error::{CadenceError, Result};

pub use config::CadenceConfig;
pub use engine::{CadenceEngine, InteractionOutcome, LearnerStats};
pub use learner::LearnerState;
pub use snapshot::{LearnerSnapshot, SNAPSHOT_VERSION};

// Catalog
pub use catalog::{ContentCatalog, ContentItem, ContentType, SharedCatalog};

// SM-2 interval engine
pub use interval::{
    AdvanceOutcome, IntervalEngine, IntervalParams, IntervalPreview, ItemState, Quality,
};

// Due queue
pub use queue::{
    DueQueue, DueReview, GradeOutcome, QueueSnapshot, QueueStats, ReviewEvent, ReviewQueueEntry,
    ReviewType, SchedulerConfig,
};

// Performance analytics
pub use analytics::{
    AnalyzerConfig, AnalyzerSnapshot, PerformanceAnalyzer, PerformanceSummary, SessionRecord,
};

// Zone of Proximal Development
pub use zpd::{
    DifficultyRecommendation, LearningZone, SkillAssessment, SkillObservation, ZpdConfig,
    ZpdProfile, ZpdRange, ZpdTracker,
};

// Recommendations
pub use recommend::{
    InteractionEvent, InteractionHistory, InteractionType, RankOptions, RecommendationScore,
    RecommendationWeights, Recommender, RecommenderConfig, ScoreComponents, SessionPlan,
};

// Storage layer
#[cfg(feature = "storage")]
pub use storage::{LearnerRecord, ReviewLogEntry, SnapshotStore, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CadenceConfig, CadenceEngine, CadenceError, ContentCatalog, ContentItem, ContentType,
        DueReview, GradeOutcome, InteractionEvent, InteractionType, LearnerSnapshot,
        LearnerState, Quality, RankOptions, RecommendationScore, Result, ReviewEvent,
        SessionPlan, SharedCatalog,
    };

    #[cfg(feature = "storage")]
    pub use crate::{SnapshotStore, StorageError};
}
