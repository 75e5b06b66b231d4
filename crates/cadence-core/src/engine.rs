//! Cadence Engine
//!
//! Facade over the five components. The engine holds validated configuration
//! and the stateless parts; every learner-specific datum lives in a
//! [`LearnerState`] passed in by reference.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{PerformanceAnalyzer, PerformanceSummary, SessionRecord};
use crate::catalog::{ContentCatalog, ContentType, SharedCatalog};
use crate::config::CadenceConfig;
use crate::error::{CadenceError, Result};
use crate::interval::{IntervalEngine, IntervalPreview};
use crate::learner::LearnerState;
use crate::queue::{DueQueue, DueReview, GradeOutcome, QueueStats, ReviewEvent};
use crate::recommend::{
    InteractionEvent, InteractionHistory, InteractionType, RankOptions, RecommendationScore,
    Recommender, SessionPlan,
};
use crate::snapshot::{LearnerSnapshot, SNAPSHOT_VERSION};
use crate::zpd::{
    DifficultyRecommendation, SkillAssessment, SkillObservation, ZpdRange, ZpdTracker,
};

/// Weak and strong skills listed in learner stats
const STATS_SKILL_COUNT: usize = 5;

// ============================================================================
// REPORTS
// ============================================================================

/// Effect of one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionOutcome {
    /// Skills updated by a completion
    pub updated_skills: Vec<SkillAssessment>,
    /// Item engagement after the update (`None` if the item is not in the catalog)
    pub engagement_score: Option<f64>,
}

/// Overview of one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStats {
    /// Learner id
    pub learner_id: String,
    /// Queue counters
    pub queue: QueueStats,
    /// Review statistics
    pub performance: PerformanceSummary,
    /// Recommended difficulty
    pub optimal_difficulty: f64,
    /// Target band
    pub zpd_range: ZpdRange,
    /// Weakest skills, weakest first
    pub weak_skills: Vec<String>,
    /// Strongest skills, strongest first
    pub strong_skills: Vec<String>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Adaptive learning scheduler
#[derive(Debug, Clone)]
pub struct CadenceEngine {
    config: CadenceConfig,
    interval: IntervalEngine,
    zpd: ZpdTracker,
    recommender: Recommender,
}

impl CadenceEngine {
    /// Build an engine, refusing invalid configuration
    pub fn new(config: CadenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            interval: IntervalEngine::new(config.interval.clone())?,
            zpd: ZpdTracker::new(config.zpd.clone())?,
            recommender: Recommender::new(config.recommender.clone())?,
            config,
        })
    }

    /// Engine with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: CadenceConfig::default(),
            interval: IntervalEngine::default(),
            zpd: ZpdTracker::default(),
            recommender: Recommender::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &CadenceConfig {
        &self.config
    }

    /// ZPD tracker
    pub fn zpd(&self) -> &ZpdTracker {
        &self.zpd
    }

    /// Recommender
    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    fn empty_queue(&self) -> DueQueue {
        DueQueue::new(self.interval.clone(), self.config.scheduler.clone())
    }

    // ========================================================================
    // LEARNERS
    // ========================================================================

    /// Create a learner whose profile covers every catalog skill
    pub fn new_learner(
        &self,
        learner_id: &str,
        catalog: &ContentCatalog,
        initial_levels: Option<&BTreeMap<String, f64>>,
        now: DateTime<Utc>,
    ) -> Result<LearnerState> {
        if learner_id.trim().is_empty() {
            return Err(CadenceError::InvalidInput(
                "learner id must not be empty".to_string(),
            ));
        }
        let profile = self
            .zpd
            .initialize(learner_id, catalog.skills(), initial_levels, now)?;
        tracing::info!(learner_id, "Created learner");
        Ok(LearnerState {
            learner_id: learner_id.to_string(),
            created_at: now,
            queue: self.empty_queue(),
            performance: PerformanceAnalyzer::new(self.config.analyzer.clone()),
            profile,
            history: InteractionHistory::new(self.config.recommender.max_history),
        })
    }

    // ========================================================================
    // REVIEWS
    // ========================================================================

    /// Add a never-seen item to the learner's queue
    pub fn enqueue(
        &self,
        learner: &mut LearnerState,
        item_id: &str,
        content_type: ContentType,
        now: DateTime<Utc>,
    ) -> bool {
        learner.queue.enqueue_new_at(item_id, content_type, now)
    }

    /// Queue every catalog item the learner does not track yet
    pub fn enqueue_catalog(
        &self,
        learner: &mut LearnerState,
        catalog: &ContentCatalog,
        now: DateTime<Utc>,
    ) -> usize {
        catalog
            .iter()
            .filter(|item| learner.queue.enqueue_new_at(&item.id, item.content_type, now))
            .count()
    }

    /// Grade a review: reschedule the item and record the statistics.
    ///
    /// The learning velocity of the reviews recorded so far scales the
    /// interval. Statistics are recorded under the queue entry's content type.
    pub fn grade(
        &self,
        learner: &mut LearnerState,
        event: &ReviewEvent,
        now: DateTime<Utc>,
    ) -> Result<GradeOutcome> {
        let velocity = learner.performance.learning_velocity();
        let outcome = learner.queue.grade_with_velocity(event, velocity, now)?;
        learner.performance.record(
            &event.item_id,
            event.quality,
            event.response_time_seconds,
            outcome.content_type,
        )?;
        Ok(outcome)
    }

    /// Highest-priority due reviews
    pub fn poll_due(
        &self,
        learner: &mut LearnerState,
        limit: usize,
        include_future: bool,
        now: DateTime<Utc>,
    ) -> Vec<DueReview> {
        learner.queue.poll_due_at(limit, include_future, now)
    }

    /// Interval each grade would produce for an item
    pub fn preview(
        &self,
        learner: &LearnerState,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<IntervalPreview> {
        let velocity = learner.performance.learning_velocity();
        learner.queue.preview_with_velocity(item_id, velocity, now)
    }

    // ========================================================================
    // INTERACTIONS
    // ========================================================================

    /// Record an interaction.
    ///
    /// Completions of catalog items update every skill the item practices.
    /// Every interaction with a catalog item feeds its engagement average.
    pub fn record_interaction(
        &self,
        learner: &mut LearnerState,
        catalog: &SharedCatalog,
        mut event: InteractionEvent,
    ) -> Result<InteractionOutcome> {
        event.validate()?;
        if event.learner_id != learner.learner_id {
            return Err(CadenceError::UnknownLearner(event.learner_id));
        }

        let item = catalog.get(&event.content_id);
        if event.content_type.is_none() {
            event.content_type = item.as_ref().map(|i| i.content_type);
        }

        let mut updated_skills = Vec::new();
        let completed = item
            .as_ref()
            .filter(|_| event.interaction_type == InteractionType::Completed);
        if let Some(item) = completed {
            let seconds_per_skill =
                event.time_spent_minutes * 60.0 / item.skills.len().max(1) as f64;
            for skill in &item.skills {
                let observation = SkillObservation {
                    skill: skill.clone(),
                    performance: event.performance,
                    confidence: event.performance,
                    response_time_seconds: seconds_per_skill,
                    difficulty: item.difficulty,
                };
                updated_skills.push(self.zpd.update_skill(
                    &mut learner.profile,
                    &observation,
                    event.timestamp,
                )?);
            }
        }

        let engagement_score = catalog.record_engagement(
            &event.content_id,
            event.observed_engagement(),
            self.config.recommender.engagement_alpha,
        );
        if engagement_score.is_none() {
            tracing::warn!(content_id = %event.content_id, "Interaction with content outside the catalog");
        }

        learner.history.record(event)?;
        Ok(InteractionOutcome {
            updated_skills,
            engagement_score,
        })
    }

    // ========================================================================
    // RECOMMENDATIONS
    // ========================================================================

    /// Rank the whole catalog for a learner
    pub fn recommend(
        &self,
        learner: &LearnerState,
        catalog: &ContentCatalog,
        options: &RankOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecommendationScore>> {
        self.recommender
            .rank(&learner.ranking_context(now), catalog.iter(), options)
    }

    /// Catalog items that target the learner's weak skills
    pub fn recommend_for_weaknesses(
        &self,
        learner: &LearnerState,
        catalog: &ContentCatalog,
        options: &RankOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecommendationScore>> {
        self.recommender
            .recommend_for_weaknesses(&learner.ranking_context(now), catalog.iter(), options)
    }

    /// Catalog items due for review, boosted by queue priority
    pub fn recommend_reviews(
        &self,
        learner: &LearnerState,
        catalog: &ContentCatalog,
        options: &RankOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecommendationScore>> {
        self.recommender.recommend_reviews(
            &learner.ranking_context(now),
            catalog.iter(),
            &learner.queue,
            options,
        )
    }

    /// Time-boxed session plan
    pub fn select_session(
        &self,
        learner: &LearnerState,
        catalog: &ContentCatalog,
        session_minutes: f64,
        content_type: Option<ContentType>,
        now: DateTime<Utc>,
    ) -> Result<SessionPlan> {
        self.recommender.select_session(
            &learner.ranking_context(now),
            catalog.iter(),
            session_minutes,
            content_type,
        )
    }

    /// Difficulty for the next item practicing a skill
    pub fn recommend_difficulty(&self, learner: &LearnerState, skill: &str) -> DifficultyRecommendation {
        self.zpd.recommend_difficulty(&learner.profile, skill)
    }

    /// Difficulty nudge from recent `(performance, difficulty)` pairs
    pub fn challenge_adjustment(&self, learner: &LearnerState, recent: &[(f64, f64)]) -> f64 {
        self.zpd.challenge_adjustment(&learner.profile, recent)
    }

    // ========================================================================
    // SESSIONS & STATS
    // ========================================================================

    /// Start a study session
    pub fn start_session(&self, learner: &mut LearnerState, now: DateTime<Utc>) -> Uuid {
        learner.performance.start_session_at(now)
    }

    /// End the current study session
    pub fn end_session(&self, learner: &mut LearnerState, now: DateTime<Utc>) -> Option<SessionRecord> {
        learner.performance.end_session_at(now)
    }

    /// Overview of a learner
    pub fn stats(&self, learner: &LearnerState, now: DateTime<Utc>) -> LearnerStats {
        let names = |skills: Vec<&SkillAssessment>| {
            skills
                .into_iter()
                .map(|s| s.skill_name.clone())
                .collect::<Vec<_>>()
        };
        LearnerStats {
            learner_id: learner.learner_id.clone(),
            queue: learner.queue.stats_at(now),
            performance: learner.performance.summary(),
            optimal_difficulty: learner.profile.optimal_difficulty,
            zpd_range: learner.profile.zpd_range,
            weak_skills: names(learner.profile.weak_skills(STATS_SKILL_COUNT)),
            strong_skills: names(learner.profile.strong_skills(STATS_SKILL_COUNT)),
        }
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    /// Capture a learner
    pub fn export(&self, learner: &LearnerState, now: DateTime<Utc>) -> LearnerSnapshot {
        tracing::info!(learner_id = %learner.learner_id, "Exported learner snapshot");
        LearnerSnapshot {
            version: SNAPSHOT_VERSION,
            learner_id: learner.learner_id.clone(),
            created_at: learner.created_at,
            exported_at: now,
            queue: learner.queue.snapshot(),
            performance: learner.performance.snapshot(),
            profile: learner.profile.clone(),
            history: learner.history.clone(),
        }
    }

    /// Rebuild a learner from a snapshot.
    ///
    /// Every part is checked against the bounds the components maintain
    /// before anything is built; a failing snapshot yields `InvalidInput`.
    pub fn import(&self, snapshot: LearnerSnapshot) -> Result<LearnerState> {
        snapshot.check_version()?;
        snapshot.profile.validate()?;
        snapshot.history.validate()?;
        let queue = DueQueue::restore(
            self.interval.clone(),
            self.config.scheduler.clone(),
            snapshot.queue,
        )?;
        let performance =
            PerformanceAnalyzer::restore(self.config.analyzer.clone(), snapshot.performance)?;
        tracing::info!(
            learner_id = %snapshot.learner_id,
            items = queue.len(),
            "Imported learner snapshot"
        );
        Ok(LearnerState {
            learner_id: snapshot.learner_id,
            created_at: snapshot.created_at,
            queue,
            performance,
            profile: snapshot.profile,
            history: snapshot.history,
        })
    }
}

impl Default for CadenceEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================
