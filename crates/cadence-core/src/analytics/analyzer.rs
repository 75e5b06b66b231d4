//! Performance Analyzer
//!
//! Rolling statistics over a learner's review stream. Every statistic falls
//! back to a neutral value on empty input.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::window::{DEFAULT_WINDOW_SIZE, PerformanceWindow, SampleWindow, mean, std_dev, trend};
use crate::catalog::ContentType;
use crate::error::{CadenceError, Result, ensure_non_negative, ensure_range};
use crate::interval::{MAX_QUALITY, Quality};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Samples considered "recent" for velocity and mastery
pub const DEFAULT_RECENT_SAMPLES: usize = 10;

/// Response time treated as ideal (seconds)
pub const IDEAL_RESPONSE_SECONDS: f64 = 10.0;

/// Session length suggested until enough sessions have been completed (minutes)
pub const DEFAULT_SESSION_MINUTES: f64 = 20.0;

/// Number of best sessions averaged for the optimal session length
pub const TOP_SESSIONS: usize = 3;

/// Completed sessions retained
pub const MAX_SESSION_HISTORY: usize = 100;

/// Learning velocity bounds
pub const MIN_LEARNING_VELOCITY: f64 = 0.3;
/// Upper bound of the learning velocity
pub const MAX_LEARNING_VELOCITY: f64 = 2.0;

/// Speed factor bounds
const MIN_SPEED_FACTOR: f64 = 0.5;
const MAX_SPEED_FACTOR: f64 = 2.0;

// ============================================================================
// CONFIG
// ============================================================================

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    /// Capacity of every ring buffer
    pub window_size: usize,
    /// Newest samples used for velocity and mastery
    pub recent_samples: usize,
    /// Response time treated as ideal
    pub ideal_response_seconds: f64,
    /// Fallback optimal session length
    pub default_session_minutes: f64,
    /// Completed sessions retained
    pub max_sessions: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            recent_samples: DEFAULT_RECENT_SAMPLES,
            ideal_response_seconds: IDEAL_RESPONSE_SECONDS,
            default_session_minutes: DEFAULT_SESSION_MINUTES,
            max_sessions: MAX_SESSION_HISTORY,
        }
    }
}

impl AnalyzerConfig {
    /// Check configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 || self.recent_samples == 0 || self.max_sessions == 0 {
            return Err(CadenceError::Configuration(
                "analyzer window sizes must be positive".to_string(),
            ));
        }
        if !(self.ideal_response_seconds.is_finite() && self.ideal_response_seconds > 0.0) {
            return Err(CadenceError::Configuration(format!(
                "ideal_response_seconds must be positive, got {}",
                self.ideal_response_seconds
            )));
        }
        if !(self.default_session_minutes.is_finite() && self.default_session_minutes > 0.0) {
            return Err(CadenceError::Configuration(format!(
                "default_session_minutes must be positive, got {}",
                self.default_session_minutes
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SESSIONS
// ============================================================================

/// A study session in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    /// Session id
    pub id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Reviews recorded so far
    pub reviews: u32,
    /// Correct reviews so far
    pub correct: u32,
}

/// A finished study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session id
    pub id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub ended_at: DateTime<Utc>,
    /// Wall-clock length in minutes
    pub duration_minutes: f64,
    /// Reviews recorded
    pub reviews: u32,
    /// Correct reviews
    pub correct: u32,
    /// `correct / reviews` (0.0 for an empty session)
    pub accuracy: f64,
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Report of every analyzer statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    /// Reviews recorded over the learner's lifetime
    pub total_reviews: u64,
    /// Reviews currently in the window
    pub window_reviews: usize,
    /// Accuracy over the whole window
    pub accuracy: f64,
    /// Accuracy over the recent samples
    pub recent_accuracy: f64,
    /// Mean response time over the window
    pub average_response_seconds: Option<f64>,
    /// Slope of accuracy (positive is improving)
    pub accuracy_trend: f64,
    /// Negated slope of latency (positive is getting faster)
    pub speed_trend: f64,
    /// Slope of quality
    pub quality_trend: f64,
    /// 1 - stdev(quality)/5
    pub consistency: f64,
    /// Accuracy scaled by speed
    pub learning_velocity: f64,
    /// Suggested session length in minutes
    pub optimal_session_minutes: f64,
    /// Completed sessions on record
    pub sessions_completed: usize,
    /// Mastery per content type seen
    pub content_type_mastery: BTreeMap<ContentType, f64>,
    /// Human-readable advice
    pub recommendations: Vec<String>,
}

/// Serializable analyzer contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerSnapshot {
    /// Sample windows
    pub window: PerformanceWindow,
    /// Finished sessions, oldest first
    pub sessions: VecDeque<SessionRecord>,
    /// Session in progress
    pub active_session: Option<ActiveSession>,
    /// Lifetime review count
    pub total_reviews: u64,
}

impl AnalyzerSnapshot {
    /// Check windows, session counters and the lifetime total
    pub fn validate(&self) -> Result<()> {
        self.window.validate()?;
        if (self.window.overall.len() as u64) > self.total_reviews {
            return Err(CadenceError::InvalidInput(format!(
                "window holds {} reviews but the lifetime total is {}",
                self.window.overall.len(),
                self.total_reviews
            )));
        }
        for session in &self.sessions {
            if session.correct > session.reviews {
                return Err(CadenceError::InvalidInput(format!(
                    "session {} has {} correct of {} reviews",
                    session.id, session.correct, session.reviews
                )));
            }
            ensure_non_negative("duration_minutes", session.duration_minutes)?;
            ensure_range("accuracy", session.accuracy, 0.0, 1.0)?;
        }
        if let Some(active) = &self.active_session {
            if active.correct > active.reviews {
                return Err(CadenceError::InvalidInput(format!(
                    "active session has {} correct of {} reviews",
                    active.correct, active.reviews
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Per-learner performance statistics
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceAnalyzer {
    config: AnalyzerConfig,
    window: PerformanceWindow,
    sessions: VecDeque<SessionRecord>,
    active_session: Option<ActiveSession>,
    total_reviews: u64,
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl PerformanceAnalyzer {
    /// Empty analyzer
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            window: PerformanceWindow::new(config.window_size),
            config,
            sessions: VecDeque::new(),
            active_session: None,
            total_reviews: 0,
        }
    }

    /// Rebuild from a snapshot. Windows keep the capacity they were saved with.
    pub fn restore(config: AnalyzerConfig, snapshot: AnalyzerSnapshot) -> Result<Self> {
        snapshot.validate()?;
        let mut sessions = snapshot.sessions;
        while sessions.len() > config.max_sessions {
            sessions.pop_front();
        }
        Ok(Self {
            config,
            window: snapshot.window,
            sessions,
            active_session: snapshot.active_session,
            total_reviews: snapshot.total_reviews,
        })
    }

    /// Serializable copy of the analyzer contents
    pub fn snapshot(&self) -> AnalyzerSnapshot {
        AnalyzerSnapshot {
            window: self.window.clone(),
            sessions: self.sessions.clone(),
            active_session: self.active_session.clone(),
            total_reviews: self.total_reviews,
        }
    }

    /// Configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Raw sample windows
    pub fn window(&self) -> &PerformanceWindow {
        &self.window
    }

    /// Finished sessions, oldest first
    pub fn sessions(&self) -> impl Iterator<Item = &SessionRecord> {
        self.sessions.iter()
    }

    /// Session in progress
    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.active_session.as_ref()
    }

    /// Lifetime review count
    pub fn total_reviews(&self) -> u64 {
        self.total_reviews
    }

    /// Record a graded review
    pub fn record(
        &mut self,
        item_id: &str,
        quality: Quality,
        response_time_seconds: f64,
        content_type: ContentType,
    ) -> Result<()> {
        ensure_non_negative("response_time_seconds", response_time_seconds)?;

        self.window
            .push(quality, response_time_seconds, content_type);
        self.total_reviews = self.total_reviews.saturating_add(1);
        if let Some(session) = self.active_session.as_mut() {
            session.reviews = session.reviews.saturating_add(1);
            if quality.is_correct() {
                session.correct = session.correct.saturating_add(1);
            }
        }

        tracing::debug!(
            item_id,
            quality = quality.value(),
            latency = response_time_seconds,
            %content_type,
            "Recorded review"
        );
        Ok(())
    }

    // ========================================================================
    // STATISTICS
    // ========================================================================

    /// Accuracy over the whole window
    pub fn accuracy(&self) -> f64 {
        self.window.overall.recent_accuracy(self.config.window_size)
    }

    /// Accuracy over the recent samples
    pub fn recent_accuracy(&self) -> f64 {
        self.window.overall.recent_accuracy(self.config.recent_samples)
    }

    /// Slope of correctness over the window (positive is improving)
    pub fn accuracy_trend(&self) -> f64 {
        trend(&self.window.overall.accuracy_series())
    }

    /// Negated slope of response time (positive is getting faster)
    pub fn speed_trend(&self) -> f64 {
        let slope = trend(&self.window.overall.latency_series());
        if slope == 0.0 { 0.0 } else { -slope }
    }

    /// Slope of quality over the window
    pub fn quality_trend(&self) -> f64 {
        trend(&self.window.overall.quality_series())
    }

    /// `max(0, 1 - stdev(quality)/5)`
    pub fn consistency(&self) -> f64 {
        let spread = std_dev(&self.window.overall.quality_series());
        (1.0 - spread / f64::from(MAX_QUALITY)).max(0.0)
    }

    /// Recent accuracy scaled by how close latency is to the ideal.
    ///
    /// 1.0 with no data.
    pub fn learning_velocity(&self) -> f64 {
        let overall = &self.window.overall;
        if overall.is_empty() {
            return 1.0;
        }
        let recent = self.config.recent_samples;
        let speed_factor = match overall.recent_latency(recent) {
            Some(latency) if latency > 0.0 => {
                (self.config.ideal_response_seconds / latency).clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
            }
            _ => MAX_SPEED_FACTOR,
        };
        (overall.recent_accuracy(recent) * speed_factor)
            .clamp(MIN_LEARNING_VELOCITY, MAX_LEARNING_VELOCITY)
    }

    /// `0.7 * recent_accuracy + 0.3 * recent_quality / 5`; 0.0 for unseen types
    pub fn content_type_mastery(&self, content_type: ContentType) -> f64 {
        self.window
            .by_content_type
            .get(&content_type)
            .map(|w| self.mastery_of(w))
            .unwrap_or(0.0)
    }

    /// Mastery of a content type, `None` until it has been reviewed
    pub fn mastery_for(&self, content_type: ContentType) -> Option<f64> {
        self.window
            .by_content_type
            .get(&content_type)
            .filter(|w| !w.is_empty())
            .map(|w| self.mastery_of(w))
    }

    /// Mastery for every content type seen
    pub fn mastery_by_content_type(&self) -> BTreeMap<ContentType, f64> {
        self.window
            .by_content_type
            .iter()
            .map(|(ct, w)| (*ct, self.mastery_of(w)))
            .collect()
    }

    fn mastery_of(&self, window: &SampleWindow) -> f64 {
        let recent = self.config.recent_samples;
        0.7 * window.recent_accuracy(recent)
            + 0.3 * (window.recent_quality(recent) / f64::from(MAX_QUALITY))
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    /// Begin a session now
    pub fn start_session(&mut self) -> Uuid {
        self.start_session_at(Utc::now())
    }

    /// Begin a session. A session already in progress is closed first.
    pub fn start_session_at(&mut self, now: DateTime<Utc>) -> Uuid {
        if self.active_session.is_some() {
            tracing::warn!("Session already active, closing it");
            self.end_session_at(now);
        }
        let id = Uuid::new_v4();
        self.active_session = Some(ActiveSession {
            id,
            started_at: now,
            reviews: 0,
            correct: 0,
        });
        tracing::info!(session_id = %id, "Session started");
        id
    }

    /// End the current session now
    pub fn end_session(&mut self) -> Option<SessionRecord> {
        self.end_session_at(Utc::now())
    }

    /// End the current session. `None` if no session is active.
    pub fn end_session_at(&mut self, now: DateTime<Utc>) -> Option<SessionRecord> {
        let active = self.active_session.take()?;
        let duration_minutes = ((now - active.started_at).num_seconds() as f64 / 60.0).max(0.0);
        let accuracy = if active.reviews == 0 {
            0.0
        } else {
            f64::from(active.correct) / f64::from(active.reviews)
        };
        let record = SessionRecord {
            id: active.id,
            started_at: active.started_at,
            ended_at: now,
            duration_minutes,
            reviews: active.reviews,
            correct: active.correct,
            accuracy,
        };

        if record.reviews > 0 {
            self.sessions.push_back(record.clone());
            while self.sessions.len() > self.config.max_sessions {
                self.sessions.pop_front();
            }
        }
        tracing::info!(
            session_id = %record.id,
            reviews = record.reviews,
            minutes = record.duration_minutes,
            "Session ended"
        );
        Some(record)
    }

    /// Mean length of the three most accurate sessions.
    ///
    /// Falls back to the configured default with fewer than three sessions.
    pub fn optimal_session_length(&self) -> f64 {
        if self.sessions.len() < TOP_SESSIONS {
            return self.config.default_session_minutes;
        }
        let mut ranked: Vec<&SessionRecord> = self.sessions.iter().collect();
        ranked.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        mean(
            ranked
                .into_iter()
                .take(TOP_SESSIONS)
                .map(|s| s.duration_minutes),
        )
        .unwrap_or(self.config.default_session_minutes)
    }

    // ========================================================================
    // SUMMARY
    // ========================================================================

    /// Every statistic in one report
    pub fn summary(&self) -> PerformanceSummary {
        let mut summary = PerformanceSummary {
            total_reviews: self.total_reviews,
            window_reviews: self.window.overall.len(),
            accuracy: self.accuracy(),
            recent_accuracy: self.recent_accuracy(),
            average_response_seconds: self
                .window
                .overall
                .recent_latency(self.config.window_size),
            accuracy_trend: self.accuracy_trend(),
            speed_trend: self.speed_trend(),
            quality_trend: self.quality_trend(),
            consistency: self.consistency(),
            learning_velocity: self.learning_velocity(),
            optimal_session_minutes: self.optimal_session_length(),
            sessions_completed: self.sessions.len(),
            content_type_mastery: self.mastery_by_content_type(),
            recommendations: Vec::new(),
        };
        summary.recommendations = recommendations(&summary);
        summary
    }
}

fn recommendations(summary: &PerformanceSummary) -> Vec<String> {
    if summary.window_reviews == 0 {
        return vec!["Complete a few reviews to unlock personal statistics.".to_string()];
    }

    let mut advice = Vec::new();
    if summary.recent_accuracy < 0.6 {
        advice.push("Recent accuracy is low. Slow down and revisit easier material.".to_string());
    } else if summary.recent_accuracy > 0.9 {
        advice.push("Recent accuracy is excellent. You are ready for harder material.".to_string());
    }
    if summary.accuracy_trend < -0.01 {
        advice.push("Accuracy is trending down. Consider a shorter session or a break.".to_string());
    }
    if summary.speed_trend > 0.05 {
        advice.push("Your responses are getting faster.".to_string());
    }
    if summary.consistency < 0.6 {
        advice.push("Scores vary widely. Regular short sessions help stabilise recall.".to_string());
    }
    if let Some((content_type, mastery)) = summary
        .content_type_mastery
        .iter()
        .min_by(|a, b| a.1.total_cmp(b.1))
    {
        if *mastery < 0.5 {
            advice.push(format!("Spend more time on {} practice.", content_type));
        }
    }
    if advice.is_empty() {
        advice.push("Steady progress. Keep the current routine.".to_string());
    }
    advice
}

// ============================================================================
// TESTS
// ============================================================================
