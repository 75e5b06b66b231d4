//! SM-2 Interval Engine
//!
//! Pure computation: given an item's history and a graded response, produce
//! the next ease factor, interval and due date. Nothing here touches a clock
//! or a queue; callers pass `now` in.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::quality::{MAX_QUALITY, Quality};
use crate::error::{CadenceError, Result, ensure_range};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Ease factor given to a fresh item
pub const DEFAULT_EASE: f64 = 2.5;

/// Lower ease bound
pub const MIN_EASE: f64 = 1.3;

/// Upper ease bound
pub const MAX_EASE: f64 = 4.0;

/// Interval after the first correct repetition (days)
pub const INITIAL_INTERVAL_DAYS: u32 = 1;

/// Interval after the second correct repetition (days)
pub const GRADUATION_INTERVAL_DAYS: u32 = 4;

/// Longest interval the engine will ever schedule (days)
pub const MAX_INTERVAL_DAYS: u32 = 365;

/// Consecutive correct answers before the streak bonus kicks in
pub const STREAK_BONUS_THRESHOLD: u32 = 5;

/// Streak bonus ceiling
pub const MAX_STREAK_BONUS: f64 = 2.0;

/// Success rate below which intervals are shortened
pub const DIFFICULTY_SUCCESS_THRESHOLD: f64 = 0.6;

/// Difficulty penalty floor
pub const MIN_DIFFICULTY_PENALTY: f64 = 0.5;

/// Success rate required for graduation
pub const GRADUATION_SUCCESS_RATE: f64 = 0.7;

/// Bounds of the per-item learning velocity multiplier
pub const MIN_ITEM_VELOCITY: f64 = 0.5;
/// Upper bound of the per-item learning velocity multiplier
pub const MAX_ITEM_VELOCITY: f64 = 1.5;

/// Decay constant of the retention forecast (scaled by 1/ease)
const RETENTION_DECAY: f64 = 0.1;

const SECONDS_PER_DAY: f64 = 86_400.0;

// ============================================================================
// PARAMETERS
// ============================================================================

/// Tunable interval parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntervalParams {
    /// Interval after the first correct repetition, and after any failure
    pub initial_interval: u32,
    /// Interval after the second correct repetition
    pub graduation_interval: u32,
    /// Interval ceiling
    pub max_interval: u32,
    /// Ease given to new items
    pub default_ease: f64,
    /// Ease floor
    pub min_ease: f64,
    /// Ease ceiling
    pub max_ease: f64,
}

impl Default for IntervalParams {
    fn default() -> Self {
        Self {
            initial_interval: INITIAL_INTERVAL_DAYS,
            graduation_interval: GRADUATION_INTERVAL_DAYS,
            max_interval: MAX_INTERVAL_DAYS,
            default_ease: DEFAULT_EASE,
            min_ease: MIN_EASE,
            max_ease: MAX_EASE,
        }
    }
}

impl IntervalParams {
    /// Check parameter consistency
    pub fn validate(&self) -> Result<()> {
        if self.initial_interval == 0 || self.graduation_interval == 0 {
            return Err(CadenceError::Configuration(
                "intervals must be at least one day".to_string(),
            ));
        }
        if self.initial_interval > self.max_interval || self.graduation_interval > self.max_interval
        {
            return Err(CadenceError::Configuration(format!(
                "max_interval ({}) is below the learning intervals",
                self.max_interval
            )));
        }
        if !(self.min_ease > 0.0 && self.min_ease <= self.max_ease) {
            return Err(CadenceError::Configuration(format!(
                "ease bounds inverted or non-positive: [{}, {}]",
                self.min_ease, self.max_ease
            )));
        }
        if !(self.min_ease..=self.max_ease).contains(&self.default_ease) {
            return Err(CadenceError::Configuration(format!(
                "default ease {} outside [{}, {}]",
                self.default_ease, self.min_ease, self.max_ease
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ITEM STATE
// ============================================================================

/// Scheduling state of one reviewable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    /// Interval growth multiplier, always within the ease bounds
    pub ease_factor: f64,
    /// Correct repetitions since the last failure
    pub repetitions: u32,
    /// Current interval in days (>= 1)
    pub interval_days: u32,
    /// When the item was last graded
    pub last_reviewed: Option<DateTime<Utc>>,
    /// When the item is next due
    pub next_due: Option<DateTime<Utc>>,
    /// Current correct streak
    pub consecutive_correct: u32,
    /// Lifetime reviews
    pub total_reviews: u32,
    /// Lifetime correct reviews (never exceeds `total_reviews`)
    pub total_correct: u32,
    /// Interval multiplier for long streaks, [1.0, 2.0]
    pub streak_bonus: f64,
    /// Interval multiplier for items with a poor success rate, [0.5, 1.0]
    pub difficulty_penalty: f64,
    /// How quickly this item is being learned, [0.5, 1.5]
    pub learning_velocity: f64,
    /// Whether the item has graduated into long-term review
    pub graduated: bool,
}

impl Default for ItemState {
    fn default() -> Self {
        Self::with_ease(DEFAULT_EASE)
    }
}

impl ItemState {
    /// Fresh state with a specific starting ease
    pub fn with_ease(ease_factor: f64) -> Self {
        Self {
            ease_factor,
            repetitions: 0,
            interval_days: INITIAL_INTERVAL_DAYS,
            last_reviewed: None,
            next_due: None,
            consecutive_correct: 0,
            total_reviews: 0,
            total_correct: 0,
            streak_bonus: 1.0,
            difficulty_penalty: 1.0,
            learning_velocity: 1.0,
            graduated: false,
        }
    }

    /// Lifetime success rate (0.0 when never reviewed)
    pub fn success_rate(&self) -> f64 {
        if self.total_reviews == 0 {
            0.0
        } else {
            f64::from(self.total_correct) / f64::from(self.total_reviews)
        }
    }

    /// Whether the item has never been graded
    pub fn is_new(&self) -> bool {
        self.total_reviews == 0
    }

    /// Graduation predicate
    pub fn meets_graduation(&self) -> bool {
        self.consecutive_correct >= 2
            && self.repetitions >= 2
            && self.success_rate() >= GRADUATION_SUCCESS_RATE
    }

    /// Check the bounds the engine maintains, for state arriving from outside
    pub fn validate(&self, params: &IntervalParams) -> Result<()> {
        ensure_range("ease_factor", self.ease_factor, params.min_ease, params.max_ease)?;
        if self.interval_days == 0 || self.interval_days > params.max_interval {
            return Err(CadenceError::InvalidInput(format!(
                "interval_days must be within [1, {}], got {}",
                params.max_interval, self.interval_days
            )));
        }
        if self.total_correct > self.total_reviews {
            return Err(CadenceError::InvalidInput(format!(
                "total_correct ({}) exceeds total_reviews ({})",
                self.total_correct, self.total_reviews
            )));
        }
        if self.consecutive_correct > self.total_correct {
            return Err(CadenceError::InvalidInput(format!(
                "consecutive_correct ({}) exceeds total_correct ({})",
                self.consecutive_correct, self.total_correct
            )));
        }
        ensure_range("streak_bonus", self.streak_bonus, 1.0, MAX_STREAK_BONUS)?;
        ensure_range(
            "difficulty_penalty",
            self.difficulty_penalty,
            MIN_DIFFICULTY_PENALTY,
            1.0,
        )?;
        ensure_range(
            "learning_velocity",
            self.learning_velocity,
            MIN_ITEM_VELOCITY,
            MAX_ITEM_VELOCITY,
        )?;
        Ok(())
    }
}

// ============================================================================
// PURE FORMULAS
// ============================================================================

/// SM-2 ease update, clamped to `[min_ease, max_ease]`.
pub fn next_ease(ease: f64, quality: Quality, min_ease: f64, max_ease: f64) -> f64 {
    let miss = f64::from(MAX_QUALITY) - quality.as_f64();
    let delta = 0.1 - miss * (0.08 + miss * 0.02);
    (ease + delta).clamp(min_ease, max_ease)
}

/// Interval bonus for a streak of at least five correct answers.
pub fn streak_bonus(consecutive_correct: u32) -> f64 {
    if consecutive_correct >= STREAK_BONUS_THRESHOLD {
        let extra = f64::from(consecutive_correct - (STREAK_BONUS_THRESHOLD - 1)) * 0.1;
        (1.0 + extra).min(MAX_STREAK_BONUS)
    } else {
        1.0
    }
}

/// Interval penalty for items answered correctly less than 60% of the time.
pub fn difficulty_penalty(success_rate: f64) -> f64 {
    if success_rate < DIFFICULTY_SUCCESS_THRESHOLD {
        (1.0 - (DIFFICULTY_SUCCESS_THRESHOLD - success_rate) * 0.15).max(MIN_DIFFICULTY_PENALTY)
    } else {
        1.0
    }
}

/// Per-item velocity: success rate scaled by how far ease has moved from the default.
pub fn item_learning_velocity(success_rate: f64, ease: f64) -> f64 {
    (success_rate * ease / DEFAULT_EASE).clamp(MIN_ITEM_VELOCITY, MAX_ITEM_VELOCITY)
}

// ============================================================================
// ENGINE
// ============================================================================

/// Result of applying one graded review
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceOutcome {
    /// Updated state
    pub state: ItemState,
    /// When the item is next due
    pub next_due: DateTime<Utc>,
    /// Whether the quality counted as correct
    pub was_correct: bool,
    /// True only on the review that crossed the graduation predicate
    pub graduated_now: bool,
}

/// What a given grade would do, without applying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalPreview {
    /// The hypothetical grade
    pub quality: Quality,
    /// Resulting interval
    pub interval_days: u32,
    /// Resulting ease
    pub ease_factor: f64,
    /// Resulting due date
    pub next_due: DateTime<Utc>,
    /// Whether the item would be graduated afterwards
    pub graduated: bool,
}

/// SM-2 engine with streak and difficulty multipliers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalEngine {
    params: IntervalParams,
}

impl IntervalEngine {
    /// Create an engine, validating parameters
    pub fn new(params: IntervalParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Current parameters
    pub fn params(&self) -> &IntervalParams {
        &self.params
    }

    /// State for an item seen for the first time
    pub fn new_state(&self) -> ItemState {
        ItemState::with_ease(self.params.default_ease)
    }

    /// Apply a graded review.
    ///
    /// A failing grade (< 3) restarts the learning phase: repetitions and the
    /// streak go to zero and the interval drops to `initial_interval`.
    /// `global_performance_factor` only scales intervals of correct answers.
    pub fn advance(
        &self,
        state: &ItemState,
        quality: Quality,
        global_performance_factor: f64,
        now: DateTime<Utc>,
    ) -> AdvanceOutcome {
        let p = &self.params;
        let mut next = state.clone();
        let was_graduated = state.graduated;
        let correct = quality.is_correct();

        next.total_reviews = next.total_reviews.saturating_add(1);
        if correct {
            next.total_correct = next.total_correct.saturating_add(1);
            next.consecutive_correct = next.consecutive_correct.saturating_add(1);
            next.repetitions = next.repetitions.saturating_add(1);
        } else {
            next.consecutive_correct = 0;
            next.repetitions = 0;
        }
        next.total_correct = next.total_correct.min(next.total_reviews);

        next.ease_factor = next_ease(state.ease_factor, quality, p.min_ease, p.max_ease);

        let success_rate = next.success_rate();
        next.streak_bonus = streak_bonus(next.consecutive_correct);
        next.difficulty_penalty = difficulty_penalty(success_rate);
        next.learning_velocity = item_learning_velocity(success_rate, next.ease_factor);

        next.interval_days = if correct {
            let base = match next.repetitions {
                1 => f64::from(p.initial_interval),
                2 => f64::from(p.graduation_interval),
                _ => (f64::from(state.interval_days) * next.ease_factor).ceil(),
            };
            let factor = if global_performance_factor.is_finite() && global_performance_factor > 0.0
            {
                global_performance_factor
            } else {
                1.0
            };
            let scaled = (base * next.streak_bonus * next.difficulty_penalty * factor).round();
            scaled.clamp(1.0, f64::from(p.max_interval)) as u32
        } else {
            p.initial_interval
        };

        let next_due = now + Duration::days(i64::from(next.interval_days));
        next.last_reviewed = Some(now);
        next.next_due = Some(next_due);
        next.graduated = next.meets_graduation();

        let graduated_now = next.graduated && !was_graduated;

        tracing::debug!(
            quality = quality.value(),
            ease = next.ease_factor,
            interval = next.interval_days,
            repetitions = next.repetitions,
            "Advanced item state"
        );

        AdvanceOutcome {
            state: next,
            next_due,
            was_correct: correct,
            graduated_now,
        }
    }

    /// Probability of recall `horizon_days` from now, in [0, 1].
    ///
    /// Read-only: `exp(-(0.1/ease) * (days_since_review + horizon)) * (0.5 + 0.5 * success_rate)`.
    pub fn retention(&self, state: &ItemState, now: DateTime<Utc>, horizon_days: f64) -> f64 {
        let elapsed = state
            .last_reviewed
            .map(|t| ((now - t).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0))
            .unwrap_or(0.0);
        let horizon = if horizon_days.is_finite() {
            horizon_days.max(0.0)
        } else {
            0.0
        };
        let ease = state.ease_factor.max(self.params.min_ease);

        let decay = (-(RETENTION_DECAY / ease) * (elapsed + horizon)).exp();
        (decay * (0.5 + 0.5 * state.success_rate())).clamp(0.0, 1.0)
    }

    /// Outcome of every possible grade, lowest first
    pub fn preview(
        &self,
        state: &ItemState,
        global_performance_factor: f64,
        now: DateTime<Utc>,
    ) -> Vec<IntervalPreview> {
        Quality::all()
            .into_iter()
            .map(|quality| {
                let outcome = self.advance(state, quality, global_performance_factor, now);
                IntervalPreview {
                    quality,
                    interval_days: outcome.state.interval_days,
                    ease_factor: outcome.state.ease_factor,
                    next_due: outcome.next_due,
                    graduated: outcome.state.graduated,
                }
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
