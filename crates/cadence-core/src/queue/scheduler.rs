//! Due-Queue Scheduler
//!
//! Owns every item's scheduling state for one learner and keeps exactly one
//! live queue entry per item id. The entry map is the index; polling builds a
//! binary heap from freshly computed priorities because priority depends on
//! the current time.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{DueReview, ReviewEvent, ReviewQueueEntry, ReviewType};
use crate::catalog::ContentType;
use crate::error::{CadenceError, Result};
use crate::interval::{IntervalEngine, IntervalPreview, ItemState, Quality};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default daily review cap (advisory)
pub const DEFAULT_MAX_DAILY_REVIEWS: u32 = 100;

/// Smoothing of the global performance factor
pub const DEFAULT_PERFORMANCE_ALPHA: f64 = 0.1;

/// Global performance factor bounds
pub const MIN_PERFORMANCE_FACTOR: f64 = 0.5;
/// Upper bound of the global performance factor
pub const MAX_PERFORMANCE_FACTOR: f64 = 2.0;

/// Priority multiplier for graduated (archived) entries
pub const DEFAULT_ARCHIVED_PRIORITY_FACTOR: f64 = 0.5;

/// Priority given to items that have never been scheduled
pub const NEW_ITEM_PRIORITY: f64 = 1.0;

/// Share of the analyzer's learning velocity deviation applied to intervals
pub const DEFAULT_VELOCITY_WEIGHT: f64 = 0.25;

/// Learning velocity that leaves intervals unchanged
pub const NEUTRAL_VELOCITY: f64 = 1.0;

// ============================================================================
// CONFIG
// ============================================================================

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerConfig {
    /// Reviews per UTC day before `poll_due` stops surfacing items
    pub max_daily_reviews: u32,
    /// EMA smoothing for the global performance factor
    pub performance_alpha: f64,
    /// Lower clamp of the global performance factor
    pub min_performance_factor: f64,
    /// Upper clamp of the global performance factor
    pub max_performance_factor: f64,
    /// Priority multiplier applied to graduated entries
    pub archived_priority_factor: f64,
    /// How strongly learning velocity from review statistics scales intervals, [0, 1]
    pub velocity_weight: f64,
    /// Refuse to grade items that were never enqueued
    pub strict: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_daily_reviews: DEFAULT_MAX_DAILY_REVIEWS,
            performance_alpha: DEFAULT_PERFORMANCE_ALPHA,
            min_performance_factor: MIN_PERFORMANCE_FACTOR,
            max_performance_factor: MAX_PERFORMANCE_FACTOR,
            archived_priority_factor: DEFAULT_ARCHIVED_PRIORITY_FACTOR,
            velocity_weight: DEFAULT_VELOCITY_WEIGHT,
            strict: false,
        }
    }
}

impl SchedulerConfig {
    /// Check configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_daily_reviews == 0 {
            return Err(CadenceError::Configuration(
                "max_daily_reviews must be positive".to_string(),
            ));
        }
        if !(self.performance_alpha > 0.0 && self.performance_alpha <= 1.0) {
            return Err(CadenceError::Configuration(format!(
                "performance_alpha must be in (0, 1], got {}",
                self.performance_alpha
            )));
        }
        if !(self.min_performance_factor > 0.0
            && self.min_performance_factor <= 1.0
            && self.max_performance_factor >= 1.0)
        {
            return Err(CadenceError::Configuration(format!(
                "performance factor bounds must bracket 1.0, got [{}, {}]",
                self.min_performance_factor, self.max_performance_factor
            )));
        }
        if !(self.archived_priority_factor > 0.0 && self.archived_priority_factor <= 1.0) {
            return Err(CadenceError::Configuration(format!(
                "archived_priority_factor must be in (0, 1], got {}",
                self.archived_priority_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.velocity_weight) {
            return Err(CadenceError::Configuration(format!(
                "velocity_weight must be in [0, 1], got {}",
                self.velocity_weight
            )));
        }
        Ok(())
    }
}

// ============================================================================
// PRIORITY & CLASSIFICATION
// ============================================================================

/// Time-dependent review priority.
///
/// Unscheduled items get 1.0. Items not yet due fall off linearly below 1.0
/// (0 once a day or more away). Overdue items grow with lateness (capped at
/// 2.0) and are boosted further when hard or slowly learned.
pub fn review_priority(state: &ItemState, now: DateTime<Utc>) -> f64 {
    let Some(due) = state.next_due else {
        return NEW_ITEM_PRIORITY;
    };
    let overdue_hours = (now - due).num_seconds() as f64 / 3600.0;

    if overdue_hours < 0.0 {
        (1.0 + overdue_hours / 24.0).max(0.0)
    } else {
        let base = (1.0 + overdue_hours / 24.0).min(2.0);
        base * (2.0 - state.difficulty_penalty) * (2.0 - state.learning_velocity)
    }
}

/// Lifecycle classification of an item at `now`
pub fn classify(state: &ItemState, now: DateTime<Utc>) -> ReviewType {
    if state.is_new() {
        return ReviewType::New;
    }
    if state.total_reviews == 1 || state.repetitions == 0 {
        return ReviewType::Learning;
    }
    match state.next_due {
        Some(due) if now - due > Duration::days(1) => ReviewType::Overdue,
        _ => ReviewType::Review,
    }
}

/// Multiplier applied to a review's quality score based on response latency
pub fn latency_multiplier(response_time_seconds: f64) -> f64 {
    if (5.0..=15.0).contains(&response_time_seconds) {
        1.1
    } else if response_time_seconds > 30.0 {
        0.9
    } else if response_time_seconds < 2.0 {
        0.95
    } else {
        1.0
    }
}

// ============================================================================
// HEAP ORDERING
// ============================================================================

/// Heap slot: highest priority first, then earliest due, then id
#[derive(Debug)]
struct Ranked<'a> {
    priority: f64,
    scheduled_time: DateTime<Utc>,
    entry: &'a ReviewQueueEntry,
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked<'_> {}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.scheduled_time.cmp(&self.scheduled_time))
            .then_with(|| other.entry.item_id.cmp(&self.entry.item_id))
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// What happened when an item was graded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeOutcome {
    /// Item id
    pub item_id: String,
    /// Content type of the queue entry
    pub content_type: ContentType,
    /// State after the review
    pub state: ItemState,
    /// Next due time
    pub next_due: DateTime<Utc>,
    /// Quality >= 3
    pub was_correct: bool,
    /// Crossed the graduation predicate on this review
    pub graduated_now: bool,
    /// Classification of the re-inserted entry
    pub review_type: ReviewType,
    /// Priority of the re-inserted entry
    pub priority: f64,
    /// Factor the interval engine applied to this review's interval
    pub interval_factor: f64,
    /// Global performance factor after this review
    pub global_performance_factor: f64,
    /// State was created on the fly because the item was unknown
    pub created: bool,
    /// Reviews completed today exceed the daily cap
    pub daily_cap_exceeded: bool,
}

/// Queue statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Items with scheduling state
    pub total_items: usize,
    /// Live entries (always equal to `total_items`)
    pub live_entries: usize,
    /// Entries never graded
    pub new_items: usize,
    /// Entries in the learning phase
    pub learning: usize,
    /// Entries in regular review
    pub review: usize,
    /// Entries more than a day late
    pub overdue: usize,
    /// Entries due at the time of the query
    pub due_now: usize,
    /// Graduated (archived) entries
    pub graduated: usize,
    /// Reviews graded today
    pub completed_today: u32,
    /// Daily cap
    pub max_daily_reviews: u32,
    /// Reviews left before the cap
    pub remaining_today: u32,
    /// Whether the cap has been reached
    pub cap_reached: bool,
    /// Current global performance factor
    pub global_performance_factor: f64,
    /// Mean current retention across graded items (0.0 if none)
    pub average_retention: f64,
}

/// Serializable queue contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Every item's state
    pub states: BTreeMap<String, ItemState>,
    /// Every item's live entry
    pub entries: BTreeMap<String, ReviewQueueEntry>,
    /// Global performance factor
    pub global_performance_factor: f64,
    /// Reviews counted toward the daily cap
    pub completed_today: u32,
    /// UTC day the counter belongs to
    pub counter_day: Option<NaiveDate>,
}

// ============================================================================
// DUE QUEUE
// ============================================================================

/// Priority-ordered review queue for one learner
#[derive(Debug, Clone, PartialEq)]
pub struct DueQueue {
    engine: IntervalEngine,
    config: SchedulerConfig,
    states: BTreeMap<String, ItemState>,
    entries: BTreeMap<String, ReviewQueueEntry>,
    global_performance_factor: f64,
    completed_today: u32,
    counter_day: Option<NaiveDate>,
}

impl Default for DueQueue {
    fn default() -> Self {
        Self::new(IntervalEngine::default(), SchedulerConfig::default())
    }
}

impl DueQueue {
    /// Create an empty queue
    pub fn new(engine: IntervalEngine, config: SchedulerConfig) -> Self {
        Self {
            engine,
            config,
            states: BTreeMap::new(),
            entries: BTreeMap::new(),
            global_performance_factor: 1.0,
            completed_today: 0,
            counter_day: None,
        }
    }

    /// Rebuild a queue from a snapshot, checking that entries and states agree
    pub fn restore(
        engine: IntervalEngine,
        config: SchedulerConfig,
        snapshot: QueueSnapshot,
    ) -> Result<Self> {
        for (id, entry) in &snapshot.entries {
            if &entry.item_id != id {
                return Err(CadenceError::InvalidInput(format!(
                    "queue entry keyed '{}' belongs to '{}'",
                    id, entry.item_id
                )));
            }
            if !snapshot.states.contains_key(id) {
                return Err(CadenceError::InvalidInput(format!(
                    "queue entry '{}' has no item state",
                    id
                )));
            }
        }
        if let Some(orphan) = snapshot
            .states
            .keys()
            .find(|id| !snapshot.entries.contains_key(*id))
        {
            return Err(CadenceError::InvalidInput(format!(
                "item state '{}' has no queue entry",
                orphan
            )));
        }
        let params = engine.params();
        for (id, state) in &snapshot.states {
            state.validate(params).map_err(|e| {
                CadenceError::InvalidInput(format!("item state '{}': {}", id, e))
            })?;
        }
        for (id, entry) in &snapshot.entries {
            entry.state.validate(params).map_err(|e| {
                CadenceError::InvalidInput(format!("queue entry '{}': {}", id, e))
            })?;
            if !entry.priority.is_finite() || entry.priority < 0.0 {
                return Err(CadenceError::InvalidInput(format!(
                    "queue entry '{}' has priority {}",
                    id, entry.priority
                )));
            }
        }

        let global_performance_factor = if snapshot.global_performance_factor.is_finite() {
            snapshot
                .global_performance_factor
                .clamp(config.min_performance_factor, config.max_performance_factor)
        } else {
            1.0
        };

        Ok(Self {
            engine,
            config,
            states: snapshot.states,
            entries: snapshot.entries,
            global_performance_factor,
            completed_today: snapshot.completed_today,
            counter_day: snapshot.counter_day,
        })
    }

    /// Serializable copy of the queue contents
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            states: self.states.clone(),
            entries: self.entries.clone(),
            global_performance_factor: self.global_performance_factor,
            completed_today: self.completed_today,
            counter_day: self.counter_day,
        }
    }

    /// Queue configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Interval engine used for grading
    pub fn engine(&self) -> &IntervalEngine {
        &self.engine
    }

    /// Current global performance factor
    pub fn global_performance_factor(&self) -> f64 {
        self.global_performance_factor
    }

    /// Number of tracked items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no items are tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an item is tracked
    pub fn contains(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    /// Scheduling state of an item
    pub fn state(&self, item_id: &str) -> Option<&ItemState> {
        self.states.get(item_id)
    }

    /// Live entry of an item
    pub fn entry(&self, item_id: &str) -> Option<&ReviewQueueEntry> {
        self.entries.get(item_id)
    }

    /// All live entries in id order
    pub fn entries(&self) -> impl Iterator<Item = &ReviewQueueEntry> {
        self.entries.values()
    }

    /// Priority of an item at `now`, including the archive factor
    pub fn priority_at(&self, item_id: &str, now: DateTime<Utc>) -> Option<f64> {
        self.entries
            .get(item_id)
            .map(|entry| self.entry_priority(&entry.state, entry.archived, now))
    }

    fn entry_priority(&self, state: &ItemState, archived: bool, now: DateTime<Utc>) -> f64 {
        let base = review_priority(state, now);
        if archived {
            base * self.config.archived_priority_factor
        } else {
            base
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Add a never-seen item. Returns false if the item is already tracked.
    pub fn enqueue_new(&mut self, item_id: &str, content_type: ContentType) -> bool {
        self.enqueue_new_at(item_id, content_type, Utc::now())
    }

    /// [`Self::enqueue_new`] with an explicit clock
    pub fn enqueue_new_at(
        &mut self,
        item_id: &str,
        content_type: ContentType,
        now: DateTime<Utc>,
    ) -> bool {
        if self.entries.contains_key(item_id) {
            return false;
        }
        let state = self.engine.new_state();
        self.entries.insert(
            item_id.to_string(),
            ReviewQueueEntry {
                item_id: item_id.to_string(),
                review_type: ReviewType::New,
                priority: NEW_ITEM_PRIORITY,
                scheduled_time: now,
                state: state.clone(),
                content_type,
                archived: false,
            },
        );
        self.states.insert(item_id.to_string(), state);
        tracing::debug!(item_id, %content_type, "Enqueued new item");
        true
    }

    /// Grade an item now
    pub fn grade(&mut self, event: &ReviewEvent) -> Result<GradeOutcome> {
        self.grade_at(event, Utc::now())
    }

    /// Grade an item with a neutral learning velocity
    pub fn grade_at(&mut self, event: &ReviewEvent, now: DateTime<Utc>) -> Result<GradeOutcome> {
        self.grade_with_velocity(event, NEUTRAL_VELOCITY, now)
    }

    /// Global factor scaled by the learner's learning velocity.
    ///
    /// `1 + (velocity - 1) * velocity_weight` multiplies the global factor and
    /// the product is clamped to the factor bounds. Non-finite velocity counts
    /// as neutral.
    pub fn effective_performance_factor(&self, learning_velocity: f64) -> f64 {
        let velocity = if learning_velocity.is_finite() {
            learning_velocity.max(0.0)
        } else {
            NEUTRAL_VELOCITY
        };
        let scale = 1.0 + (velocity - NEUTRAL_VELOCITY) * self.config.velocity_weight;
        (self.global_performance_factor * scale).clamp(
            self.config.min_performance_factor,
            self.config.max_performance_factor,
        )
    }

    /// Grade an item.
    ///
    /// Unknown items get default state unless the queue is strict. The old
    /// entry is always replaced, so exactly one live entry per item remains.
    /// `learning_velocity` comes from the learner's review statistics; slow or
    /// inaccurate recent reviews shorten the interval this review schedules.
    pub fn grade_with_velocity(
        &mut self,
        event: &ReviewEvent,
        learning_velocity: f64,
        now: DateTime<Utc>,
    ) -> Result<GradeOutcome> {
        event.validate()?;
        self.roll_day(now);

        let item_id = event.item_id.as_str();
        let (state, created) = match self.states.get(item_id) {
            Some(state) => (state.clone(), false),
            None if self.config.strict => {
                return Err(CadenceError::UnknownItem(item_id.to_string()));
            }
            None => {
                tracing::warn!(item_id, "Grading unknown item, creating default state");
                (self.engine.new_state(), true)
            }
        };
        let content_type = self
            .entries
            .get(item_id)
            .map(|e| e.content_type)
            .unwrap_or(event.content_type);

        let interval_factor = self.effective_performance_factor(learning_velocity);
        let outcome = self
            .engine
            .advance(&state, event.quality, interval_factor, now);
        self.update_performance_factor(event.quality, event.response_time_seconds);

        self.entries.remove(item_id);
        let archived = outcome.state.graduated;
        let priority = self.entry_priority(&outcome.state, archived, now);
        let review_type = classify(&outcome.state, now);
        self.entries.insert(
            item_id.to_string(),
            ReviewQueueEntry {
                item_id: item_id.to_string(),
                review_type,
                priority,
                scheduled_time: outcome.next_due,
                state: outcome.state.clone(),
                content_type,
                archived,
            },
        );
        self.states
            .insert(item_id.to_string(), outcome.state.clone());

        self.completed_today = self.completed_today.saturating_add(1);
        let daily_cap_exceeded = self.completed_today > self.config.max_daily_reviews;
        if daily_cap_exceeded {
            tracing::warn!(
                completed = self.completed_today,
                cap = self.config.max_daily_reviews,
                "Daily review cap exceeded"
            );
        }
        if outcome.graduated_now {
            tracing::info!(item_id, interval = outcome.state.interval_days, "Item graduated");
        }

        Ok(GradeOutcome {
            item_id: item_id.to_string(),
            content_type,
            state: outcome.state,
            next_due: outcome.next_due,
            was_correct: outcome.was_correct,
            graduated_now: outcome.graduated_now,
            review_type,
            priority,
            interval_factor,
            global_performance_factor: self.global_performance_factor,
            created,
            daily_cap_exceeded,
        })
    }

    fn update_performance_factor(&mut self, quality: Quality, response_time_seconds: f64) {
        let score = quality.normalized() * latency_multiplier(response_time_seconds);
        let target = score * 2.0;
        let alpha = self.config.performance_alpha;
        self.global_performance_factor = ((1.0 - alpha) * self.global_performance_factor
            + alpha * target)
            .clamp(
                self.config.min_performance_factor,
                self.config.max_performance_factor,
            );
    }

    fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.counter_day != Some(today) {
            self.completed_today = 0;
            self.counter_day = Some(today);
        }
    }

    fn completed_on(&self, now: DateTime<Utc>) -> u32 {
        if self.counter_day == Some(now.date_naive()) {
            self.completed_today
        } else {
            0
        }
    }

    /// Recompute time-dependent priority and classification of every entry
    pub fn refresh(&mut self, now: DateTime<Utc>) {
        let factor = self.config.archived_priority_factor;
        for entry in self.entries.values_mut() {
            let base = review_priority(&entry.state, now);
            entry.priority = if entry.archived { base * factor } else { base };
            entry.review_type = classify(&entry.state, now);
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Highest-priority due items now
    pub fn poll_due(&mut self, limit: usize, include_future: bool) -> Vec<DueReview> {
        self.poll_due_at(limit, include_future, Utc::now())
    }

    /// Up to `limit` highest-priority entries due at `now`.
    ///
    /// The daily cap limits how many are surfaced. When nothing is due and
    /// `include_future` is false, the soonest future item is returned so a
    /// non-empty queue never yields an empty batch. With `include_future`,
    /// future items fill the batch after the due ones.
    pub fn poll_due_at(
        &mut self,
        limit: usize,
        include_future: bool,
        now: DateTime<Utc>,
    ) -> Vec<DueReview> {
        self.roll_day(now);
        self.refresh(now);
        if limit == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let remaining = self
            .config
            .max_daily_reviews
            .saturating_sub(self.completed_today) as usize;
        let batch_limit = limit.min(remaining);

        let (due, future): (Vec<&ReviewQueueEntry>, Vec<&ReviewQueueEntry>) =
            self.entries.values().partition(|e| e.is_due(now));

        let mut heap: BinaryHeap<Ranked<'_>> = due.iter().map(|e| rank(e)).collect();
        let mut batch = Vec::with_capacity(batch_limit);
        while batch.len() < batch_limit {
            match heap.pop() {
                Some(slot) => batch.push(DueReview::from(slot.entry)),
                None => break,
            }
        }

        if due.is_empty() && !include_future {
            if remaining > 0 {
                if let Some(soonest) = future.iter().min_by(|a, b| {
                    a.scheduled_time
                        .cmp(&b.scheduled_time)
                        .then_with(|| b.priority.total_cmp(&a.priority))
                        .then_with(|| a.item_id.cmp(&b.item_id))
                }) {
                    batch.push(DueReview::from(*soonest));
                }
            }
        } else if include_future && batch.len() < batch_limit {
            let mut future_heap: BinaryHeap<Ranked<'_>> = future.iter().map(|e| rank(e)).collect();
            while batch.len() < batch_limit {
                match future_heap.pop() {
                    Some(slot) => batch.push(DueReview::from(slot.entry)),
                    None => break,
                }
            }
        }

        if remaining == 0 {
            tracing::debug!(cap = self.config.max_daily_reviews, "Daily cap reached, nothing surfaced");
        }
        batch
    }

    /// Queue statistics at `now`
    pub fn stats_at(&self, now: DateTime<Utc>) -> QueueStats {
        let mut stats = QueueStats {
            total_items: self.states.len(),
            live_entries: self.entries.len(),
            new_items: 0,
            learning: 0,
            review: 0,
            overdue: 0,
            due_now: 0,
            graduated: 0,
            completed_today: self.completed_on(now),
            max_daily_reviews: self.config.max_daily_reviews,
            remaining_today: 0,
            cap_reached: false,
            global_performance_factor: self.global_performance_factor,
            average_retention: 0.0,
        };

        let mut retention_sum = 0.0;
        let mut reviewed = 0usize;
        for entry in self.entries.values() {
            match classify(&entry.state, now) {
                ReviewType::New => stats.new_items += 1,
                ReviewType::Learning => stats.learning += 1,
                ReviewType::Review => stats.review += 1,
                ReviewType::Overdue => stats.overdue += 1,
            }
            if entry.is_due(now) {
                stats.due_now += 1;
            }
            if entry.archived {
                stats.graduated += 1;
            }
            if !entry.state.is_new() {
                retention_sum += self.engine.retention(&entry.state, now, 0.0);
                reviewed += 1;
            }
        }

        stats.remaining_today = self
            .config
            .max_daily_reviews
            .saturating_sub(stats.completed_today);
        stats.cap_reached = stats.remaining_today == 0;
        stats.average_retention = if reviewed > 0 {
            retention_sum / reviewed as f64
        } else {
            0.0
        };
        stats
    }

    /// Queue statistics now
    pub fn stats(&self) -> QueueStats {
        self.stats_at(Utc::now())
    }

    /// Recall probability of an item `horizon_days` after `now`
    pub fn retention_forecast(
        &self,
        item_id: &str,
        horizon_days: f64,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        self.states
            .get(item_id)
            .map(|state| self.engine.retention(state, now, horizon_days))
    }

    /// Effect of every grade on an item. Unknown items preview as new.
    pub fn preview(&self, item_id: &str, now: DateTime<Utc>) -> Vec<IntervalPreview> {
        self.preview_with_velocity(item_id, NEUTRAL_VELOCITY, now)
    }

    /// [`DueQueue::preview`] with the same velocity scaling grading applies
    pub fn preview_with_velocity(
        &self,
        item_id: &str,
        learning_velocity: f64,
        now: DateTime<Utc>,
    ) -> Vec<IntervalPreview> {
        let fresh;
        let state = match self.states.get(item_id) {
            Some(state) => state,
            None => {
                fresh = self.engine.new_state();
                &fresh
            }
        };
        self.engine
            .preview(state, self.effective_performance_factor(learning_velocity), now)
    }
}

fn rank(entry: &ReviewQueueEntry) -> Ranked<'_> {
    Ranked {
        priority: entry.priority,
        scheduled_time: entry.scheduled_time,
        entry,
    }
}

// ============================================================================
// TESTS
// ============================================================================
