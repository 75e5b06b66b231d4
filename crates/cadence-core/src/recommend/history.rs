//! Per-learner interaction history

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::RingBuffer;
use crate::catalog::ContentType;
use crate::error::{CadenceError, Result, ensure_non_negative, ensure_range};

/// What the learner did with a piece of content
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    /// Finished the item
    Completed,
    /// Passed over the item
    Skipped,
    /// Opened the item without finishing
    Started,
}

impl InteractionType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Completed => "completed",
            InteractionType::Skipped => "skipped",
            InteractionType::Started => "started",
        }
    }
}

impl std::str::FromStr for InteractionType {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "completed" => Ok(InteractionType::Completed),
            "skipped" => Ok(InteractionType::Skipped),
            "started" => Ok(InteractionType::Started),
            other => Err(CadenceError::InvalidInput(format!(
                "unknown interaction type '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An interaction reported by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    /// Learner id
    pub learner_id: String,
    /// Content id
    pub content_id: String,
    /// What happened
    pub interaction_type: InteractionType,
    /// Score, [0, 1]
    pub performance: f64,
    /// Time spent
    pub time_spent_minutes: f64,
    /// Self-reported engagement, [0, 1]
    #[serde(default)]
    pub engagement: Option<f64>,
    /// Content type, filled from the catalog when absent
    #[serde(default)]
    pub content_type: Option<ContentType>,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    /// Boundary validation
    pub fn validate(&self) -> Result<()> {
        if self.content_id.trim().is_empty() {
            return Err(CadenceError::InvalidInput(
                "content id must not be empty".to_string(),
            ));
        }
        ensure_range("performance", self.performance, 0.0, 1.0)?;
        ensure_non_negative("time_spent_minutes", self.time_spent_minutes)?;
        if let Some(engagement) = self.engagement {
            ensure_range("engagement", engagement, 0.0, 1.0)?;
        }
        Ok(())
    }

    /// Engagement observation for the item's running average
    pub fn observed_engagement(&self) -> f64 {
        self.engagement.unwrap_or(match self.interaction_type {
            InteractionType::Completed => 0.5 + 0.5 * self.performance,
            InteractionType::Started => 0.4,
            InteractionType::Skipped => 0.2,
        })
    }
}

/// Latest exposure to one content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exposure {
    /// When the learner last interacted
    pub at: DateTime<Utc>,
    /// Score on that interaction
    pub performance: f64,
    /// Kind of interaction
    pub interaction_type: InteractionType,
}

/// Interactions of one learner.
///
/// Only the newest events are kept in full. The latest exposure and latest
/// completion are kept per content id for the learner's lifetime, so they
/// grow with the number of distinct items touched (at most the catalog size)
/// rather than with the number of events. Prerequisite checks need every
/// completion ever made, so neither map is pruned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionHistory {
    recent: RingBuffer<InteractionEvent>,
    last_exposure: BTreeMap<String, Exposure>,
    completed: BTreeMap<String, DateTime<Utc>>,
}

impl Default for InteractionHistory {
    fn default() -> Self {
        Self::new(500)
    }
}

impl InteractionHistory {
    /// Empty history keeping the newest `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: RingBuffer::new(capacity),
            last_exposure: BTreeMap::new(),
            completed: BTreeMap::new(),
        }
    }

    /// Append a validated event
    pub fn record(&mut self, event: InteractionEvent) -> Result<()> {
        event.validate()?;

        let newer = self
            .last_exposure
            .get(&event.content_id)
            .is_none_or(|seen| seen.at <= event.timestamp);
        if newer {
            self.last_exposure.insert(
                event.content_id.clone(),
                Exposure {
                    at: event.timestamp,
                    performance: event.performance,
                    interaction_type: event.interaction_type,
                },
            );
        }
        if event.interaction_type == InteractionType::Completed {
            let latest = self
                .completed
                .entry(event.content_id.clone())
                .or_insert(event.timestamp);
            if *latest < event.timestamp {
                *latest = event.timestamp;
            }
        }
        self.recent.push(event);
        Ok(())
    }

    /// Recent events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &InteractionEvent> {
        self.recent.iter()
    }

    /// Number of recent events held
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty() && self.last_exposure.is_empty()
    }

    /// Distinct content ids the learner has interacted with
    pub fn tracked_items(&self) -> usize {
        self.last_exposure.len()
    }

    /// Check every kept event and exposure
    pub fn validate(&self) -> Result<()> {
        for event in self.recent.iter() {
            event.validate()?;
        }
        for (content_id, exposure) in &self.last_exposure {
            ensure_range("performance", exposure.performance, 0.0, 1.0).map_err(|e| {
                CadenceError::InvalidInput(format!("exposure of '{}': {}", content_id, e))
            })?;
        }
        Ok(())
    }

    /// Latest exposure to an item
    pub fn last_exposure(&self, content_id: &str) -> Option<&Exposure> {
        self.last_exposure.get(content_id)
    }

    /// Whether the item was ever completed
    pub fn has_completed(&self, content_id: &str) -> bool {
        self.completed.contains_key(content_id)
    }

    /// Whether the item was completed within `window_days` of `now`
    pub fn completed_within(&self, content_id: &str, now: DateTime<Utc>, window_days: f64) -> bool {
        self.completed
            .get(content_id)
            .is_some_and(|at| now - *at < days(window_days))
    }

    /// Events per content type since `now - window_days`
    pub fn type_counts_since(
        &self,
        now: DateTime<Utc>,
        window_days: f64,
    ) -> BTreeMap<ContentType, usize> {
        let since = now - days(window_days);
        let mut counts = BTreeMap::new();
        for event in self.recent.iter().filter(|e| e.timestamp >= since) {
            if let Some(content_type) = event.content_type {
                *counts.entry(content_type).or_insert(0) += 1;
            }
        }
        counts
    }
}

fn days(value: f64) -> Duration {
    Duration::seconds((value * 86_400.0).round() as i64)
}
