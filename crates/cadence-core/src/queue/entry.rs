//! Queue entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ContentType;
use crate::error::{Result, ensure_non_negative};
use crate::interval::{ItemState, Quality};

// ============================================================================
// REVIEW TYPE
// ============================================================================

/// Where an item sits in its review lifecycle.
///
/// `New -> Learning -> Review <-> Overdue`. An item only goes back to
/// `Learning` after a failed grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    /// Never graded
    #[default]
    New,
    /// First exposure or relearning after a failure
    Learning,
    /// Regular spaced review
    Review,
    /// More than one day past due
    Overdue,
}

impl ReviewType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::New => "new",
            ReviewType::Learning => "learning",
            ReviewType::Review => "review",
            ReviewType::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for ReviewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// QUEUE ENTRY
// ============================================================================

/// The single live queue entry of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueEntry {
    /// Item id
    pub item_id: String,
    /// Lifecycle classification at the last refresh
    pub review_type: ReviewType,
    /// Priority at the last refresh (higher is sooner)
    pub priority: f64,
    /// When the item becomes due
    pub scheduled_time: DateTime<Utc>,
    /// State at the time the entry was written
    pub state: ItemState,
    /// Kind of material
    pub content_type: ContentType,
    /// Graduated into long-term review; still scheduled, but de-prioritized
    #[serde(default)]
    pub archived: bool,
}

impl ReviewQueueEntry {
    /// Whether the entry is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time <= now
    }
}

/// Compact view handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueReview {
    /// Item id
    pub item_id: String,
    /// Lifecycle classification
    pub review_type: ReviewType,
    /// Priority used for ordering
    pub priority: f64,
    /// When the item became (or becomes) due
    pub scheduled_time: DateTime<Utc>,
    /// Kind of material
    pub content_type: ContentType,
}

impl From<&ReviewQueueEntry> for DueReview {
    fn from(entry: &ReviewQueueEntry) -> Self {
        Self {
            item_id: entry.item_id.clone(),
            review_type: entry.review_type,
            priority: entry.priority,
            scheduled_time: entry.scheduled_time,
            content_type: entry.content_type,
        }
    }
}

// ============================================================================
// REVIEW EVENT
// ============================================================================

/// A graded response reported by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    /// Item id
    pub item_id: String,
    /// Grade 0-5
    pub quality: Quality,
    /// Response latency in seconds
    pub response_time_seconds: f64,
    /// Kind of material
    pub content_type: ContentType,
}

impl ReviewEvent {
    /// Build an event, validating the latency
    pub fn new(
        item_id: impl Into<String>,
        quality: Quality,
        response_time_seconds: f64,
        content_type: ContentType,
    ) -> Result<Self> {
        let event = Self {
            item_id: item_id.into(),
            quality,
            response_time_seconds,
            content_type,
        };
        event.validate()?;
        Ok(event)
    }

    /// Boundary validation
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("response_time_seconds", self.response_time_seconds)
    }
}
