//! Content Item - a catalog record supplied by the lesson store
//!
//! The core never creates content; it only reads these records and keeps a
//! running engagement average on each.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, Result, ensure_range};

// ============================================================================
// CONTENT TYPES
// ============================================================================

/// Kind of practice material
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Word or phrase drill
    Vocabulary,
    /// Grammar rule practice
    Grammar,
    /// Reading comprehension
    Reading,
    /// Listening comprehension
    Listening,
    /// Spoken production
    Speaking,
    /// Written production
    Writing,
    /// Free-standing exercise
    #[default]
    Exercise,
    /// Graded quiz
    Quiz,
    /// Full lesson
    Lesson,
}

impl ContentType {
    /// Every content type, in declaration order
    pub const ALL: [ContentType; 9] = [
        ContentType::Vocabulary,
        ContentType::Grammar,
        ContentType::Reading,
        ContentType::Listening,
        ContentType::Speaking,
        ContentType::Writing,
        ContentType::Exercise,
        ContentType::Quiz,
        ContentType::Lesson,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Vocabulary => "vocabulary",
            ContentType::Grammar => "grammar",
            ContentType::Reading => "reading",
            ContentType::Listening => "listening",
            ContentType::Speaking => "speaking",
            ContentType::Writing => "writing",
            ContentType::Exercise => "exercise",
            ContentType::Quiz => "quiz",
            ContentType::Lesson => "lesson",
        }
    }
}

impl FromStr for ContentType {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str() == lower)
            .ok_or_else(|| CadenceError::InvalidInput(format!("unknown content type '{}'", s)))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CONTENT ITEM
// ============================================================================

/// Engagement given to content nobody has interacted with yet
pub const DEFAULT_ENGAGEMENT: f64 = 0.5;

/// A catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Content id
    pub id: String,
    /// Kind of material
    pub content_type: ContentType,
    /// Difficulty in [0, 1]
    pub difficulty: f64,
    /// Skills practiced by this item
    #[serde(default)]
    pub skills: BTreeSet<String>,
    /// Content that must be completed first
    #[serde(default)]
    pub prerequisites: BTreeSet<String>,
    /// Expected time to complete
    #[serde(default = "default_minutes")]
    pub estimated_minutes: u32,
    /// Running average of learner engagement, [0, 1]
    #[serde(default = "default_engagement")]
    pub engagement_score: f64,
}

fn default_minutes() -> u32 {
    5
}

fn default_engagement() -> f64 {
    DEFAULT_ENGAGEMENT
}

impl ContentItem {
    /// Create an item with no skills or prerequisites
    pub fn new(id: impl Into<String>, content_type: ContentType, difficulty: f64) -> Result<Self> {
        let item = Self {
            id: id.into(),
            content_type,
            difficulty,
            skills: BTreeSet::new(),
            prerequisites: BTreeSet::new(),
            estimated_minutes: default_minutes(),
            engagement_score: DEFAULT_ENGAGEMENT,
        };
        item.validate()?;
        Ok(item)
    }

    /// Set the practiced skills
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Set the prerequisites
    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    /// Set the estimated duration
    pub fn with_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    /// Set the starting engagement
    pub fn with_engagement(mut self, engagement: f64) -> Self {
        self.engagement_score = engagement;
        self
    }

    /// Boundary validation for records coming from the content store
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CadenceError::InvalidInput(
                "content id must not be empty".to_string(),
            ));
        }
        ensure_range("difficulty", self.difficulty, 0.0, 1.0)?;
        ensure_range("engagement_score", self.engagement_score, 0.0, 1.0)?;
        if self.prerequisites.contains(&self.id) {
            return Err(CadenceError::InvalidInput(format!(
                "content '{}' lists itself as a prerequisite",
                self.id
            )));
        }
        Ok(())
    }

    /// Fold one engagement observation into the running average.
    pub fn apply_engagement(&mut self, observed: f64, alpha: f64) -> f64 {
        let observed = observed.clamp(0.0, 1.0);
        self.engagement_score =
            ((1.0 - alpha) * self.engagement_score + alpha * observed).clamp(0.0, 1.0);
        self.engagement_score
    }
}
