//! ZPD profile data model

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tracker::MIN_STABILITY;
use crate::error::{CadenceError, Result, ensure_non_negative, ensure_range};

// ============================================================================
// LEARNING ZONES
// ============================================================================

/// Where an attempted difficulty sits relative to a learner's skill level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningZone {
    /// Far above current ability
    Frustration,
    /// Upper edge of the zone of proximal development
    ZpdUpper,
    /// Sweet spot: a stretch, not a repeat
    ZpdOptimal,
    /// Lower edge of the zone
    ZpdLower,
    /// At or below current ability
    Mastery,
}

impl LearningZone {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningZone::Frustration => "frustration",
            LearningZone::ZpdUpper => "zpd_upper",
            LearningZone::ZpdOptimal => "zpd_optimal",
            LearningZone::ZpdLower => "zpd_lower",
            LearningZone::Mastery => "mastery",
        }
    }

    /// Whether the zone is inside the ZPD band
    pub fn is_productive(&self) -> bool {
        matches!(
            self,
            LearningZone::ZpdUpper | LearningZone::ZpdOptimal | LearningZone::ZpdLower
        )
    }
}

impl std::fmt::Display for LearningZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify attempted difficulty against skill level.
///
/// | gap (difficulty - level) | zone        |
/// |--------------------------|-------------|
/// | > 0.40                   | Frustration |
/// | > 0.20                   | ZpdUpper    |
/// | > 0.05                   | ZpdOptimal  |
/// | > -0.10                  | ZpdLower    |
/// | otherwise                | Mastery     |
pub fn classify_zone(difficulty: f64, skill_level: f64) -> LearningZone {
    let gap = difficulty - skill_level;
    if gap > 0.4 {
        LearningZone::Frustration
    } else if gap > 0.2 {
        LearningZone::ZpdUpper
    } else if gap > 0.05 {
        LearningZone::ZpdOptimal
    } else if gap > -0.1 {
        LearningZone::ZpdLower
    } else {
        LearningZone::Mastery
    }
}

// ============================================================================
// SKILL ASSESSMENT
// ============================================================================

/// Mastery estimate for one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAssessment {
    /// Skill id
    pub skill_name: String,
    /// Estimated mastery, [0, 1]
    pub current_level: f64,
    /// Confidence in the estimate, [0, 1]
    pub confidence: f64,
    /// Level change on the last update
    pub trend: f64,
    /// How steady recent progress has been, [0.1, 1]
    pub stability: f64,
    /// Total practice time, rounded to minutes
    pub practice_minutes: u32,
    /// Total practice time in seconds
    #[serde(default)]
    pub practice_seconds: f64,
    /// Recent level changes, oldest first
    #[serde(default)]
    pub recent_trends: VecDeque<f64>,
    /// Updates applied
    #[serde(default)]
    pub attempts: u32,
    /// Last update time
    #[serde(default)]
    pub last_practiced: Option<DateTime<Utc>>,
}

impl SkillAssessment {
    /// Fresh assessment
    pub fn new(skill_name: impl Into<String>, level: f64, confidence: f64) -> Self {
        Self {
            skill_name: skill_name.into(),
            current_level: level.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            trend: 0.0,
            stability: 1.0,
            practice_minutes: 0,
            practice_seconds: 0.0,
            recent_trends: VecDeque::new(),
            attempts: 0,
            last_practiced: None,
        }
    }

    /// Weight of this skill in the profile mean
    pub fn weight(&self) -> f64 {
        self.confidence * (1.0 + self.stability)
    }
}

// ============================================================================
// PROFILE
// ============================================================================

/// Target difficulty band, `0 <= lower <= upper <= 1`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZpdRange {
    /// Lower edge
    pub lower: f64,
    /// Upper edge
    pub upper: f64,
}

impl ZpdRange {
    /// Band centred on `center`, clamped into [0, 1]
    pub fn centered(center: f64, width: f64) -> Self {
        let lower = (center - width / 2.0).clamp(0.0, 1.0);
        let upper = (center + width / 2.0).clamp(0.0, 1.0);
        Self {
            lower: lower.min(upper),
            upper,
        }
    }

    /// `upper - lower`
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Whether a difficulty falls inside the band
    pub fn contains(&self, difficulty: f64) -> bool {
        (self.lower..=self.upper).contains(&difficulty)
    }
}

/// One learner's skills and difficulty target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZpdProfile {
    /// Learner id
    pub learner_id: String,
    /// Assessments keyed by skill name
    pub skills: BTreeMap<String, SkillAssessment>,
    /// Target difficulty band
    pub zpd_range: ZpdRange,
    /// Current band width before clamping to [0, 1]
    pub zpd_width: f64,
    /// Recommended difficulty, slightly above the weighted mean level
    pub optimal_difficulty: f64,
    /// Average score below which the learner is frustrated
    pub frustration_threshold: f64,
    /// Average score above which material is too easy
    pub mastery_threshold: f64,
    /// Mean recent level change per update across skills
    pub learning_velocity: f64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last recomputation
    pub updated_at: DateTime<Utc>,
}

impl ZpdProfile {
    /// Assessment for one skill
    pub fn skill(&self, name: &str) -> Option<&SkillAssessment> {
        self.skills.get(name)
    }

    /// Plain mean of skill levels
    pub fn mean_level(&self) -> Option<f64> {
        if self.skills.is_empty() {
            None
        } else {
            Some(
                self.skills.values().map(|s| s.current_level).sum::<f64>()
                    / self.skills.len() as f64,
            )
        }
    }

    /// Up to `n` lowest-level skills, weakest first
    pub fn weak_skills(&self, n: usize) -> Vec<&SkillAssessment> {
        let mut ranked: Vec<&SkillAssessment> = self.skills.values().collect();
        ranked.sort_by(|a, b| {
            a.current_level
                .total_cmp(&b.current_level)
                .then_with(|| a.skill_name.cmp(&b.skill_name))
        });
        ranked.truncate(n);
        ranked
    }

    /// Check the band ordering and every skill estimate's bounds
    pub fn validate(&self) -> Result<()> {
        let range = self.zpd_range;
        ensure_range("zpd_range.lower", range.lower, 0.0, 1.0)?;
        ensure_range("zpd_range.upper", range.upper, 0.0, 1.0)?;
        if range.lower > range.upper {
            return Err(CadenceError::InvalidInput(format!(
                "zpd_range lower ({}) exceeds upper ({})",
                range.lower, range.upper
            )));
        }
        ensure_range("zpd_width", self.zpd_width, 0.0, 1.0)?;
        ensure_range("optimal_difficulty", self.optimal_difficulty, 0.0, 1.0)?;
        ensure_range("frustration_threshold", self.frustration_threshold, 0.0, 1.0)?;
        ensure_range("mastery_threshold", self.mastery_threshold, 0.0, 1.0)?;
        if !self.learning_velocity.is_finite() {
            return Err(CadenceError::InvalidInput(format!(
                "learning_velocity must be finite, got {}",
                self.learning_velocity
            )));
        }

        for (name, skill) in &self.skills {
            if &skill.skill_name != name {
                return Err(CadenceError::InvalidInput(format!(
                    "skill keyed '{}' is named '{}'",
                    name, skill.skill_name
                )));
            }
            ensure_range("current_level", skill.current_level, 0.0, 1.0)?;
            ensure_range("confidence", skill.confidence, 0.0, 1.0)?;
            ensure_range("stability", skill.stability, MIN_STABILITY, 1.0)?;
            ensure_non_negative("practice_seconds", skill.practice_seconds)?;
            if !skill.trend.is_finite() || skill.recent_trends.iter().any(|t| !t.is_finite()) {
                return Err(CadenceError::InvalidInput(format!(
                    "skill '{}' has a non-finite trend",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Up to `n` highest-level skills, strongest first
    pub fn strong_skills(&self, n: usize) -> Vec<&SkillAssessment> {
        let mut ranked: Vec<&SkillAssessment> = self.skills.values().collect();
        ranked.sort_by(|a, b| {
            b.current_level
                .total_cmp(&a.current_level)
                .then_with(|| a.skill_name.cmp(&b.skill_name))
        });
        ranked.truncate(n);
        ranked
    }
}
