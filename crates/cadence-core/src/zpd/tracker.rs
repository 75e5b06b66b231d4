//! ZPD Tracker
//!
//! Keeps per-skill mastery estimates and derives the difficulty band in which
//! a learner should be working. The tracker itself is stateless; profiles are
//! owned by the caller and passed in by reference.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::{LearningZone, SkillAssessment, ZpdProfile, ZpdRange, classify_zone};
use crate::error::{CadenceError, Result, ensure_non_negative, ensure_range};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Level given to skills with no history
pub const DEFAULT_SKILL_LEVEL: f64 = 0.3;

/// Confidence given to skills with no history
pub const DEFAULT_SKILL_CONFIDENCE: f64 = 0.5;

/// Default band width
pub const DEFAULT_ZPD_WIDTH: f64 = 0.3;

/// Narrowest band
pub const MIN_ZPD_WIDTH: f64 = 0.15;

/// Widest band
pub const MAX_ZPD_WIDTH: f64 = 0.5;

/// EMA rate for level and confidence
pub const DEFAULT_SKILL_LEARNING_RATE: f64 = 0.2;

/// Default frustration threshold
pub const DEFAULT_FRUSTRATION_THRESHOLD: f64 = 0.4;

/// Default mastery threshold
pub const DEFAULT_MASTERY_THRESHOLD: f64 = 0.85;

/// Level changes kept per skill for the stability estimate
pub const TREND_HISTORY: usize = 10;

/// Stability floor
pub const MIN_STABILITY: f64 = 0.1;

/// Largest difficulty nudge from `challenge_adjustment`
pub const MAX_CHALLENGE_ADJUSTMENT: f64 = 0.3;

/// Success rate the in-zone correction aims for
const TARGET_SUCCESS_RATE: f64 = 0.7;

// ============================================================================
// CONFIG
// ============================================================================

/// ZPD tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZpdConfig {
    /// Level of unseen skills
    pub initial_level: f64,
    /// Confidence of unseen skills
    pub initial_confidence: f64,
    /// Band width before the variance adjustment
    pub initial_width: f64,
    /// Narrowest band
    pub min_width: f64,
    /// Widest band
    pub max_width: f64,
    /// EMA rate for level and confidence
    pub learning_rate: f64,
    /// Average score below which the learner is frustrated
    pub frustration_threshold: f64,
    /// Average score above which material is too easy
    pub mastery_threshold: f64,
}

impl Default for ZpdConfig {
    fn default() -> Self {
        Self {
            initial_level: DEFAULT_SKILL_LEVEL,
            initial_confidence: DEFAULT_SKILL_CONFIDENCE,
            initial_width: DEFAULT_ZPD_WIDTH,
            min_width: MIN_ZPD_WIDTH,
            max_width: MAX_ZPD_WIDTH,
            learning_rate: DEFAULT_SKILL_LEARNING_RATE,
            frustration_threshold: DEFAULT_FRUSTRATION_THRESHOLD,
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
        }
    }
}

impl ZpdConfig {
    /// Check configuration consistency
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            ensure_range(name, v, 0.0, 1.0).map_err(|e| CadenceError::Configuration(e.to_string()))
        };
        unit("initial_level", self.initial_level)?;
        unit("initial_confidence", self.initial_confidence)?;
        unit("frustration_threshold", self.frustration_threshold)?;
        unit("mastery_threshold", self.mastery_threshold)?;

        if !(self.min_width > 0.0
            && self.min_width <= self.initial_width
            && self.initial_width <= self.max_width
            && self.max_width <= 1.0)
        {
            return Err(CadenceError::Configuration(format!(
                "ZPD widths must satisfy 0 < min ({}) <= initial ({}) <= max ({}) <= 1",
                self.min_width, self.initial_width, self.max_width
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(CadenceError::Configuration(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.frustration_threshold >= self.mastery_threshold {
            return Err(CadenceError::Configuration(format!(
                "frustration threshold ({}) must be below mastery threshold ({})",
                self.frustration_threshold, self.mastery_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// INPUTS & OUTPUTS
// ============================================================================

/// One observation of a learner practicing a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillObservation {
    /// Skill practiced
    pub skill: String,
    /// Score on the attempt, [0, 1]
    pub performance: f64,
    /// Learner's own confidence, [0, 1]
    pub confidence: f64,
    /// Time spent in seconds
    pub response_time_seconds: f64,
    /// Difficulty of the material attempted, [0, 1]
    pub difficulty: f64,
}

impl SkillObservation {
    /// Boundary validation
    pub fn validate(&self) -> Result<()> {
        if self.skill.trim().is_empty() {
            return Err(CadenceError::InvalidInput(
                "skill name must not be empty".to_string(),
            ));
        }
        ensure_range("performance", self.performance, 0.0, 1.0)?;
        ensure_range("confidence", self.confidence, 0.0, 1.0)?;
        ensure_range("difficulty", self.difficulty, 0.0, 1.0)?;
        ensure_non_negative("response_time_seconds", self.response_time_seconds)
    }
}

/// Suggested difficulty for the next item practicing a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyRecommendation {
    /// Skill
    pub skill: String,
    /// Suggested difficulty, [0.1, 0.9]
    pub difficulty: f64,
    /// Zone the suggestion falls in for the current level
    pub zone: LearningZone,
    /// Current level of the skill
    pub skill_level: f64,
    /// Profile band
    pub zpd_range: ZpdRange,
}

// ============================================================================
// TRACKER
// ============================================================================

/// Stateless ZPD computations over caller-owned profiles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZpdTracker {
    config: ZpdConfig,
}

impl ZpdTracker {
    /// Create a tracker, validating the configuration
    pub fn new(config: ZpdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration
    pub fn config(&self) -> &ZpdConfig {
        &self.config
    }

    /// Empty profile with the default band
    pub fn empty_profile(&self, learner_id: &str, now: DateTime<Utc>) -> ZpdProfile {
        let mut profile = ZpdProfile {
            learner_id: learner_id.to_string(),
            skills: BTreeMap::new(),
            zpd_range: ZpdRange::centered(self.config.initial_level, self.config.initial_width),
            zpd_width: self.config.initial_width,
            optimal_difficulty: self.config.initial_level,
            frustration_threshold: self.config.frustration_threshold,
            mastery_threshold: self.config.mastery_threshold,
            learning_velocity: 0.0,
            created_at: now,
            updated_at: now,
        };
        self.recalculate_zpd_at(&mut profile, now);
        profile
    }

    /// Seed a profile with every catalog skill.
    ///
    /// Skills in `initial_levels` start at the given level; everything else
    /// starts at the configured default. Levels outside [0, 1] are rejected.
    pub fn initialize<I, S>(
        &self,
        learner_id: &str,
        skills: I,
        initial_levels: Option<&BTreeMap<String, f64>>,
        now: DateTime<Utc>,
    ) -> Result<ZpdProfile>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(levels) = initial_levels {
            for (skill, level) in levels {
                ensure_range(&format!("initial level of '{}'", skill), *level, 0.0, 1.0)?;
            }
        }

        let mut profile = self.empty_profile(learner_id, now);
        let seeded = skills
            .into_iter()
            .map(Into::into)
            .chain(initial_levels.into_iter().flat_map(|l| l.keys().cloned()));
        for skill in seeded {
            if skill.trim().is_empty() || profile.skills.contains_key(&skill) {
                continue;
            }
            let level = initial_levels
                .and_then(|l| l.get(&skill).copied())
                .unwrap_or(self.config.initial_level);
            profile.skills.insert(
                skill.clone(),
                SkillAssessment::new(skill, level, self.config.initial_confidence),
            );
        }
        self.recalculate_zpd_at(&mut profile, now);

        tracing::info!(
            learner_id,
            skills = profile.skills.len(),
            optimal = profile.optimal_difficulty,
            "Initialized ZPD profile"
        );
        Ok(profile)
    }

    /// Fold one observation into a skill and recompute the band.
    ///
    /// Unknown skills are created with default level and confidence.
    pub fn update_skill(
        &self,
        profile: &mut ZpdProfile,
        observation: &SkillObservation,
        now: DateTime<Utc>,
    ) -> Result<SkillAssessment> {
        observation.validate()?;
        let alpha = self.config.learning_rate;

        let skill = profile
            .skills
            .entry(observation.skill.clone())
            .or_insert_with(|| {
                SkillAssessment::new(
                    observation.skill.clone(),
                    self.config.initial_level,
                    self.config.initial_confidence,
                )
            });

        let adjusted = observation.performance * (0.5 + 0.5 * observation.difficulty);
        let previous = skill.current_level;
        skill.current_level = ((1.0 - alpha) * previous + alpha * adjusted).clamp(0.0, 1.0);
        skill.confidence =
            ((1.0 - alpha) * skill.confidence + alpha * observation.confidence).clamp(0.0, 1.0);
        skill.trend = skill.current_level - previous;

        skill.recent_trends.push_back(skill.trend);
        while skill.recent_trends.len() > TREND_HISTORY {
            skill.recent_trends.pop_front();
        }
        let trends: Vec<f64> = skill.recent_trends.iter().copied().collect();
        skill.stability = (1.0 - population_variance(&trends)).clamp(MIN_STABILITY, 1.0);

        skill.practice_seconds += observation.response_time_seconds;
        skill.practice_minutes = (skill.practice_seconds / 60.0).round().min(f64::from(u32::MAX)) as u32;
        skill.attempts = skill.attempts.saturating_add(1);
        skill.last_practiced = Some(now);
        let updated = skill.clone();

        self.recalculate_zpd_at(profile, now);

        tracing::debug!(
            skill = %updated.skill_name,
            level = updated.current_level,
            trend = updated.trend,
            "Updated skill"
        );
        Ok(updated)
    }

    /// Recompute the band and optimal difficulty from the skill levels
    pub fn recalculate_zpd(&self, profile: &mut ZpdProfile) {
        self.recalculate_zpd_at(profile, Utc::now());
    }

    fn recalculate_zpd_at(&self, profile: &mut ZpdProfile, now: DateTime<Utc>) {
        let levels: Vec<f64> = profile.skills.values().map(|s| s.current_level).collect();

        let total_weight: f64 = profile.skills.values().map(SkillAssessment::weight).sum();
        let weighted_mean = if total_weight > 0.0 {
            profile
                .skills
                .values()
                .map(|s| s.current_level * s.weight())
                .sum::<f64>()
                / total_weight
        } else {
            profile.mean_level().unwrap_or(self.config.initial_level)
        };

        let width = (self.config.initial_width + population_variance(&levels) * 0.5)
            .clamp(self.config.min_width, self.config.max_width);

        profile.zpd_width = width;
        profile.zpd_range = ZpdRange::centered(weighted_mean, width);
        profile.optimal_difficulty = (weighted_mean + width / 4.0).clamp(0.0, 1.0);

        let all_trends: Vec<f64> = profile
            .skills
            .values()
            .flat_map(|s| s.recent_trends.iter().copied())
            .collect();
        profile.learning_velocity = if all_trends.is_empty() {
            0.0
        } else {
            all_trends.iter().sum::<f64>() / all_trends.len() as f64
        };
        profile.updated_at = now;
    }

    /// Difficulty for the next item practicing `skill`.
    ///
    /// Starts from the profile's optimal difficulty and leans toward the
    /// skill's own level, confidence and trend. Unknown skills use defaults.
    pub fn recommend_difficulty(&self, profile: &ZpdProfile, skill: &str) -> DifficultyRecommendation {
        let (level, confidence, trend) = profile
            .skill(skill)
            .map(|s| (s.current_level, s.confidence, s.trend))
            .unwrap_or((self.config.initial_level, self.config.initial_confidence, 0.0));

        let adjustment = (level - 0.5) * 0.2 + (confidence - 0.5) * 0.1 + trend * 2.0;
        let difficulty = (profile.optimal_difficulty + adjustment).clamp(0.1, 0.9);

        DifficultyRecommendation {
            skill: skill.to_string(),
            difficulty,
            zone: classify_zone(difficulty, level),
            skill_level: level,
            zpd_range: profile.zpd_range,
        }
    }

    /// Zone of an attempted difficulty for a skill (unknown skills use the default level)
    pub fn classify(&self, profile: &ZpdProfile, skill: &str, difficulty: f64) -> LearningZone {
        let level = profile
            .skill(skill)
            .map(|s| s.current_level)
            .unwrap_or(self.config.initial_level);
        classify_zone(difficulty, level)
    }

    /// Difficulty nudge from recent `(performance, difficulty)` pairs, within ±0.3.
    ///
    /// Above the mastery threshold the nudge is positive and proportional to the
    /// overshoot; below the frustration threshold it is negative. In between it
    /// corrects toward a 0.7 success rate plus a small term for how far recent
    /// difficulty sat from 0.5. Empty input yields 0.0.
    pub fn challenge_adjustment(&self, profile: &ZpdProfile, recent: &[(f64, f64)]) -> f64 {
        if recent.is_empty() {
            return 0.0;
        }
        let n = recent.len() as f64;
        let avg_performance = recent.iter().map(|(p, _)| p.clamp(0.0, 1.0)).sum::<f64>() / n;
        let avg_difficulty = recent.iter().map(|(_, d)| d.clamp(0.0, 1.0)).sum::<f64>() / n;

        let adjustment = if avg_performance > profile.mastery_threshold {
            (avg_performance - profile.mastery_threshold) * 2.0
        } else if avg_performance < profile.frustration_threshold {
            -(profile.frustration_threshold - avg_performance) * 2.0
        } else {
            (avg_performance - TARGET_SUCCESS_RATE) * 0.5 + (0.5 - avg_difficulty) * 0.1
        };
        adjustment.clamp(-MAX_CHALLENGE_ADJUSTMENT, MAX_CHALLENGE_ADJUSTMENT)
    }
}

fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

// ============================================================================
// TESTS
// ============================================================================
