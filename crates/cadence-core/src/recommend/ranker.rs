//! Recommendation ranking
//!
//! Six weighted components produce a `total_score` per candidate; urgency
//! from weaknesses or the due queue boosts it into a `priority`.
//!
//! ## Components
//! - Difficulty match: `max(0, 1 - 2|difficulty - optimal|)`
//! - Skill relevance: share of the item's skills the learner already has
//! - Weakness targeting: share of the weakest skills the item covers
//! - Spaced timing: 0.8 if never seen, else closeness to `1 + 7 * last_performance` days
//! - Variety: `max(0, 1 - 0.2 * repeats)` of the content type in the last days
//! - Engagement: the item's running engagement average

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::InteractionHistory;
use super::weights::{NEVER_SEEN_TIMING_SCORE, RecommendationWeights, RecommenderConfig};
use crate::analytics::PerformanceAnalyzer;
use crate::catalog::{ContentItem, ContentType};
use crate::error::{CadenceError, Result};
use crate::queue::DueQueue;
use crate::zpd::ZpdProfile;

/// Share of a weakness or review priority that becomes urgency
const URGENCY_SCALE: f64 = 0.5;

/// Urgency added per unit of missing content-type mastery
const MASTERY_URGENCY_SCALE: f64 = 0.25;

/// Content-type mastery below which a reason is attached
const LOW_MASTERY: f64 = 0.6;

// ============================================================================
// TYPES
// ============================================================================

/// Per-component scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    /// Closeness to optimal difficulty
    pub difficulty_match: f64,
    /// Share of item skills already tracked
    pub skill_relevance: f64,
    /// Share of weak skills covered
    pub weakness_targeting: f64,
    /// Closeness to the ideal review gap
    pub spaced_timing: f64,
    /// Content-type variety
    pub variety: f64,
    /// Running engagement
    pub engagement: f64,
}

impl ScoreComponents {
    /// Weighted sum of the components
    pub fn weighted_sum(&self, weights: &RecommendationWeights) -> f64 {
        self.difficulty_match * weights.difficulty_match
            + self.skill_relevance * weights.skill_relevance
            + self.weakness_targeting * weights.weakness_targeting
            + self.spaced_timing * weights.spaced_timing
            + self.variety * weights.variety
            + self.engagement * weights.engagement
    }
}

/// A scored candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationScore {
    /// Content id
    pub content_id: String,
    /// Content type
    pub content_type: ContentType,
    /// Weighted component sum
    pub total_score: f64,
    /// Component breakdown
    pub components: ScoreComponents,
    /// Boost from weakness or review focus
    pub urgency: f64,
    /// `total_score * (1 + urgency)`
    pub priority: f64,
    /// Expected duration
    pub estimated_minutes: u32,
    /// Human-readable reasons
    pub reasons: Vec<String>,
}

/// Filters applied before scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankOptions {
    /// Session length; items longer than the buffered budget are dropped
    pub session_minutes: Option<f64>,
    /// Only this content type
    pub content_type: Option<ContentType>,
    /// Truncate the result
    pub limit: Option<usize>,
}

/// A time-boxed selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
    /// Picks in selection order
    pub items: Vec<RecommendationScore>,
    /// Sum of estimated minutes
    pub total_minutes: u32,
    /// Buffered budget the picks fit into
    pub budget_minutes: f64,
}

/// Learner data the ranker reads
#[derive(Debug, Clone, Copy)]
pub struct RankingContext<'a> {
    /// Skills and difficulty target
    pub profile: &'a ZpdProfile,
    /// Interactions
    pub history: &'a InteractionHistory,
    /// Review statistics; content-type mastery shapes review and weakness urgency
    pub performance: Option<&'a PerformanceAnalyzer>,
    /// Evaluation time
    pub now: DateTime<Utc>,
}

impl RankingContext<'_> {
    /// Mastery of a content type from review statistics, if any were recorded
    pub fn mastery(&self, content_type: ContentType) -> Option<f64> {
        self.performance
            .and_then(|performance| performance.mastery_for(content_type))
    }
}

/// Candidate under evaluation
struct Scored<'a> {
    item: &'a ContentItem,
    components: ScoreComponents,
    urgency: f64,
    reasons: Vec<String>,
}

// ============================================================================
// RECOMMENDER
// ============================================================================

/// Multi-factor content ranker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recommender {
    config: RecommenderConfig,
}

impl Recommender {
    /// Create a recommender, validating weights and windows
    pub fn new(config: RecommenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Rank candidates by priority.
    ///
    /// Drops items of other types, items over the buffered budget, items
    /// completed within the recency window and items with unmet prerequisites.
    pub fn rank<'a>(
        &self,
        ctx: &RankingContext<'_>,
        candidates: impl IntoIterator<Item = &'a ContentItem>,
        options: &RankOptions,
    ) -> Result<Vec<RecommendationScore>> {
        let scored = self.score_all(ctx, candidates, options, true)?;
        Ok(self.finish(scored, options.limit))
    }

    /// Rank only candidates covering a weak skill, boosted by how many they cover
    pub fn recommend_for_weaknesses<'a>(
        &self,
        ctx: &RankingContext<'_>,
        candidates: impl IntoIterator<Item = &'a ContentItem>,
        options: &RankOptions,
    ) -> Result<Vec<RecommendationScore>> {
        let weak = self.weak_skills(ctx.profile);
        let mut scored = self.score_all(ctx, candidates, options, true)?;
        scored.retain(|s| s.components.weakness_targeting > 0.0);
        for candidate in &mut scored {
            candidate.urgency = candidate.components.weakness_targeting * URGENCY_SCALE;
            let covered: Vec<&str> = candidate
                .item
                .skills
                .iter()
                .filter(|skill| weak.contains(skill.as_str()))
                .map(String::as_str)
                .collect();
            candidate
                .reasons
                .insert(0, format!("Strengthens weak skills: {}", covered.join(", ")));
            apply_mastery_urgency(ctx, candidate);
        }
        Ok(self.finish(scored, options.limit))
    }

    /// Rank candidates that are due in the review queue, boosted by queue priority.
    ///
    /// Review candidates are not subject to the completion recency filter.
    pub fn recommend_reviews<'a>(
        &self,
        ctx: &RankingContext<'_>,
        candidates: impl IntoIterator<Item = &'a ContentItem>,
        queue: &DueQueue,
        options: &RankOptions,
    ) -> Result<Vec<RecommendationScore>> {
        let mut scored = self.score_all(ctx, candidates, options, false)?;
        scored.retain(|s| {
            queue
                .entry(&s.item.id)
                .is_some_and(|entry| entry.is_due(ctx.now))
        });
        for candidate in &mut scored {
            let priority = queue.priority_at(&candidate.item.id, ctx.now).unwrap_or(0.0);
            candidate.urgency = priority * URGENCY_SCALE;
            let reason = match queue.entry(&candidate.item.id) {
                Some(entry) if entry.state.is_new() => "Ready for a first review".to_string(),
                Some(entry) => {
                    let hours = (ctx.now - entry.scheduled_time).num_hours();
                    if hours >= 24 {
                        format!("Review overdue by {} days", hours / 24)
                    } else {
                        "Review due now".to_string()
                    }
                }
                None => "Review due now".to_string(),
            };
            candidate.reasons.insert(0, reason);
            apply_mastery_urgency(ctx, candidate);
        }
        Ok(self.finish(scored, options.limit))
    }

    /// Greedy time-boxed selection.
    ///
    /// Takes the highest-priority item that fits the remaining buffered budget
    /// and whose content type has fewer than `max_per_type` picks. The variety
    /// component is recomputed after every pick so repeated types sink.
    pub fn select_session<'a>(
        &self,
        ctx: &RankingContext<'_>,
        candidates: impl IntoIterator<Item = &'a ContentItem>,
        session_minutes: f64,
        content_type: Option<ContentType>,
    ) -> Result<SessionPlan> {
        if !(session_minutes.is_finite() && session_minutes > 0.0) {
            return Err(CadenceError::InvalidInput(format!(
                "session_minutes must be positive, got {}",
                session_minutes
            )));
        }
        let options = RankOptions {
            session_minutes: Some(session_minutes),
            content_type,
            limit: None,
        };
        let mut pool = self.score_all(ctx, candidates, &options, true)?;
        let budget = session_minutes * self.config.time_buffer;
        let history_counts = ctx
            .history
            .type_counts_since(ctx.now, self.config.variety_window_days);

        let mut picks: Vec<RecommendationScore> = Vec::new();
        let mut picked_by_type: BTreeMap<ContentType, usize> = BTreeMap::new();
        let mut used = 0.0;

        loop {
            let remaining = budget - used;
            for candidate in pool.iter_mut() {
                let ct = candidate.item.content_type;
                let seen = history_counts.get(&ct).copied().unwrap_or(0)
                    + picked_by_type.get(&ct).copied().unwrap_or(0);
                candidate.components.variety = variety_score(seen);
            }

            let best = pool
                .iter()
                .enumerate()
                .filter(|(_, c)| {
                    let picked = picked_by_type
                        .get(&c.item.content_type)
                        .copied()
                        .unwrap_or(0);
                    picked < self.config.max_per_type
                        && f64::from(c.item.estimated_minutes) <= remaining
                })
                .max_by(|(_, a), (_, b)| {
                    self.priority(a)
                        .total_cmp(&self.priority(b))
                        .then_with(|| b.item.id.cmp(&a.item.id))
                })
                .map(|(index, _)| index);

            let Some(index) = best else {
                break;
            };
            let chosen = pool.swap_remove(index);
            used += f64::from(chosen.item.estimated_minutes);
            *picked_by_type.entry(chosen.item.content_type).or_insert(0) += 1;
            picks.push(self.to_score(chosen));
        }

        let total_minutes: u32 = picks.iter().map(|p| p.estimated_minutes).sum();
        tracing::debug!(picks = picks.len(), total_minutes, budget, "Selected session");
        Ok(SessionPlan {
            items: picks,
            total_minutes,
            budget_minutes: budget,
        })
    }

    // ========================================================================
    // SCORING
    // ========================================================================

    fn weak_skills<'p>(&self, profile: &'p ZpdProfile) -> BTreeSet<&'p str> {
        profile
            .weak_skills(self.config.weak_skill_count)
            .into_iter()
            .map(|s| s.skill_name.as_str())
            .collect()
    }

    fn score_all<'a>(
        &self,
        ctx: &RankingContext<'_>,
        candidates: impl IntoIterator<Item = &'a ContentItem>,
        options: &RankOptions,
        filter_recent: bool,
    ) -> Result<Vec<Scored<'a>>> {
        let budget = match options.session_minutes {
            Some(minutes) if minutes.is_finite() && minutes > 0.0 => {
                Some(minutes * self.config.time_buffer)
            }
            Some(minutes) => {
                return Err(CadenceError::InvalidInput(format!(
                    "session_minutes must be positive, got {}",
                    minutes
                )));
            }
            None => None,
        };
        let weak = self.weak_skills(ctx.profile);
        let type_counts = ctx
            .history
            .type_counts_since(ctx.now, self.config.variety_window_days);

        let scored = candidates
            .into_iter()
            .filter(|item| options.content_type.is_none_or(|ct| item.content_type == ct))
            .filter(|item| budget.is_none_or(|b| f64::from(item.estimated_minutes) <= b))
            .filter(|item| {
                !filter_recent
                    || !ctx.history.completed_within(
                        &item.id,
                        ctx.now,
                        self.config.recency_window_days,
                    )
            })
            .filter(|item| {
                item.prerequisites
                    .iter()
                    .all(|pre| ctx.history.has_completed(pre))
            })
            .map(|item| {
                let seen = type_counts.get(&item.content_type).copied().unwrap_or(0);
                self.score_item(ctx, item, &weak, seen)
            })
            .collect();
        Ok(scored)
    }

    fn score_item<'a>(
        &self,
        ctx: &RankingContext<'_>,
        item: &'a ContentItem,
        weak: &BTreeSet<&str>,
        seen_of_type: usize,
    ) -> Scored<'a> {
        let profile = ctx.profile;
        let mut reasons = Vec::new();

        let difficulty_match =
            (1.0 - 2.0 * (item.difficulty - profile.optimal_difficulty).abs()).max(0.0);
        if difficulty_match >= 0.8 {
            reasons.push(format!(
                "Difficulty {:.2} is close to your target {:.2}",
                item.difficulty, profile.optimal_difficulty
            ));
        }

        let skill_relevance = if item.skills.is_empty() {
            0.0
        } else {
            item.skills
                .iter()
                .filter(|s| profile.skills.contains_key(*s))
                .count() as f64
                / item.skills.len() as f64
        };

        let weakness_targeting = if weak.is_empty() {
            0.0
        } else {
            item.skills
                .iter()
                .filter(|s| weak.contains(s.as_str()))
                .count() as f64
                / weak.len() as f64
        };
        if weakness_targeting > 0.0 {
            reasons.push("Practices one of your weaker skills".to_string());
        }

        let spaced_timing = match ctx.history.last_exposure(&item.id) {
            None => {
                reasons.push("New material".to_string());
                NEVER_SEEN_TIMING_SCORE
            }
            Some(exposure) => {
                let days = ((ctx.now - exposure.at).num_seconds() as f64 / 86_400.0).max(0.0);
                let score = timing_score(days, exposure.performance);
                if score >= 0.8 {
                    reasons.push(format!("Good time to revisit ({:.0} days since last seen)", days));
                }
                score
            }
        };

        let variety = variety_score(seen_of_type);
        if seen_of_type == 0 {
            reasons.push(format!("Adds variety ({} not seen recently)", item.content_type));
        }

        let engagement = item.engagement_score.clamp(0.0, 1.0);
        if engagement >= 0.7 {
            reasons.push("Highly engaging".to_string());
        }

        Scored {
            item,
            components: ScoreComponents {
                difficulty_match,
                skill_relevance,
                weakness_targeting,
                spaced_timing,
                variety,
                engagement,
            },
            urgency: 0.0,
            reasons,
        }
    }

    fn priority(&self, scored: &Scored<'_>) -> f64 {
        scored.components.weighted_sum(&self.config.weights) * (1.0 + scored.urgency)
    }

    fn to_score(&self, scored: Scored<'_>) -> RecommendationScore {
        let total_score = scored.components.weighted_sum(&self.config.weights);
        RecommendationScore {
            content_id: scored.item.id.clone(),
            content_type: scored.item.content_type,
            total_score,
            components: scored.components,
            urgency: scored.urgency,
            priority: total_score * (1.0 + scored.urgency),
            estimated_minutes: scored.item.estimated_minutes,
            reasons: scored.reasons,
        }
    }

    fn finish(&self, scored: Vec<Scored<'_>>, limit: Option<usize>) -> Vec<RecommendationScore> {
        let mut ranked: Vec<RecommendationScore> =
            scored.into_iter().map(|s| self.to_score(s)).collect();
        ranked.sort_by(|a, b| {
            b.priority
                .total_cmp(&a.priority)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }
}

/// Raise urgency by the candidate type's missing mastery.
///
/// Types without review statistics are left alone.
fn apply_mastery_urgency(ctx: &RankingContext<'_>, candidate: &mut Scored<'_>) {
    let Some(mastery) = ctx.mastery(candidate.item.content_type) else {
        return;
    };
    let mastery = mastery.clamp(0.0, 1.0);
    candidate.urgency += (1.0 - mastery) * MASTERY_URGENCY_SCALE;
    if mastery < LOW_MASTERY {
        candidate.reasons.push(format!(
            "Your {} mastery is low ({:.2})",
            candidate.item.content_type, mastery
        ));
    }
}

/// Spaced-timing score: closeness of `days` to the ideal gap `1 + 7 * performance`
pub fn timing_score(days_since_seen: f64, last_performance: f64) -> f64 {
    let ideal = 1.0 + 7.0 * last_performance.clamp(0.0, 1.0);
    (1.0 - (days_since_seen - ideal).abs() / ideal).max(0.0)
}

/// Variety score given how often the type was seen in the window
pub fn variety_score(seen: usize) -> f64 {
    let repeats = seen.saturating_sub(1) as f64;
    (1.0 - 0.2 * repeats).max(0.0)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{ReviewEvent, SchedulerConfig};
    use crate::interval::{IntervalEngine, Quality};
    use crate::recommend::{InteractionEvent, InteractionType};
    use crate::zpd::ZpdTracker;
    use chrono::Duration;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn profile() -> ZpdProfile {
        let levels = BTreeMap::from([
            ("verbs".to_string(), 0.2),
            ("nouns".to_string(), 0.6),
            ("tenses".to_string(), 0.7),
        ]);
        ZpdTracker::default()
            .initialize("learner", Vec::<String>::new(), Some(&levels), Utc::now())
            .unwrap()
    }

    fn item(id: &str, ct: ContentType, difficulty: f64, skills: &[&str]) -> ContentItem {
        ContentItem::new(id, ct, difficulty)
            .unwrap()
            .with_skills(skills.iter().copied())
    }

    fn completed(id: &str, ct: ContentType, at: DateTime<Utc>) -> InteractionEvent {
        InteractionEvent {
            learner_id: "learner".to_string(),
            content_id: id.to_string(),
            interaction_type: InteractionType::Completed,
            performance: 0.9,
            time_spent_minutes: 5.0,
            engagement: None,
            content_type: Some(ct),
            timestamp: at,
        }
    }

    #[test]
    fn test_components() {
        let profile = profile();
        let history = InteractionHistory::default();
        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now: Utc::now(),
        };
        let target = item(
            "a",
            ContentType::Grammar,
            profile.optimal_difficulty,
            &["verbs", "unknown"],
        );
        let ranked = Recommender::default()
            .rank(&ctx, [&target], &RankOptions::default())
            .unwrap();
        let c = ranked[0].components;
        assert!(approx_eq(c.difficulty_match, 1.0, 1e-12));
        assert!(approx_eq(c.skill_relevance, 0.5, 1e-12));
        assert!(approx_eq(c.weakness_targeting, 1.0 / 3.0, 1e-12));
        assert_eq!(c.spaced_timing, NEVER_SEEN_TIMING_SCORE);
        assert_eq!(c.variety, 1.0);
        assert_eq!(c.engagement, 0.5);
        assert!(approx_eq(ranked[0].priority, ranked[0].total_score, 1e-12));
        assert!(!ranked[0].reasons.is_empty());
    }

    #[test]
    fn test_timing_score() {
        assert!(approx_eq(timing_score(8.0, 1.0), 1.0, 1e-12));
        assert!(approx_eq(timing_score(4.0, 1.0), 0.5, 1e-12));
        assert_eq!(timing_score(30.0, 0.0), 0.0);
        assert!(approx_eq(timing_score(1.0, 0.0), 1.0, 1e-12));
    }

    #[test]
    fn test_variety_score() {
        assert_eq!(variety_score(0), 1.0);
        assert_eq!(variety_score(1), 1.0);
        assert!(approx_eq(variety_score(3), 0.6, 1e-12));
        assert_eq!(variety_score(20), 0.0);
    }

    #[test]
    fn test_rank_filters() {
        let profile = profile();
        let now = Utc::now();
        let mut history = InteractionHistory::default();
        history
            .record(completed("done", ContentType::Quiz, now - Duration::days(1)))
            .unwrap();

        let done = item("done", ContentType::Quiz, 0.4, &["verbs"]);
        let locked = item("locked", ContentType::Quiz, 0.4, &["verbs"])
            .with_prerequisites(["never-done"]);
        let unlocked = item("unlocked", ContentType::Quiz, 0.4, &["verbs"])
            .with_prerequisites(["done"]);
        let long = item("long", ContentType::Quiz, 0.4, &["verbs"]).with_minutes(90);
        let reading = item("reading", ContentType::Reading, 0.4, &["verbs"]);

        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now,
        };
        let options = RankOptions {
            session_minutes: Some(20.0),
            content_type: Some(ContentType::Quiz),
            limit: None,
        };
        let ranked = Recommender::default()
            .rank(&ctx, [&done, &locked, &unlocked, &long, &reading], &options)
            .unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, vec!["unlocked"]);
    }

    #[test]
    fn test_rank_orders_by_priority() {
        let profile = profile();
        let history = InteractionHistory::default();
        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now: Utc::now(),
        };
        let good = item("good", ContentType::Grammar, profile.optimal_difficulty, &["verbs"]);
        let poor = item("poor", ContentType::Grammar, 1.0, &[]);
        let ranked = Recommender::default()
            .rank(&ctx, [&poor, &good], &RankOptions::default())
            .unwrap();
        assert_eq!(ranked[0].content_id, "good");
        assert!(ranked[0].priority > ranked[1].priority);
    }

    #[test]
    fn test_weakness_entry_point() {
        let profile = profile();
        let history = InteractionHistory::default();
        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now: Utc::now(),
        };
        let weak = item("weak", ContentType::Grammar, 0.5, &["verbs"]);
        let other = item("other", ContentType::Grammar, 0.5, &["spelling"]);
        let ranked = Recommender::default()
            .recommend_for_weaknesses(&ctx, [&weak, &other], &RankOptions::default())
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].urgency > 0.0);
        assert!(ranked[0].priority > ranked[0].total_score);
        assert!(ranked[0].reasons[0].contains("verbs"));
    }

    #[test]
    fn test_review_entry_point() {
        let profile = profile();
        let now = Utc::now();
        let mut history = InteractionHistory::default();
        history
            .record(completed("due", ContentType::Vocabulary, now - Duration::days(1)))
            .unwrap();

        let mut queue = DueQueue::new(IntervalEngine::default(), SchedulerConfig::default());
        queue.enqueue_new_at("due", ContentType::Vocabulary, now - Duration::days(5));
        let event = ReviewEvent::new("due", Quality::new(4).unwrap(), 8.0, ContentType::Vocabulary)
            .unwrap();
        queue.grade_at(&event, now - Duration::days(5)).unwrap();
        queue.enqueue_new_at("later", ContentType::Vocabulary, now + Duration::days(2));

        let due = item("due", ContentType::Vocabulary, 0.4, &["nouns"]);
        let later = item("later", ContentType::Vocabulary, 0.4, &["nouns"]);
        let unqueued = item("unqueued", ContentType::Vocabulary, 0.4, &["nouns"]);

        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now,
        };
        let ranked = Recommender::default()
            .recommend_reviews(&ctx, [&due, &later, &unqueued], &queue, &RankOptions::default())
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].content_id, "due");
        assert!(ranked[0].urgency > 0.0);
        assert!(ranked[0].reasons[0].contains("overdue"));
    }

    #[test]
    fn test_low_mastery_raises_review_urgency() {
        let profile = profile();
        let history = InteractionHistory::default();
        let now = Utc::now();

        let mut queue = DueQueue::new(IntervalEngine::default(), SchedulerConfig::default());
        queue.enqueue_new_at("g", ContentType::Grammar, now - Duration::hours(1));
        queue.enqueue_new_at("v", ContentType::Vocabulary, now - Duration::hours(1));
        let grammar = item("g", ContentType::Grammar, 0.4, &["nouns"]);
        let vocabulary = item("v", ContentType::Vocabulary, 0.4, &["nouns"]);

        let mut performance = PerformanceAnalyzer::default();
        for _ in 0..6 {
            performance
                .record("g0", Quality::new(1).unwrap(), 9.0, ContentType::Grammar)
                .unwrap();
            performance
                .record("v0", Quality::new(5).unwrap(), 9.0, ContentType::Vocabulary)
                .unwrap();
        }

        let plain = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now,
        };
        let informed = RankingContext {
            performance: Some(&performance),
            ..plain
        };
        let recommender = Recommender::default();
        let urgency = |ctx: &RankingContext<'_>, id: &str| {
            recommender
                .recommend_reviews(ctx, [&grammar, &vocabulary], &queue, &RankOptions::default())
                .unwrap()
                .into_iter()
                .find(|r| r.content_id == id)
                .unwrap()
        };

        let grammar_plain = urgency(&plain, "g");
        let grammar_informed = urgency(&informed, "g");
        let vocabulary_informed = urgency(&informed, "v");
        assert!(grammar_informed.urgency > grammar_plain.urgency);
        assert!(grammar_informed.urgency > vocabulary_informed.urgency);
        assert!(grammar_informed.reasons.iter().any(|r| r.contains("mastery is low")));
        assert!(!vocabulary_informed.reasons.iter().any(|r| r.contains("mastery")));
    }

    #[test]
    fn test_select_session_prefers_new_type_after_repeats() {
        let profile = profile();
        let history = InteractionHistory::default();
        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now: Utc::now(),
        };
        let d = profile.optimal_difficulty;
        let quizzes: Vec<ContentItem> = (0..5)
            .map(|i| item(&format!("quiz{}", i), ContentType::Quiz, d, &["nouns"]))
            .collect();
        let reading = item("reading", ContentType::Reading, d, &["nouns"]);

        let plan = Recommender::default()
            .select_session(&ctx, quizzes.iter().chain([&reading]), 100.0, None)
            .unwrap();

        let types: Vec<ContentType> = plan.items.iter().map(|p| p.content_type).collect();
        assert_eq!(types.iter().filter(|t| **t == ContentType::Quiz).count(), 3);
        assert!(types.contains(&ContentType::Reading));
        // the reading item wins as soon as a quiz has been picked twice
        let reading_at = types.iter().position(|t| *t == ContentType::Reading).unwrap();
        assert!(reading_at <= 2);
    }

    #[test]
    fn test_select_session_respects_budget() {
        let profile = profile();
        let history = InteractionHistory::default();
        let ctx = RankingContext {
            profile: &profile,
            history: &history,
            performance: None,
            now: Utc::now(),
        };
        let items: Vec<ContentItem> = ContentType::ALL
            .iter()
            .enumerate()
            .map(|(i, ct)| item(&format!("i{}", i), *ct, 0.5, &["nouns"]).with_minutes(7))
            .collect();
        let plan = Recommender::default()
            .select_session(&ctx, &items, 20.0, None)
            .unwrap();
        assert_eq!(plan.items.len(), 3);
        assert!(f64::from(plan.total_minutes) <= plan.budget_minutes);
        assert!(approx_eq(plan.budget_minutes, 24.0, 1e-12));

        assert!(
            Recommender::default()
                .select_session(&ctx, &items, 0.0, None)
                .is_err()
        );
    }
}
