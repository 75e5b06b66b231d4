//! Property tests for skill profiles and recommendation scoring.

use std::collections::BTreeMap;

use cadence_core::{RecommendationWeights, SkillObservation, ZpdConfig, ZpdTracker};
use cadence_e2e_tests::CatalogFactory;
use chrono::Duration;
use proptest::prelude::*;

const SKILLS: [&str; 4] = ["greetings", "food", "verbs", "past"];

fn observation_strategy() -> impl Strategy<Value = SkillObservation> {
    (0..SKILLS.len() + 1, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..600.0, 0.0f64..=1.0).prop_map(
        |(skill, performance, confidence, seconds, difficulty)| SkillObservation {
            // One index past the seeded skills exercises on-the-fly creation
            skill: SKILLS.get(skill).copied().unwrap_or("idioms").to_string(),
            performance,
            confidence,
            response_time_seconds: seconds,
            difficulty,
        },
    )
}

proptest! {
    #[test]
    fn band_stays_ordered_and_in_unit_interval(
        observations in prop::collection::vec(observation_strategy(), 0..60)
    ) {
        let tracker = ZpdTracker::new(ZpdConfig::default()).unwrap();
        let start = CatalogFactory::epoch();
        let mut profile = tracker.initialize("prop", SKILLS, None, start).unwrap();

        for (i, observation) in observations.iter().enumerate() {
            let updated = tracker
                .update_skill(&mut profile, observation, start + Duration::minutes(i as i64))
                .unwrap();
            prop_assert!((0.0..=1.0).contains(&updated.current_level));
            prop_assert!((0.0..=1.0).contains(&updated.confidence));
            prop_assert!(updated.recent_trends.len() <= 10);

            let range = profile.zpd_range;
            prop_assert!(0.0 <= range.lower);
            prop_assert!(range.lower <= range.upper);
            prop_assert!(range.upper <= 1.0);
            prop_assert!(profile.zpd_width >= 0.15 && profile.zpd_width <= 0.5);
            prop_assert!((0.0..=1.0).contains(&profile.optimal_difficulty));
        }
    }

    #[test]
    fn recommended_difficulty_is_clamped(
        observations in prop::collection::vec(observation_strategy(), 0..40),
        lookup in 0..SKILLS.len() + 1
    ) {
        let tracker = ZpdTracker::new(ZpdConfig::default()).unwrap();
        let now = CatalogFactory::epoch();
        let mut profile = tracker.initialize("prop", SKILLS, None, now).unwrap();
        for observation in &observations {
            tracker.update_skill(&mut profile, observation, now).unwrap();
        }

        let skill = SKILLS.get(lookup).copied().unwrap_or("never-seen");
        let rec = tracker.recommend_difficulty(&profile, skill);
        prop_assert!((0.1..=0.9).contains(&rec.difficulty));
        prop_assert_eq!(rec.zpd_range, profile.zpd_range);
    }

    #[test]
    fn challenge_adjustment_is_bounded(
        recent in prop::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), 0..20)
    ) {
        let tracker = ZpdTracker::new(ZpdConfig::default()).unwrap();
        let profile = tracker
            .initialize("prop", SKILLS, None, CatalogFactory::epoch())
            .unwrap();
        let adjustment = tracker.challenge_adjustment(&profile, &recent);
        prop_assert!((-0.3..=0.3).contains(&adjustment));
        if recent.is_empty() {
            prop_assert_eq!(adjustment, 0.0);
        }
    }

    #[test]
    fn initial_levels_are_respected(levels in prop::collection::vec(0.0f64..=1.0, SKILLS.len())) {
        let tracker = ZpdTracker::new(ZpdConfig::default()).unwrap();
        let seeded: BTreeMap<String, f64> = SKILLS
            .iter()
            .zip(&levels)
            .map(|(skill, level)| (skill.to_string(), *level))
            .collect();
        let profile = tracker
            .initialize("prop", SKILLS, Some(&seeded), CatalogFactory::epoch())
            .unwrap();
        for (skill, level) in SKILLS.iter().zip(&levels) {
            prop_assert_eq!(profile.skill(skill).unwrap().current_level, *level);
        }
        let range = profile.zpd_range;
        prop_assert!(0.0 <= range.lower && range.lower <= range.upper && range.upper <= 1.0);
    }
}

#[test]
fn default_weights_sum_to_one() {
    let weights = RecommendationWeights::default();
    assert!((weights.sum() - 1.0).abs() < 1e-9);
    assert!(weights.validate().is_ok());
}
