//! Journey: adaptive recommendations
//!
//! A learner completes content, their skill profile moves, and the
//! recommender follows: prerequisites unlock, weak skills get targeted,
//! repeated content types sink and sessions fit the time box.

use std::collections::{BTreeMap, BTreeSet};

use cadence_core::zpd::LearningZone;
use cadence_core::{
    CadenceEngine, ContentCatalog, ContentType, InteractionEvent, InteractionType, LearnerState,
    Quality, RankOptions, ReviewEvent, SharedCatalog, ZpdConfig, ZpdTracker,
};
use cadence_e2e_tests::CatalogFactory;
use chrono::{DateTime, Duration, Utc};

fn complete(
    engine: &CadenceEngine,
    learner: &mut LearnerState,
    catalog: &SharedCatalog,
    content_id: &str,
    performance: f64,
    at: DateTime<Utc>,
) {
    engine
        .record_interaction(
            learner,
            catalog,
            InteractionEvent {
                learner_id: learner.learner_id.clone(),
                content_id: content_id.to_string(),
                interaction_type: InteractionType::Completed,
                performance,
                time_spent_minutes: 6.0,
                engagement: None,
                content_type: None,
                timestamp: at,
            },
        )
        .unwrap();
}

fn ids(recs: &[cadence_core::RecommendationScore]) -> Vec<&str> {
    recs.iter().map(|r| r.content_id.as_str()).collect()
}

#[test]
fn test_prerequisites_unlock_after_completion() {
    let engine = CadenceEngine::default();
    let shared = SharedCatalog::new(CatalogFactory::language_course());
    let start = CatalogFactory::epoch();
    let mut learner = engine
        .new_learner("ana", &shared.to_catalog(), None, start)
        .unwrap();

    let before = engine
        .recommend(&learner, &shared.to_catalog(), &RankOptions::default(), start)
        .unwrap();
    assert!(!ids(&before).contains(&"reading-cafe"));
    assert!(!ids(&before).contains(&"listening-dialogue"));
    assert_eq!(before.len(), 8);

    complete(&engine, &mut learner, &shared, "grammar-present", 0.9, start);
    let after = engine
        .recommend(
            &learner,
            &shared.to_catalog(),
            &RankOptions::default(),
            start + Duration::hours(1),
        )
        .unwrap();
    assert!(ids(&after).contains(&"reading-cafe"));
    // Completed within the recency window
    assert!(!ids(&after).contains(&"grammar-present"));

    let days_later = engine
        .recommend(
            &learner,
            &shared.to_catalog(),
            &RankOptions::default(),
            start + Duration::days(4),
        )
        .unwrap();
    assert!(ids(&days_later).contains(&"grammar-present"));
}

#[test]
fn test_scores_are_weighted_and_ordered() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    let weights = &engine.recommender().config().weights;

    let recs = engine
        .recommend(&learner, &catalog, &RankOptions::default(), now)
        .unwrap();
    for rec in &recs {
        assert!((rec.total_score - rec.components.weighted_sum(weights)).abs() < 1e-12);
        assert!((rec.priority - rec.total_score * (1.0 + rec.urgency)).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&rec.total_score));
        assert!(!rec.reasons.is_empty());
    }
    for pair in recs.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }

    let limited = engine
        .recommend(
            &learner,
            &catalog,
            &RankOptions {
                limit: Some(3),
                content_type: Some(ContentType::Vocabulary),
                session_minutes: None,
            },
            now,
        )
        .unwrap();
    assert_eq!(limited.len(), 3);
    assert!(limited.iter().all(|r| r.content_type == ContentType::Vocabulary));
}

#[test]
fn test_repeated_type_loses_to_fresh_type() {
    let engine = CadenceEngine::default();
    let now = CatalogFactory::epoch();
    let catalog = ContentCatalog::from_items([
        CatalogFactory::item("g-1", ContentType::Grammar, 0.5, &["verbs"], 5),
        CatalogFactory::item("g-2", ContentType::Grammar, 0.5, &["verbs"], 5),
        CatalogFactory::item("g-3", ContentType::Grammar, 0.5, &["verbs"], 5),
        CatalogFactory::item("g-candidate", ContentType::Grammar, 0.5, &["verbs"], 5),
        CatalogFactory::item("r-candidate", ContentType::Reading, 0.5, &["verbs"], 5),
    ])
    .unwrap();
    let shared = SharedCatalog::new(catalog);
    let mut learner = engine
        .new_learner("ana", &shared.to_catalog(), None, now)
        .unwrap();
    for (i, id) in ["g-1", "g-2", "g-3"].into_iter().enumerate() {
        complete(&engine, &mut learner, &shared, id, 0.8, now - Duration::hours(3 - i as i64));
    }

    let recs = engine
        .recommend(&learner, &shared.to_catalog(), &RankOptions::default(), now)
        .unwrap();
    assert_eq!(ids(&recs), vec!["r-candidate", "g-candidate"]);
    let reading = &recs[0].components;
    let grammar = &recs[1].components;
    assert_eq!(reading.difficulty_match, grammar.difficulty_match);
    assert_eq!(reading.engagement, grammar.engagement);
    assert!(reading.variety > grammar.variety);
}

#[test]
fn test_weak_skills_targeted() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let levels: BTreeMap<String, f64> = [("greetings".to_string(), 0.95)].into_iter().collect();
    let learner = engine.new_learner("ana", &catalog, Some(&levels), now).unwrap();

    let strong: BTreeSet<&str> = ["greetings"].into_iter().collect();
    let recs = engine
        .recommend_for_weaknesses(&learner, &catalog, &RankOptions::default(), now)
        .unwrap();
    assert!(!recs.is_empty());
    for rec in &recs {
        let item = catalog.get(&rec.content_id).unwrap();
        assert!(item.skills.iter().any(|s| !strong.contains(s.as_str())));
        assert!(rec.urgency > 0.0);
        assert!(rec.reasons[0].starts_with("Strengthens weak skills"));
    }
    assert!(!ids(&recs).contains(&"vocab-greetings"));
    assert!(!ids(&recs).contains(&"speaking-intro"));
}

#[test]
fn test_review_recommendations_follow_the_queue() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    for id in ["vocab-food", "vocab-travel", "grammar-past"] {
        let ct = catalog.get(id).unwrap().content_type;
        engine.enqueue(&mut learner, id, ct, now);
    }
    engine
        .grade(
            &mut learner,
            &ReviewEvent::new("vocab-food", Quality::new(1).unwrap(), 12.0, ContentType::Vocabulary)
                .unwrap(),
            now,
        )
        .unwrap();
    engine
        .grade(
            &mut learner,
            &ReviewEvent::new("grammar-past", Quality::new(5).unwrap(), 12.0, ContentType::Grammar)
                .unwrap(),
            now,
        )
        .unwrap();

    let later = now + Duration::days(3);
    let recs = engine
        .recommend_reviews(&learner, &catalog, &RankOptions::default(), later)
        .unwrap();
    let found = ids(&recs);
    assert!(found.contains(&"vocab-food"));
    assert!(found.contains(&"vocab-travel"));
    assert!(found.contains(&"grammar-past"));
    assert!(!found.contains(&"quiz-basics"));
    for rec in &recs {
        assert!(rec.urgency > 0.0);
    }
    let food = recs.iter().find(|r| r.content_id == "vocab-food").unwrap();
    assert!(food.reasons[0].starts_with("Review overdue by 2 days"));
    let travel = recs.iter().find(|r| r.content_id == "vocab-travel").unwrap();
    assert_eq!(travel.reasons[0], "Ready for a first review");
}

#[test]
fn test_session_fits_time_box_and_caps_types() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::uniform_batch(60);
    let now = CatalogFactory::epoch();
    let learner = engine.new_learner("ana", &catalog, None, now).unwrap();

    let plan = engine.select_session(&learner, &catalog, 30.0, None, now).unwrap();
    assert!((plan.budget_minutes - 36.0).abs() < 1e-9);
    assert!(f64::from(plan.total_minutes) <= plan.budget_minutes);
    assert_eq!(plan.items.len(), 7);

    let mut per_type: BTreeMap<ContentType, usize> = BTreeMap::new();
    for item in &plan.items {
        *per_type.entry(item.content_type).or_insert(0) += 1;
    }
    assert!(per_type.values().all(|&n| n <= 3));

    let grammar_only = engine
        .select_session(&learner, &catalog, 60.0, Some(ContentType::Grammar), now)
        .unwrap();
    assert_eq!(grammar_only.items.len(), 3);

    assert!(engine.select_session(&learner, &catalog, 0.0, None, now).is_err());
}

#[test]
fn test_completions_move_the_profile() {
    let engine = CadenceEngine::default();
    let shared = SharedCatalog::new(CatalogFactory::language_course());
    let start = CatalogFactory::epoch();
    let mut learner = engine
        .new_learner("ana", &shared.to_catalog(), None, start)
        .unwrap();
    let initial_optimal = learner.profile.optimal_difficulty;
    let initial_verbs = engine.recommend_difficulty(&learner, "verbs");

    for day in 0..6 {
        complete(
            &engine,
            &mut learner,
            &shared,
            "grammar-past",
            1.0,
            start + Duration::days(day * 4),
        );
    }

    let verbs = learner.profile.skill("verbs").unwrap();
    assert!(verbs.current_level > 0.3);
    assert_eq!(verbs.attempts, 6);
    assert!(learner.profile.optimal_difficulty > initial_optimal);

    let after = engine.recommend_difficulty(&learner, "verbs");
    assert!(after.difficulty > initial_verbs.difficulty);
    assert!((0.1..=0.9).contains(&after.difficulty));

    let range = learner.profile.zpd_range;
    assert!(0.0 <= range.lower && range.lower <= range.upper && range.upper <= 1.0);

    assert!(engine.challenge_adjustment(&learner, &[(0.95, 0.5), (0.9, 0.6)]) > 0.0);
    assert!(engine.challenge_adjustment(&learner, &[(0.1, 0.5), (0.2, 0.4)]) < 0.0);

    let engagement = shared.get("grammar-past").unwrap().engagement_score;
    assert!(engagement > 0.5);
}

#[test]
fn test_two_skill_profile_scenario() {
    let tracker = ZpdTracker::new(ZpdConfig::default()).unwrap();
    let levels: BTreeMap<String, f64> = [("a".to_string(), 0.2), ("b".to_string(), 0.8)]
        .into_iter()
        .collect();
    let profile = tracker
        .initialize("ana", ["a", "b"], Some(&levels), CatalogFactory::epoch())
        .unwrap();

    let width = profile.zpd_width;
    assert!(width >= 0.3 && width <= 0.5);
    let center = (profile.zpd_range.lower + profile.zpd_range.upper) / 2.0;
    assert!((center - 0.5).abs() < 1e-9);
    assert!((profile.optimal_difficulty - (0.5 + width / 4.0)).abs() < 1e-9);

    assert_eq!(tracker.classify(&profile, "a", 0.7), LearningZone::Frustration);
    assert_eq!(tracker.classify(&profile, "b", 0.5), LearningZone::Mastery);
}
