//! Journey: persistence and learner isolation
//!
//! Learners survive export/import and a round trip through the SQLite
//! store. Learners never see each other's state, and a shared catalog takes
//! engagement updates from several learner shards at once.

use cadence_core::{
    CadenceEngine, CadenceError, ContentType, InteractionEvent, InteractionType, LearnerSnapshot,
    Quality, ReviewEvent, SharedCatalog, SNAPSHOT_VERSION,
};
use cadence_e2e_tests::{CatalogFactory, TestStoreManager};
use chrono::Duration;

fn review(id: &str, quality: u8) -> ReviewEvent {
    ReviewEvent::new(id, Quality::new(quality).unwrap(), 7.5, ContentType::Vocabulary).unwrap()
}

#[test]
fn test_learner_survives_store_reopen() {
    let mut manager = TestStoreManager::new_temp();
    let now = CatalogFactory::epoch();
    assert_eq!(manager.seed_catalog(&CatalogFactory::language_course()), 10);

    let mut learner = manager.create_learner("ana", now);
    manager.engine.start_session(&mut learner, now);
    for (i, (id, quality)) in [("vocab-food", 5), ("vocab-travel", 2), ("vocab-food", 4)]
        .into_iter()
        .enumerate()
    {
        let at = now + Duration::minutes(i as i64 * 3);
        let outcome = manager.engine.grade(&mut learner, &review(id, quality), at).unwrap();
        manager
            .store
            .append_review("ana", &review(id, quality), &outcome, at)
            .unwrap();
    }
    manager.save(&learner, now);

    manager.reopen();
    assert_eq!(manager.learner_count(), 1);
    let restored = manager.load("ana").unwrap();
    assert_eq!(restored, learner);
    assert!(restored.performance.active_session().is_some());

    let log = manager.store.recent_reviews("ana", 2).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].item_id, "vocab-food");
    assert_eq!(log[0].quality, 4);
    assert_eq!(manager.catalog(), CatalogFactory::language_course());
}

#[test]
fn test_export_import_through_a_file() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let shared = SharedCatalog::new(catalog.clone());
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    engine.enqueue_catalog(&mut learner, &catalog, now);
    engine.grade(&mut learner, &review("vocab-greetings", 3), now).unwrap();
    engine
        .record_interaction(
            &mut learner,
            &shared,
            InteractionEvent {
                learner_id: "ana".to_string(),
                content_id: "quiz-basics".to_string(),
                interaction_type: InteractionType::Completed,
                performance: 0.7,
                time_spent_minutes: 4.5,
                engagement: Some(0.9),
                content_type: None,
                timestamp: now,
            },
        )
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ana.json");
    std::fs::write(&path, engine.export(&learner, now).to_json_pretty().unwrap()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let snapshot = LearnerSnapshot::from_json(&raw).unwrap();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    assert_eq!(engine.import(snapshot).unwrap(), learner);
}

#[test]
fn test_future_snapshot_version_rejected() {
    let engine = CadenceEngine::default();
    let now = CatalogFactory::epoch();
    let learner = engine
        .new_learner("ana", &CatalogFactory::language_course(), None, now)
        .unwrap();

    let mut value = serde_json::to_value(engine.export(&learner, now)).unwrap();
    value["version"] = serde_json::json!(SNAPSHOT_VERSION + 1);
    let err = LearnerSnapshot::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, CadenceError::UnsupportedSnapshot { .. }));

    value["version"] = serde_json::json!(SNAPSHOT_VERSION);
    value["learnerId"] = serde_json::json!("someone-else");
    assert!(LearnerSnapshot::from_json(&value.to_string()).is_err());
}

#[test]
fn test_tampered_snapshot_rejected() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    engine.enqueue_catalog(&mut learner, &catalog, now);
    engine.grade(&mut learner, &review("vocab-food", 4), now).unwrap();
    let exported = serde_json::to_value(engine.export(&learner, now)).unwrap();

    let import = |value: &serde_json::Value| {
        let snapshot = LearnerSnapshot::from_json(&value.to_string()).unwrap();
        engine.import(snapshot)
    };
    assert_eq!(import(&exported).unwrap(), learner);

    let mut inverted = exported.clone();
    inverted["profile"]["zpdRange"]["lower"] = serde_json::json!(0.9);
    inverted["profile"]["zpdRange"]["upper"] = serde_json::json!(0.1);
    assert!(matches!(import(&inverted), Err(CadenceError::InvalidInput(_))));

    let mut ease = exported.clone();
    ease["queue"]["states"]["vocab-food"]["easeFactor"] = serde_json::json!(9.0);
    assert!(matches!(import(&ease), Err(CadenceError::InvalidInput(_))));

    let mut counts = exported.clone();
    counts["queue"]["states"]["vocab-food"]["totalCorrect"] = serde_json::json!(50);
    counts["queue"]["states"]["vocab-food"]["totalReviews"] = serde_json::json!(0);
    assert!(matches!(import(&counts), Err(CadenceError::InvalidInput(_))));

    let mut totals = exported;
    totals["performance"]["totalReviews"] = serde_json::json!(0);
    assert!(matches!(import(&totals), Err(CadenceError::InvalidInput(_))));
}

#[test]
fn test_learners_are_isolated() {
    let manager = TestStoreManager::new_temp();
    let now = CatalogFactory::epoch();
    manager.seed_catalog(&CatalogFactory::language_course());

    let mut ana = manager.create_learner("ana", now);
    let ben = manager.create_learner("ben", now);
    for _ in 0..3 {
        manager.engine.grade(&mut ana, &review("vocab-food", 1), now).unwrap();
    }
    manager.save(&ana, now);

    let ben_reloaded = manager.load("ben").unwrap();
    assert_eq!(ben_reloaded, ben);
    assert_eq!(ben_reloaded.performance.total_reviews(), 0);
    assert!(ben_reloaded.queue.global_performance_factor() > ana.queue.global_performance_factor());

    assert!(manager.store.delete_learner("ana").unwrap());
    assert!(manager.load("ana").is_none());
    assert_eq!(manager.learner_count(), 1);
}

#[test]
fn test_shared_catalog_across_learner_shards() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let shared = SharedCatalog::new(catalog.clone());
    let now = CatalogFactory::epoch();
    let shards = 4;
    let per_shard = 5;

    std::thread::scope(|scope| {
        for shard in 0..shards {
            let engine = &engine;
            let shared = shared.clone();
            let catalog = &catalog;
            scope.spawn(move || {
                let id = format!("learner-{shard}");
                let mut learner = engine.new_learner(&id, catalog, None, now).unwrap();
                for _ in 0..per_shard {
                    engine
                        .record_interaction(
                            &mut learner,
                            &shared,
                            InteractionEvent {
                                learner_id: id.clone(),
                                content_id: "speaking-intro".to_string(),
                                interaction_type: InteractionType::Started,
                                performance: 0.0,
                                time_spent_minutes: 1.0,
                                engagement: None,
                                content_type: None,
                                timestamp: now,
                            },
                        )
                        .unwrap();
                }
                assert_eq!(learner.history.len(), per_shard);
            });
        }
    });

    // Identical observations commute, so the result is order independent
    let alpha = engine.config().recommender.engagement_alpha;
    let updates = (shards * per_shard) as i32;
    let expected = 0.4 + (0.5 - 0.4) * (1.0 - alpha).powi(updates);
    let actual = shared.get("speaking-intro").unwrap().engagement_score;
    assert!((actual - expected).abs() < 1e-9, "{actual} vs {expected}");
}
