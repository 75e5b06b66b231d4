//! Journey: daily review cycle
//!
//! A learner queues a course, works through the due reviews, comes back the
//! next day and keeps going. Covers the interval engine, the due queue and
//! the performance analyzer working together.

use cadence_core::{
    CadenceConfig, CadenceEngine, CadenceError, ContentType, IntervalEngine, Quality, ReviewEvent,
    ReviewType,
};
use cadence_e2e_tests::CatalogFactory;
use chrono::Duration;

fn q(value: u8) -> Quality {
    Quality::new(value).unwrap()
}

fn review(id: &str, quality: u8, content_type: ContentType) -> ReviewEvent {
    ReviewEvent::new(id, q(quality), 8.0, content_type).unwrap()
}

#[test]
fn test_perfect_streak_grows_and_graduates() {
    let engine = IntervalEngine::default();
    let now = CatalogFactory::epoch();
    let mut state = engine.new_state();

    let mut repetitions = Vec::new();
    let mut intervals = Vec::new();
    let mut graduated = Vec::new();
    for _ in 0..3 {
        let outcome = engine.advance(&state, q(5), 1.0, now);
        state = outcome.state;
        repetitions.push(state.repetitions);
        intervals.push(state.interval_days);
        graduated.push(state.graduated);
    }

    assert_eq!(repetitions, vec![1, 2, 3]);
    assert_eq!(intervals[0], 1);
    assert_eq!(intervals[1], 4);
    assert!(intervals[2] >= 9, "third interval was {}", intervals[2]);
    assert_eq!(graduated, vec![false, true, true]);
}

#[test]
fn test_failure_after_successes_restarts_learning() {
    let engine = IntervalEngine::default();
    let now = CatalogFactory::epoch();
    let mut state = engine.new_state();
    for quality in [4, 5, 4] {
        state = engine.advance(&state, q(quality), 1.0, now).state;
    }
    assert_eq!(state.consecutive_correct, 3);

    let failed = engine.advance(&state, q(1), 1.0, now).state;
    assert_eq!(failed.consecutive_correct, 0);
    assert_eq!(failed.repetitions, 0);
    assert_eq!(failed.interval_days, 1);
    assert!(!failed.graduated);
}

#[test]
fn test_two_day_review_journey() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let day_one = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, day_one).unwrap();
    assert_eq!(engine.enqueue_catalog(&mut learner, &catalog, day_one), catalog.len());

    engine.start_session(&mut learner, day_one);
    let due = engine.poll_due(&mut learner, 20, false, day_one);
    assert_eq!(due.len(), catalog.len());
    assert!(due.iter().all(|d| d.review_type == ReviewType::New));

    for (i, item) in due.iter().enumerate() {
        let quality = if i % 4 == 0 { 2 } else { 4 };
        let at = day_one + Duration::minutes(i as i64);
        engine
            .grade(&mut learner, &review(&item.item_id, quality, item.content_type), at)
            .unwrap();
    }
    let session = engine
        .end_session(&mut learner, day_one + Duration::minutes(25))
        .unwrap();
    assert_eq!(session.reviews, catalog.len() as u32);

    // Everything is scheduled at least a day out, so one future item is offered
    let later_today = day_one + Duration::hours(2);
    let fallback = engine.poll_due(&mut learner, 20, false, later_today);
    assert_eq!(fallback.len(), 1);
    assert!(fallback[0].scheduled_time > later_today);

    let with_future = engine.poll_due(&mut learner, 5, true, later_today);
    assert_eq!(with_future.len(), 5);

    // Next day every item graded yesterday is due again
    let day_two = day_one + Duration::days(1) + Duration::hours(1);
    let due_again = engine.poll_due(&mut learner, 20, false, day_two);
    assert_eq!(due_again.len(), catalog.len());
    for pair in due_again.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }

    let stats = engine.stats(&learner, day_two);
    assert_eq!(stats.queue.total_items, catalog.len());
    assert_eq!(stats.queue.live_entries, catalog.len());
    assert_eq!(stats.queue.completed_today, 0);
    assert_eq!(stats.performance.total_reviews, catalog.len() as u64);
    assert!(stats.performance.accuracy > 0.5);
}

#[test]
fn test_daily_cap_is_advisory() {
    let mut config = CadenceConfig::default();
    config.scheduler.max_daily_reviews = 3;
    let engine = CadenceEngine::new(config).unwrap();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ben", &catalog, None, now).unwrap();
    engine.enqueue_catalog(&mut learner, &catalog, now);

    assert_eq!(engine.poll_due(&mut learner, 10, false, now).len(), 3);

    let ids: Vec<String> = catalog.iter().take(5).map(|item| item.id.clone()).collect();
    let mut exceeded = Vec::new();
    for id in &ids {
        let outcome = engine
            .grade(&mut learner, &review(id, 4, ContentType::Vocabulary), now)
            .unwrap();
        exceeded.push(outcome.daily_cap_exceeded);
    }
    assert_eq!(exceeded, vec![false, false, false, true, true]);

    let stats = engine.stats(&learner, now);
    assert!(stats.queue.cap_reached);
    assert_eq!(stats.queue.remaining_today, 0);
    assert!(engine.poll_due(&mut learner, 10, false, now).is_empty());

    let tomorrow = now + Duration::days(1);
    assert!(!engine.stats(&learner, tomorrow).queue.cap_reached);
    assert!(!engine.poll_due(&mut learner, 10, false, tomorrow).is_empty());
}

#[test]
fn test_unknown_items_lenient_by_default_and_rejected_when_strict() {
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();

    let lenient = CadenceEngine::default();
    let mut learner = lenient.new_learner("ana", &catalog, None, now).unwrap();
    let outcome = lenient
        .grade(&mut learner, &review("stray", 5, ContentType::Quiz), now)
        .unwrap();
    assert!(outcome.created);
    assert_eq!(learner.queue.len(), 1);
    assert_eq!(learner.queue.entry("stray").unwrap().content_type, ContentType::Quiz);

    let mut config = CadenceConfig::default();
    config.scheduler.strict = true;
    let strict = CadenceEngine::new(config).unwrap();
    let mut learner = strict.new_learner("ana", &catalog, None, now).unwrap();
    let err = strict
        .grade(&mut learner, &review("stray", 5, ContentType::Quiz), now)
        .unwrap_err();
    assert!(matches!(err, CadenceError::UnknownItem(_)));
    assert!(learner.queue.is_empty());
    assert_eq!(learner.performance.total_reviews(), 0);
}

#[test]
fn test_graduated_item_stays_queued_once() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    engine.enqueue_catalog(&mut learner, &catalog, now);

    let first = engine
        .grade(&mut learner, &review("vocab-food", 5, ContentType::Vocabulary), now)
        .unwrap();
    assert!(!first.graduated_now);
    let second = engine
        .grade(
            &mut learner,
            &review("vocab-food", 5, ContentType::Vocabulary),
            now + Duration::days(1),
        )
        .unwrap();
    assert!(second.graduated_now);

    let entries: Vec<_> = learner
        .queue
        .entries()
        .filter(|e| e.item_id == "vocab-food")
        .collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].archived);
    assert_eq!(engine.stats(&learner, now).queue.graduated, 1);
}

#[test]
fn test_invalid_review_leaves_state_untouched() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    engine.enqueue_catalog(&mut learner, &catalog, now);
    let before = learner.clone();

    assert!(Quality::new(6).is_err());
    assert!(ReviewEvent::new("vocab-food", q(4), -1.0, ContentType::Vocabulary).is_err());

    let mut bad = review("vocab-food", 4, ContentType::Vocabulary);
    bad.response_time_seconds = f64::NAN;
    assert!(engine.grade(&mut learner, &bad, now).is_err());
    assert_eq!(learner, before);
}

#[test]
fn test_preview_and_forecast() {
    let engine = CadenceEngine::default();
    let catalog = CatalogFactory::language_course();
    let now = CatalogFactory::epoch();
    let mut learner = engine.new_learner("ana", &catalog, None, now).unwrap();
    engine.enqueue_catalog(&mut learner, &catalog, now);
    engine
        .grade(&mut learner, &review("vocab-food", 4, ContentType::Vocabulary), now)
        .unwrap();

    let preview = engine.preview(&learner, "vocab-food", now);
    assert_eq!(preview.len(), 6);
    assert!(preview[..3].iter().all(|p| p.interval_days == 1));
    assert!(preview[5].interval_days >= preview[3].interval_days);

    let soon = learner.queue.retention_forecast("vocab-food", 0.0, now).unwrap();
    let later = learner.queue.retention_forecast("vocab-food", 30.0, now).unwrap();
    assert!(soon > later);
    assert!(learner.queue.retention_forecast("missing", 0.0, now).is_none());
}
