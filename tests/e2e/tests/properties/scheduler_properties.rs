//! Property tests for the interval engine, the due queue and snapshots.

use cadence_core::{
    CadenceEngine, ContentType, IntervalEngine, LearnerSnapshot, Quality, ReviewEvent,
};
use cadence_e2e_tests::CatalogFactory;
use chrono::Duration;
use proptest::prelude::*;

const ITEM_IDS: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

#[derive(Debug, Clone)]
enum Op {
    Enqueue(usize),
    Grade { item: usize, quality: u8, latency: f64 },
    Poll { limit: usize, include_future: bool },
    Advance(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ITEM_IDS.len()).prop_map(Op::Enqueue),
        (0..ITEM_IDS.len(), 0u8..=5, 0.0f64..60.0)
            .prop_map(|(item, quality, latency)| Op::Grade { item, quality, latency }),
        (0usize..8, any::<bool>())
            .prop_map(|(limit, include_future)| Op::Poll { limit, include_future }),
        (1i64..72).prop_map(Op::Advance),
    ]
}

proptest! {
    #[test]
    fn ease_and_interval_stay_bounded(qualities in prop::collection::vec(0u8..=5, 1..60),
                                      factor in 0.5f64..2.0) {
        let engine = IntervalEngine::default();
        let now = CatalogFactory::epoch();
        let mut state = engine.new_state();
        for q in qualities {
            state = engine.advance(&state, Quality::new(q).unwrap(), factor, now).state;
            prop_assert!(state.ease_factor >= 1.3 && state.ease_factor <= 4.0);
            prop_assert!(state.interval_days >= 1 && state.interval_days <= 365);
            prop_assert!(state.total_correct <= state.total_reviews);
        }
    }

    #[test]
    fn failure_always_resets_learning_phase(prefix in prop::collection::vec(0u8..=5, 0..30),
                                            failing in 0u8..3) {
        let engine = IntervalEngine::default();
        let now = CatalogFactory::epoch();
        let mut state = engine.new_state();
        for q in prefix {
            state = engine.advance(&state, Quality::new(q).unwrap(), 1.0, now).state;
        }
        let after = engine.advance(&state, Quality::new(failing).unwrap(), 1.0, now).state;
        prop_assert_eq!(after.repetitions, 0);
        prop_assert_eq!(after.consecutive_correct, 0);
        prop_assert_eq!(after.interval_days, engine.params().initial_interval);
    }

    #[test]
    fn graduation_implies_track_record(qualities in prop::collection::vec(0u8..=5, 1..40)) {
        let engine = IntervalEngine::default();
        let now = CatalogFactory::epoch();
        let mut state = engine.new_state();
        for q in qualities {
            state = engine.advance(&state, Quality::new(q).unwrap(), 1.0, now).state;
            if state.graduated {
                prop_assert!(state.consecutive_correct >= 2);
                prop_assert!(state.repetitions >= 2);
                prop_assert!(state.success_rate() >= 0.7);
            }
        }
    }

    #[test]
    fn queue_keeps_one_entry_per_item(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let engine = CadenceEngine::default();
        let catalog = CatalogFactory::language_course();
        let mut now = CatalogFactory::epoch();
        let mut learner = engine.new_learner("prop", &catalog, None, now).unwrap();
        let mut known = std::collections::BTreeSet::new();

        for op in ops {
            match op {
                Op::Enqueue(i) => {
                    engine.enqueue(&mut learner, ITEM_IDS[i], ContentType::Vocabulary, now);
                    known.insert(ITEM_IDS[i]);
                }
                Op::Grade { item, quality, latency } => {
                    let event = ReviewEvent::new(
                        ITEM_IDS[item],
                        Quality::new(quality).unwrap(),
                        latency,
                        ContentType::Grammar,
                    )
                    .unwrap();
                    engine.grade(&mut learner, &event, now).unwrap();
                    known.insert(ITEM_IDS[item]);
                }
                Op::Poll { limit, include_future } => {
                    let batch = engine.poll_due(&mut learner, limit, include_future, now);
                    prop_assert!(batch.len() <= limit);
                    let mut ids: Vec<&str> = batch.iter().map(|d| d.item_id.as_str()).collect();
                    ids.sort_unstable();
                    ids.dedup();
                    prop_assert_eq!(ids.len(), batch.len());
                }
                Op::Advance(hours) => now += Duration::hours(hours),
            }

            prop_assert_eq!(learner.queue.len(), known.len());
            prop_assert_eq!(learner.queue.entries().count(), known.len());
            for id in &known {
                prop_assert_eq!(learner.queue.entries().filter(|e| e.item_id == *id).count(), 1);
            }
            let factor = learner.queue.global_performance_factor();
            prop_assert!((0.5..=2.0).contains(&factor));
        }
    }

    #[test]
    fn snapshot_roundtrip_is_exact(grades in prop::collection::vec((0..ITEM_IDS.len(), 0u8..=5, 0.0f64..45.0, 0i64..600), 0..40)) {
        let engine = CadenceEngine::default();
        let catalog = CatalogFactory::language_course();
        let mut now = CatalogFactory::epoch();
        let mut learner = engine.new_learner("prop", &catalog, None, now).unwrap();
        engine.start_session(&mut learner, now);

        for (item, quality, latency, minutes) in grades {
            now += Duration::minutes(minutes);
            let event = ReviewEvent::new(
                ITEM_IDS[item],
                Quality::new(quality).unwrap(),
                latency,
                ContentType::ALL[item % ContentType::ALL.len()],
            )
            .unwrap();
            engine.grade(&mut learner, &event, now).unwrap();
        }

        let json = engine.export(&learner, now).to_json().unwrap();
        let restored = engine.import(LearnerSnapshot::from_json(&json).unwrap()).unwrap();
        prop_assert_eq!(restored, learner);
    }
}
