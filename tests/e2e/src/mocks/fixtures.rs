//! Test Data Factory
//!
//! Provides catalogs for test scenarios:
//! - A small language course with skills and prerequisites
//! - Uniform batches for stress testing
//! - Fixed timestamps so scenarios are reproducible

use cadence_core::{ContentCatalog, ContentItem, ContentType};
use chrono::{DateTime, TimeZone, Utc};

/// Factory for creating test catalogs
pub struct CatalogFactory;

impl CatalogFactory {
    /// Fixed starting point for scenarios (a Monday morning)
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    /// One validated item
    pub fn item(
        id: &str,
        content_type: ContentType,
        difficulty: f64,
        skills: &[&str],
        minutes: u32,
    ) -> ContentItem {
        ContentItem::new(id, content_type, difficulty)
            .expect("valid test item")
            .with_skills(skills.iter().copied())
            .with_minutes(minutes)
    }

    /// Small Spanish course.
    ///
    /// `reading-cafe` requires `grammar-present`; `listening-dialogue`
    /// requires `vocab-food`.
    pub fn language_course() -> ContentCatalog {
        let items = vec![
            Self::item("vocab-greetings", ContentType::Vocabulary, 0.20, &["greetings"], 3),
            Self::item("vocab-food", ContentType::Vocabulary, 0.30, &["food"], 4),
            Self::item("vocab-travel", ContentType::Vocabulary, 0.45, &["travel"], 4),
            Self::item("grammar-present", ContentType::Grammar, 0.40, &["verbs", "present"], 8),
            Self::item("grammar-past", ContentType::Grammar, 0.65, &["verbs", "past"], 10),
            Self::item("reading-cafe", ContentType::Reading, 0.50, &["food", "present"], 12)
                .with_prerequisites(["grammar-present"]),
            Self::item("listening-dialogue", ContentType::Listening, 0.55, &["greetings", "food"], 6)
                .with_prerequisites(["vocab-food"]),
            Self::item("speaking-intro", ContentType::Speaking, 0.35, &["greetings"], 5),
            Self::item("quiz-basics", ContentType::Quiz, 0.30, &["greetings", "food", "verbs"], 5),
            Self::item("writing-postcard", ContentType::Writing, 0.70, &["travel", "past"], 15),
        ];
        ContentCatalog::from_items(items).expect("valid test catalog")
    }

    /// `count` items cycling through every content type and difficulty decile
    pub fn uniform_batch(count: usize) -> ContentCatalog {
        let items = (0..count).map(|i| {
            let content_type = ContentType::ALL[i % ContentType::ALL.len()];
            let difficulty = (i % 10) as f64 / 10.0 + 0.05;
            let skill = format!("skill-{}", i % 7);
            Self::item(&format!("item-{i:03}"), content_type, difficulty, &[skill.as_str()], 5)
        });
        ContentCatalog::from_items(items).expect("valid batch catalog")
    }
}
