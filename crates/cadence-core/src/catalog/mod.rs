//! Content Catalog Module
//!
//! Opaque catalog records from the lesson store:
//! - Content types as a closed enum
//! - Validated difficulty, skills and prerequisites
//! - Engagement running average (the only field the core writes)

mod item;
mod store;

pub use item::{ContentItem, ContentType, DEFAULT_ENGAGEMENT};
pub use store::{ContentCatalog, SharedCatalog};
