//! In-memory content catalog
//!
//! The catalog is read-only to the scheduler except for the per-item
//! engagement average. [`SharedCatalog`] serializes those updates when one
//! catalog serves several learner shards.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::item::{ContentItem, ContentType};
use crate::error::Result;

/// Content records keyed by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentCatalog {
    items: BTreeMap<String, ContentItem>,
}

impl ContentCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records, validating each one
    pub fn from_items(items: impl IntoIterator<Item = ContentItem>) -> Result<Self> {
        let mut catalog = Self::new();
        for item in items {
            catalog.upsert(item)?;
        }
        Ok(catalog)
    }

    /// Insert or replace a record. Returns true if it replaced an existing one.
    pub fn upsert(&mut self, item: ContentItem) -> Result<bool> {
        item.validate()?;
        Ok(self.items.insert(item.id.clone(), item).is_some())
    }

    /// Look up a record
    pub fn get(&self, id: &str) -> Option<&ContentItem> {
        self.items.get(id)
    }

    /// Whether a record exists
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Records in id order
    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.items.values()
    }

    /// Records of one content type
    pub fn by_type(&self, content_type: ContentType) -> impl Iterator<Item = &ContentItem> {
        self.items
            .values()
            .filter(move |item| item.content_type == content_type)
    }

    /// Every distinct skill mentioned by any record
    pub fn skills(&self) -> std::collections::BTreeSet<String> {
        self.items
            .values()
            .flat_map(|item| item.skills.iter().cloned())
            .collect()
    }

    /// Fold an engagement observation into one record. `None` if the id is unknown.
    pub fn record_engagement(&mut self, id: &str, observed: f64, alpha: f64) -> Option<f64> {
        self.items
            .get_mut(id)
            .map(|item| item.apply_engagement(observed, alpha))
    }
}

/// Catalog shared across learner shards.
///
/// Reads take a shared lock; engagement updates take the write lock for the
/// duration of a single item's update.
#[derive(Debug, Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<ContentCatalog>>,
}

impl SharedCatalog {
    /// Wrap a catalog
    pub fn new(catalog: ContentCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    /// Run a closure against a read view of the catalog
    pub fn read<R>(&self, f: impl FnOnce(&ContentCatalog) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Clone of one record
    pub fn get(&self, id: &str) -> Option<ContentItem> {
        self.read(|catalog| catalog.get(id).cloned())
    }

    /// Insert or replace a record
    pub fn upsert(&self, item: ContentItem) -> Result<bool> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.upsert(item)
    }

    /// Atomic engagement update for one record
    pub fn record_engagement(&self, id: &str, observed: f64, alpha: f64) -> Option<f64> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.record_engagement(id, observed, alpha)
    }

    /// Copy of the whole catalog
    pub fn to_catalog(&self) -> ContentCatalog {
        self.read(Clone::clone)
    }
}
