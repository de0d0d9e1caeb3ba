//! Local document cache.
//!
//! [`DocumentCache`] is the client-held mirror of documents seen so far. It
//! never talks to the network and never evicts on its own: entries are added
//! when documents are iterated, fetched or created, and removed only through
//! [`DocumentCache::remove`] and [`DocumentCache::clear`].

use std::collections::{HashMap, hash_map::Entry};

use crate::document::JsonDocument;

/// Insertion-ordered map from document id to the latest known representation.
///
/// Re-inserting an id replaces its document but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    order: Vec<String>,
    entries: HashMap<String, JsonDocument>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches `document` under `id` and returns a reference to the cached value.
    pub fn insert(&mut self, id: impl Into<String>, document: JsonDocument) -> &JsonDocument {
        match self.entries.entry(id.into()) {
            Entry::Occupied(mut entry) => {
                entry.insert(document);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(document)
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&JsonDocument> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Evicts a single document.
    pub fn remove(&mut self, id: &str) -> Option<JsonDocument> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|key| key != id);

        Some(removed)
    }

    /// Evicts every document.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the cached ids in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Iterates over cached documents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonDocument)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|doc| (id.as_str(), doc)))
    }
}
