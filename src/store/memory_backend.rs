//! In-memory object store backend using DashMap.
//!
//! Objects are held in memory and lost on restart. Used for tests and for
//! local runs where templates are seeded programmatically.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{FetchOutcome, ObjectStore, StoreError};

/// In-memory object store.
///
/// Counts every fetch so callers can assert how often the store was reached.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), String>,
    fetches: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` at `location`/`key`, replacing any previous object.
    pub fn insert(&self, location: &str, key: &str, content: impl Into<String>) {
        self.objects
            .insert((location.to_string(), key.to_string()), content.into());
    }

    /// Remove an object; returns whether it existed.
    pub fn remove(&self, location: &str, key: &str) -> bool {
        self.objects
            .remove(&(location.to_string(), key.to_string()))
            .is_some()
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, location: &str, key: &str) -> Result<FetchOutcome, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let outcome = match self.objects.get(&(location.to_string(), key.to_string())) {
            Some(content) => FetchOutcome::Found(content.clone()),
            None => FetchOutcome::NotFound,
        };

        tracing::debug!(
            location = %location,
            key = %key,
            found = outcome.is_found(),
            "Fetched object from memory store"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_found_and_not_found() {
        let store = MemoryObjectStore::new();
        store.insert("bucket", "a.vm", "hello");

        assert_eq!(
            store.fetch("bucket", "a.vm").await.unwrap(),
            FetchOutcome::Found("hello".to_string())
        );
        assert_eq!(
            store.fetch("bucket", "missing.vm").await.unwrap(),
            FetchOutcome::NotFound
        );
        // Same key in a different container is a different object
        assert_eq!(
            store.fetch("other", "a.vm").await.unwrap(),
            FetchOutcome::NotFound
        );
        assert_eq!(store.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryObjectStore::new();
        store.insert("bucket", "a.vm", "hello");

        assert!(store.remove("bucket", "a.vm"));
        assert!(!store.remove("bucket", "a.vm"));
        assert_eq!(
            store.fetch("bucket", "a.vm").await.unwrap(),
            FetchOutcome::NotFound
        );
    }
}
