//! Process-scoped TTL cache in front of the template store.
//!
//! Entries are keyed by `(location, key)` and hold either the template body or
//! the fact that the object does not exist. Both are honored until they
//! expire. Store errors are returned to the caller and never cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::metrics::{CacheMetrics, StoreMetrics};
use crate::store::{FetchOutcome, ObjectStore, StoreError};

#[derive(Debug, Clone)]
struct CacheEntry {
    content: Option<String>,
    /// `None` when `now + ttl` overflows; such entries never expire
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Template cache shared by every batch served by the process.
pub struct TemplateCache {
    store: Arc<dyn ObjectStore>,
    ttl: Duration,
    entries: DashMap<(String, String), CacheEntry>,
}

impl TemplateCache {
    pub fn new(store: Arc<dyn ObjectStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Look up a template body, fetching from the store on a miss.
    ///
    /// Returns `Ok(None)` when the object does not exist.
    pub async fn get(&self, location: &str, key: &str) -> Result<Option<String>, StoreError> {
        let cache_key = (location.to_string(), key.to_string());
        let now = Instant::now();

        // The map guard must not be held across the fetch below
        let cached = self
            .entries
            .get(&cache_key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.content.clone());

        if let Some(content) = cached {
            CacheMetrics::record_hit();
            tracing::debug!(location = %location, key = %key, "Template cache hit");
            return Ok(content);
        }

        CacheMetrics::record_miss();
        tracing::debug!(location = %location, key = %key, "Template cache miss");

        let outcome = match self.store.fetch(location, key).await {
            Ok(outcome) => outcome,
            Err(e) => {
                StoreMetrics::record_error();
                tracing::error!(
                    location = %location,
                    key = %key,
                    error = %e,
                    "Error fetching template from store"
                );
                return Err(e);
            }
        };

        if outcome.is_found() {
            StoreMetrics::record_found();
        } else {
            StoreMetrics::record_not_found();
        }
        let content = outcome.into_content();

        // Override keys are unbounded; evict expired entries on every fill
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));

        let entry = CacheEntry {
            content: content.clone(),
            expires_at: now.checked_add(self.ttl),
        };
        self.entries.insert(cache_key, entry);
        CacheMetrics::set_entries(self.entries.len());

        Ok(content)
    }

    /// Number of entries held. Expired entries are evicted on the next miss.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Name of the backing store backend.
    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}
