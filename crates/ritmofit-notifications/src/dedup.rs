//! Delivered-notification memory.
//!
//! Bounded LRU window over notification ids. Ids older than the configured
//! TTL, or pushed out by capacity, may be delivered again; a notification
//! resurfacing after that long is treated as a legitimate re-delivery.

use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::config::PollingConfig;
use crate::types::NotificationId;

pub struct DedupCache {
    entries: Cache<NotificationId, ()>,
}

impl DedupCache {
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            entries: builder.build(),
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.dedup_capacity, config.dedup_ttl)
    }

    pub fn has_been_delivered(&self, id: &NotificationId) -> bool {
        self.entries.contains_key(id)
    }

    /// Idempotent; marking an id twice is harmless.
    pub fn mark_delivered(&self, id: &NotificationId) {
        self.entries.insert(id.clone(), ());
    }

    /// Forget every id delivered up to now.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}
