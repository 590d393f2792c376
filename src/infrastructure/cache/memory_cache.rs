//! In-process cache implementation.

use super::service::{CacheResult, CacheService, counter_key, entry_key};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, (String, Option<Instant>)>,
    counters: HashMap<String, i64>,
}

/// A process-local cache with the same key layout as [`super::RedisCache`].
///
/// Expired entries are dropped lazily on read. Not shared between server
/// instances, so only suitable for tests and single-node development.
#[derive(Debug, Default)]
pub struct MemoryCache {
    inner: Mutex<Inner>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup by full key, ignoring expiry bookkeeping.
    pub fn peek(&self, full_key: &str) -> Option<String> {
        self.lock().entries.get(full_key).map(|(v, _)| v.clone())
    }

    /// Current counter value for `key` in `domain`.
    pub fn hits(&self, domain: &str, key: &str) -> i64 {
        self.lock()
            .counters
            .get(&counter_key(domain, key))
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned map only means a panicking test thread; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, domain: &str, key: &str) -> CacheResult<Option<String>> {
        let key = entry_key(domain, key);
        let mut inner = self.lock();

        let expired = matches!(
            inner.entries.get(&key),
            Some((_, Some(expires))) if *expires <= Instant::now()
        );
        if expired {
            inner.entries.remove(&key);
            return Ok(None);
        }

        Ok(inner.entries.get(&key).map(|(value, _)| value.clone()))
    }

    async fn set(
        &self,
        domain: &str,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let expires = ttl.map(|t| Instant::now() + t);
        self.lock()
            .entries
            .insert(entry_key(domain, key), (value.to_string(), expires));
        Ok(())
    }

    async fn increment(&self, domain: &str, key: &str) -> CacheResult<i64> {
        let mut inner = self.lock();
        let counter = inner.counters.entry(counter_key(domain, key)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn delete(&self, domain: &str, key: &str) -> CacheResult<()> {
        self.lock().entries.remove(&entry_key(domain, key));
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
