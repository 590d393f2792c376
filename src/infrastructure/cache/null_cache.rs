//! No-op cache implementation for disabled caching.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Used when Redis is not configured or unreachable at startup. Every lookup
/// misses, so each redirect goes through the resolver.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get(&self, _domain: &str, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set(
        &self,
        _domain: &str,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn increment(&self, _domain: &str, _key: &str) -> CacheResult<i64> {
        Ok(0)
    }

    async fn delete(&self, _domain: &str, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}
