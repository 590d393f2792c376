//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key of the cached target for `key` within `domain`.
pub fn entry_key(domain: &str, key: &str) -> String {
    format!("{}:{}", domain, key)
}

/// Key of the hit counter for `key` within `domain`.
///
/// Counters live in their own `hits:` keyspace so an increment never touches
/// the string stored at [`entry_key`].
pub fn counter_key(domain: &str, key: &str) -> String {
    format!("hits:{}:{}", domain, key)
}

/// Tenant-namespaced string cache with hit counters.
///
/// Every operation may fail. The cache is never a correctness dependency:
/// callers treat a failed [`CacheService::get`] as a miss and log failed
/// writes without aborting the request.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process map
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached value for `key` in `domain`.
    ///
    /// Returns `Ok(None)` on a miss.
    async fn get(&self, domain: &str, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value, optionally expiring after `ttl`.
    ///
    /// `None` keeps the entry until it is deleted or evicted by the backend.
    async fn set(
        &self,
        domain: &str,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Increments the hit counter for `key` in `domain` and returns the new count.
    async fn increment(&self, domain: &str, key: &str) -> CacheResult<i64>;

    /// Removes the cached value for `key` in `domain`. Counters are kept.
    async fn delete(&self, domain: &str, key: &str) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;

    /// Human-readable backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
