//! Removal of stale cache entries after admin mutations.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::infrastructure::cache::CacheService;

/// Deletes `domain:slug` cache entries.
///
/// Failures are logged and reported through the return value; the store
/// mutation that triggered the invalidation stands either way.
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn CacheService>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn CacheService>) -> Self {
        Self { cache }
    }

    /// Drops the cached target for `slug`. Returns false if the cache failed.
    pub async fn invalidate(&self, domain: &str, slug: &str) -> bool {
        match self.cache.delete(domain, slug).await {
            Ok(()) => {
                debug!(domain = %domain, slug = %slug, "Cache entry invalidated");
                true
            }
            Err(e) => {
                metrics::counter!("shunt_cache_errors_total", "op" => "delete").increment(1);
                warn!(domain = %domain, slug = %slug, error = %e, "Cache invalidation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::{CacheError, MemoryCache, MockCacheService};

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("shunt.to", "metrics", "https://shunt.to/metrics", None)
            .await
            .unwrap();

        let invalidator = CacheInvalidator::new(cache.clone());

        assert!(invalidator.invalidate("shunt.to", "metrics").await);
        assert_eq!(cache.peek("shunt.to:metrics"), None);
    }

    #[tokio::test]
    async fn test_invalidate_leaves_other_tenants() {
        let cache = Arc::new(MemoryCache::new());
        cache.set("a.example", "docs", "https://a", None).await.unwrap();
        cache.set("b.example", "docs", "https://b", None).await.unwrap();

        CacheInvalidator::new(cache.clone())
            .invalidate("a.example", "docs")
            .await;

        assert_eq!(cache.peek("b.example:docs").as_deref(), Some("https://b"));
    }

    #[tokio::test]
    async fn test_invalidate_failure_is_reported_not_raised() {
        let mut cache = MockCacheService::new();
        cache
            .expect_delete()
            .times(1)
            .returning(|_, _| Err(CacheError::OperationError("connection reset".into())));

        let invalidator = CacheInvalidator::new(Arc::new(cache));

        assert!(!invalidator.invalidate("shunt.to", "metrics").await);
    }
}
