//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService, counter_key, entry_key};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Redis cache for slug lookups and hit counters.
///
/// Uses `ConnectionManager` for automatic reconnection; clones share the
/// underlying multiplexed connection. Errors are returned to the caller,
/// which decides how to degrade.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self { client: manager })
    }
}

/// Expiry in whole milliseconds, rounded down so an entry never outlives `ttl`.
///
/// `None` when less than a millisecond remains, since `PSETEX` rejects zero.
fn expiry_millis(ttl: Duration) -> Option<u64> {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    (millis > 0).then_some(millis)
}

fn op_error(op: &str, key: &str, e: redis::RedisError) -> CacheError {
    CacheError::OperationError(format!("Redis {} failed for {}: {}", op, key, e))
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, domain: &str, key: &str) -> CacheResult<Option<String>> {
        let key = entry_key(domain, key);
        let mut conn = self.client.clone();

        let value = conn
            .get::<_, Option<String>>(&key)
            .await
            .map_err(|e| op_error("GET", &key, e))?;

        debug!(key = %key, hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn set(
        &self,
        domain: &str,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let key = entry_key(domain, key);
        let mut conn = self.client.clone();

        match ttl.map(expiry_millis) {
            // Under a millisecond left: the entry would already be stale.
            Some(None) => {
                debug!(key = %key, "Redis SET skipped, entry expires immediately");
                return Ok(());
            }
            Some(Some(millis)) => conn
                .pset_ex::<_, _, ()>(&key, value, millis)
                .await
                .map_err(|e| op_error("PSETEX", &key, e))?,
            None => conn
                .set::<_, _, ()>(&key, value)
                .await
                .map_err(|e| op_error("SET", &key, e))?,
        }

        debug!(key = %key, ttl_ms = ttl.and_then(expiry_millis), "Redis SET");
        Ok(())
    }

    async fn increment(&self, domain: &str, key: &str) -> CacheResult<i64> {
        let key = counter_key(domain, key);
        let mut conn = self.client.clone();

        conn.incr::<_, _, i64>(&key, 1)
            .await
            .map_err(|e| op_error("INCR", &key, e))
    }

    async fn delete(&self, domain: &str, key: &str) -> CacheResult<()> {
        let key = entry_key(domain, key);
        let mut conn = self.client.clone();

        let deleted = conn
            .del::<_, i64>(&key)
            .await
            .map_err(|e| op_error("DEL", &key, e))?;

        if deleted > 0 {
            debug!(key = %key, "Redis DEL");
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
