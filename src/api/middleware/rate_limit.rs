//! Rate limiting middleware using token bucket algorithm.

use axum::Router;
use axum::body::Body;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Where rate limit keys come from.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    /// Key on `X-Forwarded-For` / `X-Real-IP` instead of the peer address.
    /// Enable only behind a trusted reverse proxy.
    pub behind_proxy: bool,
}

fn governor_layer<K: KeyExtractor>(
    extractor: K,
    replenish_ms: u64,
    burst_size: u32,
) -> GovernorLayer<K, NoOpMiddleware<QuantaInstant>, Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(extractor)
            .per_millisecond(replenish_ms)
            .burst_size(burst_size)
            .finish()
            .expect("rate limit quotas are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Applies the public limit: one request every 20ms per client, burst 200.
///
/// Covers the redirect path, so it is sized for redirect traffic rather
/// than API calls. Requests over the limit receive `429 Too Many Requests`.
pub fn public<S>(router: Router<S>, limits: RateLimits) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if limits.behind_proxy {
        router.layer(governor_layer(SmartIpKeyExtractor, 20, 200))
    } else {
        router.layer(governor_layer(PeerIpKeyExtractor, 20, 200))
    }
}

/// Applies the admin limit: one request per second per client, burst 10.
pub fn secure<S>(router: Router<S>, limits: RateLimits) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if limits.behind_proxy {
        router.layer(governor_layer(SmartIpKeyExtractor, 1000, 10))
    } else {
        router.layer(governor_layer(PeerIpKeyExtractor, 1000, 10))
    }
}
