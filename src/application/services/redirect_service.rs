//! Cache-first redirect decision and its fire-and-forget side effects.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::resolver::Resolver;
use crate::domain::entities::Url;
use crate::domain::visit_event::{VisitEvent, VisitRecorder};
use crate::infrastructure::cache::CacheService;
use crate::utils::request_context::RequestContext;

/// Where a redirect target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectSource {
    Cache,
    Store,
}

impl RedirectSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectSource::Cache => "cache",
            RedirectSource::Store => "store",
        }
    }
}

/// Why a request was handed on to the router instead of redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Unknown tenant or slug, disabled, or outside the validity window.
    NotFound,
    /// The store failed; nothing was cached.
    StoreError,
}

impl PassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassReason::NotFound => "not_found",
            PassReason::StoreError => "store_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    Redirect {
        target: String,
        source: RedirectSource,
    },
    PassThrough(PassReason),
}

/// Cache expiry for a freshly resolved Url.
///
/// The shorter of the configured TTL and the time left until `end_at`, so a
/// cached entry never outlives the Url's window. `None` means no expiry.
pub fn entry_ttl(url: &Url, default_ttl: Option<Duration>, now: DateTime<Utc>) -> Option<Duration> {
    let until_end = url
        .end_at
        .map(|end| (end - now).to_std().unwrap_or(Duration::ZERO));

    match (default_ttl, until_end) {
        (Some(ttl), Some(remaining)) => Some(ttl.min(remaining)),
        (ttl, None) => ttl,
        (None, remaining) => remaining,
    }
}

/// Decides between redirect and pass-through for `(domain, slug)`.
///
/// Reads go cache first, then [`Resolver`]. Cache writes, hit counting and
/// visit logging are detached from the request and never awaited.
pub struct RedirectService {
    cache: Arc<dyn CacheService>,
    resolver: Arc<Resolver>,
    visits: VisitRecorder,
    cache_ttl: Option<Duration>,
}

impl RedirectService {
    pub fn new(
        cache: Arc<dyn CacheService>,
        resolver: Arc<Resolver>,
        visits: VisitRecorder,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            cache,
            resolver,
            visits,
            cache_ttl,
        }
    }

    /// Looks up the redirect target.
    ///
    /// A cache error counts as a miss. A store error passes through without
    /// caching anything.
    pub async fn lookup(&self, domain: &str, slug: &str) -> RedirectDecision {
        match self.cache.get(domain, slug).await {
            Ok(Some(target)) => {
                debug!(domain = %domain, slug = %slug, "Cache hit");
                return self.redirect(target, RedirectSource::Cache);
            }
            Ok(None) => debug!(domain = %domain, slug = %slug, "Cache miss"),
            Err(e) => {
                metrics::counter!("shunt_cache_errors_total", "op" => "get").increment(1);
                warn!(domain = %domain, slug = %slug, error = %e, "Cache read failed, treating as miss");
            }
        }

        match self.resolver.resolve(domain, slug).await {
            Ok(Some(url)) => {
                self.populate(&url);
                self.redirect(url.target, RedirectSource::Store)
            }
            Ok(None) => Self::pass(PassReason::NotFound),
            Err(e) => {
                error!(domain = %domain, slug = %slug, error = %e, "Resolver failed, passing through");
                Self::pass(PassReason::StoreError)
            }
        }
    }

    /// Schedules visit logging and hit counting for a redirect that was issued.
    ///
    /// Returns immediately; neither operation can fail the caller.
    pub fn dispatch_side_effects(&self, ctx: RequestContext, slug: &str) {
        self.visits.record(VisitEvent::new(
            ctx.domain.as_str(),
            slug,
            ctx.referrer,
            ctx.user_agent,
            ctx.ip,
        ));

        let cache = Arc::clone(&self.cache);
        let domain = ctx.domain;
        let slug = slug.to_string();
        tokio::spawn(async move {
            if let Err(e) = cache.increment(&domain, &slug).await {
                metrics::counter!("shunt_cache_errors_total", "op" => "increment").increment(1);
                warn!(domain = %domain, slug = %slug, error = %e, "Hit counter increment failed");
            }
        });
    }

    fn populate(&self, url: &Url) {
        let cache = Arc::clone(&self.cache);
        let ttl = entry_ttl(url, self.cache_ttl, Utc::now());
        let (domain, slug, target) = (url.domain.clone(), url.slug.clone(), url.target.clone());

        tokio::spawn(async move {
            if let Err(e) = cache.set(&domain, &slug, &target, ttl).await {
                metrics::counter!("shunt_cache_errors_total", "op" => "set").increment(1);
                warn!(domain = %domain, slug = %slug, error = %e, "Cache populate failed");
            }
        });
    }

    fn redirect(&self, target: String, source: RedirectSource) -> RedirectDecision {
        metrics::counter!("shunt_redirects_total", "source" => source.as_str()).increment(1);
        RedirectDecision::Redirect { target, source }
    }

    fn pass(reason: PassReason) -> RedirectDecision {
        metrics::counter!("shunt_passthrough_total", "reason" => reason.as_str()).increment(1);
        RedirectDecision::PassThrough(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Domain;
    use crate::domain::repositories::{MockDomainRepository, MockUrlRepository};
    use crate::error::AppError;
    use crate::infrastructure::cache::{CacheError, MemoryCache, MockCacheService};
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn metrics_url() -> Url {
        let now = Utc::now();
        Url {
            id: 1,
            domain_id: 1,
            domain: "shunt.to".to_string(),
            slug: "metrics".to_string(),
            target: "https://shunt.to/metrics".to_string(),
            enabled: true,
            start_at: now - ChronoDuration::days(1),
            end_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn resolver(found: Option<Url>) -> Arc<Resolver> {
        let mut domains = MockDomainRepository::new();
        domains
            .expect_find_by_host()
            .returning(|host| Ok(Some(Domain::new(1, host))));

        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug()
            .returning(move |_, _, _| Ok(found.clone()));

        Arc::new(Resolver::new(Arc::new(domains), Arc::new(urls)))
    }

    fn untouchable_resolver() -> Arc<Resolver> {
        let mut domains = MockDomainRepository::new();
        domains.expect_find_by_host().never();
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug().never();

        Arc::new(Resolver::new(Arc::new(domains), Arc::new(urls)))
    }

    fn recorder() -> (VisitRecorder, mpsc::Receiver<VisitEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (VisitRecorder::new(tx), rx)
    }

    fn context() -> RequestContext {
        RequestContext {
            domain: "shunt.to".to_string(),
            ip: Some("203.0.113.7".to_string()),
            referrer: Some("https://google.com/".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    /// Lets detached tasks spawned on the test runtime run to completion.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_miss_resolves_and_populates_cache() {
        let cache = Arc::new(MemoryCache::new());
        let (visits, _rx) = recorder();
        let service = RedirectService::new(cache.clone(), resolver(Some(metrics_url())), visits, None);

        let decision = service.lookup("shunt.to", "metrics").await;

        assert_eq!(
            decision,
            RedirectDecision::Redirect {
                target: "https://shunt.to/metrics".to_string(),
                source: RedirectSource::Store,
            }
        );

        settle().await;
        assert_eq!(
            cache.peek("shunt.to:metrics").as_deref(),
            Some("https://shunt.to/metrics")
        );
    }

    #[tokio::test]
    async fn test_cache_hit_never_invokes_resolver() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("shunt.to", "metrics", "https://shunt.to/metrics", None)
            .await
            .unwrap();
        let (visits, _rx) = recorder();
        let service = RedirectService::new(cache, untouchable_resolver(), visits, None);

        let decision = service.lookup("shunt.to", "metrics").await;

        assert_eq!(
            decision,
            RedirectDecision::Redirect {
                target: "https://shunt.to/metrics".to_string(),
                source: RedirectSource::Cache,
            }
        );
    }

    #[tokio::test]
    async fn test_not_found_passes_through_and_caches_nothing() {
        let cache = Arc::new(MemoryCache::new());
        let (visits, _rx) = recorder();
        let service = RedirectService::new(cache.clone(), resolver(None), visits, None);

        let decision = service.lookup("shunt.to", "slug0").await;

        assert_eq!(decision, RedirectDecision::PassThrough(PassReason::NotFound));
        settle().await;
        assert_eq!(cache.peek("shunt.to:slug0"), None);
    }

    #[tokio::test]
    async fn test_cache_error_counts_as_miss() {
        let mut cache = MockCacheService::new();
        cache
            .expect_get()
            .returning(|_, _| Err(CacheError::ConnectionError("refused".into())));
        cache.expect_set().returning(|_, _, _, _| Ok(()));

        let (visits, _rx) = recorder();
        let service = RedirectService::new(
            Arc::new(cache),
            resolver(Some(metrics_url())),
            visits,
            None,
        );

        let decision = service.lookup("shunt.to", "metrics").await;

        assert!(matches!(
            decision,
            RedirectDecision::Redirect { source: RedirectSource::Store, .. }
        ));
        settle().await;
    }

    #[tokio::test]
    async fn test_store_error_passes_through_uncached() {
        let mut domains = MockDomainRepository::new();
        domains
            .expect_find_by_host()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        let urls = MockUrlRepository::new();
        let resolver = Arc::new(Resolver::new(Arc::new(domains), Arc::new(urls)));

        let mut cache = MockCacheService::new();
        cache.expect_get().returning(|_, _| Ok(None));
        cache.expect_set().never();

        let (visits, _rx) = recorder();
        let service = RedirectService::new(Arc::new(cache), resolver, visits, None);

        let decision = service.lookup("shunt.to", "metrics").await;

        assert_eq!(decision, RedirectDecision::PassThrough(PassReason::StoreError));
        settle().await;
    }

    #[tokio::test]
    async fn test_side_effects_enqueue_visit_and_count_hit() {
        let cache = Arc::new(MemoryCache::new());
        let (visits, mut rx) = recorder();
        let service = RedirectService::new(cache.clone(), untouchable_resolver(), visits, None);

        service.dispatch_side_effects(context(), "metrics");

        let event = rx.recv().await.unwrap();
        assert_eq!(event.domain, "shunt.to");
        assert_eq!(event.slug, "metrics");
        assert_eq!(event.ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(event.referrer.as_deref(), Some("https://google.com/"));

        settle().await;
        assert_eq!(cache.hits("shunt.to", "metrics"), 1);
    }

    #[tokio::test]
    async fn test_side_effects_survive_closed_queue_and_cache_failure() {
        let mut cache = MockCacheService::new();
        cache
            .expect_increment()
            .returning(|_, _| Err(CacheError::OperationError("timeout".into())));

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let service = RedirectService::new(
            Arc::new(cache),
            untouchable_resolver(),
            VisitRecorder::new(tx),
            None,
        );

        service.dispatch_side_effects(context(), "metrics");
        settle().await;
    }

    #[test]
    fn test_entry_ttl_without_limits() {
        assert_eq!(entry_ttl(&metrics_url(), None, Utc::now()), None);
    }

    #[test]
    fn test_entry_ttl_uses_configured_ttl() {
        let ttl = Some(Duration::from_secs(300));
        assert_eq!(entry_ttl(&metrics_url(), ttl, Utc::now()), ttl);
    }

    #[test]
    fn test_entry_ttl_capped_at_end_of_window() {
        let now = Utc::now();
        let url = Url {
            end_at: Some(now + ChronoDuration::seconds(60)),
            ..metrics_url()
        };

        assert_eq!(entry_ttl(&url, None, now), Some(Duration::from_secs(60)));
        assert_eq!(
            entry_ttl(&url, Some(Duration::from_secs(3600)), now),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            entry_ttl(&url, Some(Duration::from_secs(10)), now),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_entry_ttl_at_end_boundary_is_zero() {
        let now = Utc::now();
        let url = Url {
            end_at: Some(now),
            ..metrics_url()
        };

        assert_eq!(entry_ttl(&url, None, now), Some(Duration::ZERO));
    }
}
