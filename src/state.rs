//! Shared application state injected into handlers and middleware.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::services::{
    AuthService, CacheInvalidator, DomainService, RedirectService, Resolver, UrlService,
    VisitLogger,
};
use crate::domain::repositories::{DomainRepository, UrlRepository, VisitRepository};
use crate::domain::visit_event::VisitRecorder;
use crate::infrastructure::cache::CacheService;

/// Store collaborators the services are built from.
#[derive(Clone)]
pub struct Repositories {
    pub domains: Arc<dyn DomainRepository>,
    pub urls: Arc<dyn UrlRepository>,
    pub visits: Arc<dyn VisitRepository>,
}

/// Settings that shape request handling.
#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    pub token_signing_secret: String,
    pub cache_ttl: Option<Duration>,
    pub localhost_alias: Option<String>,
}

/// Cheaply cloneable handle shared by every request.
///
/// Holding an `AppState` keeps a [`VisitRecorder`] alive, so the visit worker
/// only finishes once every clone is dropped.
#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService>,
    pub resolver: Arc<Resolver>,
    pub visit_logger: Arc<VisitLogger>,
    pub url_service: Arc<UrlService>,
    pub domain_service: Arc<DomainService>,
    pub auth_service: Arc<AuthService>,
    pub cache: Arc<dyn CacheService>,
    pub visit_recorder: VisitRecorder,
    pub localhost_alias: Option<Arc<str>>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires every service from the given collaborators.
    pub fn new(
        repos: Repositories,
        cache: Arc<dyn CacheService>,
        visit_recorder: VisitRecorder,
        options: StateOptions,
    ) -> Self {
        let resolver = Arc::new(Resolver::new(repos.domains.clone(), repos.urls.clone()));

        let redirect_service = Arc::new(RedirectService::new(
            cache.clone(),
            resolver.clone(),
            visit_recorder.clone(),
            options.cache_ttl,
        ));

        let visit_logger = Arc::new(VisitLogger::new(
            repos.domains.clone(),
            repos.urls.clone(),
            repos.visits,
        ));

        let url_service = Arc::new(UrlService::new(
            repos.urls,
            CacheInvalidator::new(cache.clone()),
        ));

        let domain_service = Arc::new(DomainService::new(
            repos.domains.clone(),
            options.token_signing_secret.clone(),
        ));

        let auth_service = Arc::new(AuthService::new(
            repos.domains,
            options.token_signing_secret,
        ));

        Self {
            redirect_service,
            resolver,
            visit_logger,
            url_service,
            domain_service,
            auth_service,
            cache,
            visit_recorder,
            localhost_alias: options.localhost_alias.map(Arc::from),
            metrics: None,
        }
    }

    /// Exposes the recorder's counters on `/-/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn localhost_alias(&self) -> Option<&str> {
        self.localhost_alias.as_deref()
    }
}
