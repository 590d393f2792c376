//! Slug resolution against the durable store.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::domain::entities::Url;
use crate::domain::repositories::{DomainRepository, UrlRepository};
use crate::error::AppError;

/// Resolves `(domain, slug)` to a currently redirectable [`Url`].
///
/// Only enabled Urls inside their validity window resolve. The cache is never
/// consulted here; callers put a cache in front.
pub struct Resolver {
    domains: Arc<dyn DomainRepository>,
    urls: Arc<dyn UrlRepository>,
}

impl Resolver {
    pub fn new(domains: Arc<dyn DomainRepository>, urls: Arc<dyn UrlRepository>) -> Self {
        Self { domains, urls }
    }

    /// Resolves a slug as of now.
    ///
    /// Returns `Ok(None)` for an unknown tenant, an unknown or disabled slug,
    /// or a Url outside its window.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store fails. This is never a
    /// negative result and must not be cached as one.
    pub async fn resolve(&self, domain: &str, slug: &str) -> Result<Option<Url>, AppError> {
        self.resolve_at(domain, slug, Utc::now()).await
    }

    /// Resolves a slug as of `now`. See [`Resolver::resolve`].
    pub async fn resolve_at(
        &self,
        domain: &str,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Url>, AppError> {
        let Some(tenant) = self.domains.find_by_host(domain).await? else {
            debug!(domain = %domain, slug = %slug, "Unknown domain, cannot resolve slug");
            return Ok(None);
        };

        let Some(url) = self.urls.find_by_slug(tenant.id, slug, Some(true)).await? else {
            debug!(domain = %domain, slug = %slug, "Slug not found or disabled");
            return Ok(None);
        };

        if !url.is_live_at(now) {
            debug!(
                domain = %domain,
                slug = %slug,
                start_at = %url.start_at,
                end_at = ?url.end_at,
                "Slug outside its validity window"
            );
            return Ok(None);
        }

        Ok(Some(url))
    }
}
