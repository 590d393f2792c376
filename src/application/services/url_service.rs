//! Administrative Url mutations and the public top-slugs listing.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::cache_invalidator::CacheInvalidator;
use crate::domain::entities::{Domain, NewUrl, TopUrl, Url, UrlPatch};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use crate::utils::slug::validate_slug;
use crate::utils::url_normalizer::normalize_target;
use serde_json::json;

/// Upper bound on rows fetched for the top-slugs listing.
pub const MAX_TOP_LIMIT: i64 = 100;

/// Ordering of the top-slugs listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopOrder {
    #[default]
    Desc,
    Asc,
    /// Random sample of the most visited slugs.
    Rand,
}

/// Service for the tenant-scoped Url lifecycle.
///
/// Every mutation that could leave a stale `domain:slug` entry behind calls
/// the [`CacheInvalidator`] before returning. A failed invalidation is logged
/// and does not undo the store change.
pub struct UrlService {
    urls: Arc<dyn UrlRepository>,
    invalidator: CacheInvalidator,
}

impl UrlService {
    pub fn new(urls: Arc<dyn UrlRepository>, invalidator: CacheInvalidator) -> Self {
        Self { urls, invalidator }
    }

    /// Lists every Url of the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list(&self, domain: &Domain) -> Result<Vec<Url>, AppError> {
        self.urls.list(domain.id).await
    }

    /// Creates a Url for the tenant.
    ///
    /// The slug is validated, the target normalized and the window checked.
    /// `domain_id` is always taken from `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid slug, target or window.
    /// Returns [`AppError::Conflict`] if the slug already exists for the tenant.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn add(&self, domain: &Domain, new_url: NewUrl) -> Result<Url, AppError> {
        validate_slug(&new_url.slug)?;
        let target = normalize(&new_url.target)?;
        let start_at = new_url.start_at.unwrap_or_else(Utc::now);
        validate_window(start_at, new_url.end_at)?;

        // The validated start is stored as-is, never the database clock.
        let url = self
            .urls
            .create(NewUrl {
                domain_id: domain.id,
                target,
                start_at: Some(start_at),
                ..new_url
            })
            .await?;

        info!(domain = %domain.host, slug = %url.slug, url_id = url.id, "Url created");
        Ok(url)
    }

    /// Applies a partial update to the Url with `id`.
    ///
    /// Both the old and the new slug are invalidated, as is the unchanged slug
    /// when only the target or window moves.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty patch or invalid fields.
    /// Returns [`AppError::NotFound`] if the Url does not belong to the tenant.
    /// Returns [`AppError::Conflict`] if the new slug is taken.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn update(
        &self,
        domain: &Domain,
        id: i64,
        mut patch: UrlPatch,
    ) -> Result<Url, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request(
                "Nothing to update",
                json!({ "fields": ["slug", "target", "start_at", "end_at"] }),
            ));
        }

        let current = self.find_by_id(domain, id).await?;

        if let Some(slug) = &patch.slug {
            validate_slug(slug)?;
        }
        if let Some(target) = patch.target.take() {
            patch.target = Some(normalize(&target)?);
        }
        validate_window(
            patch.start_at.unwrap_or(current.start_at),
            patch.end_at.unwrap_or(current.end_at),
        )?;

        let updated = self.urls.update(id, patch).await?;

        self.invalidator.invalidate(&domain.host, &current.slug).await;
        if updated.slug != current.slug {
            self.invalidator.invalidate(&domain.host, &updated.slug).await;
        }

        info!(domain = %domain.host, slug = %updated.slug, url_id = id, "Url updated");
        Ok(updated)
    }

    /// Enables or disables a Url. Disabling invalidates its cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug does not exist for the tenant.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn toggle(&self, domain: &Domain, slug: &str, enabled: bool) -> Result<Url, AppError> {
        let url = self.find_by_slug(domain, slug).await?;

        self.urls.set_enabled(url.id, enabled).await?;
        if !enabled {
            self.invalidator.invalidate(&domain.host, slug).await;
        }

        info!(domain = %domain.host, slug = %slug, enabled, "Url toggled");
        Ok(Url { enabled, ..url })
    }

    /// Deletes a Url and invalidates its cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug does not exist for the tenant.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn remove(&self, domain: &Domain, slug: &str) -> Result<(), AppError> {
        let url = self.find_by_slug(domain, slug).await?;

        if !self.urls.delete(url.id).await? {
            return Err(not_found_slug(slug));
        }
        self.invalidator.invalidate(&domain.host, slug).await;

        info!(domain = %domain.host, slug = %slug, url_id = url.id, "Url deleted");
        Ok(())
    }

    /// Most visited enabled slugs of the tenant over the last `hours` hours.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the tenant hides its top slugs.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn top(
        &self,
        domain: &Domain,
        limit: i64,
        hours: i64,
        order: TopOrder,
    ) -> Result<Vec<TopUrl>, AppError> {
        self.top_at(domain, limit, hours, order, Utc::now()).await
    }

    async fn top_at(
        &self,
        domain: &Domain,
        limit: i64,
        hours: i64,
        order: TopOrder,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopUrl>, AppError> {
        if !domain.show_top_slugs {
            return Err(AppError::not_found(
                "Top slugs are not published for this domain",
                json!({ "host": domain.host }),
            ));
        }

        let limit = limit.clamp(1, MAX_TOP_LIMIT);
        let since = now - Duration::hours(hours.max(1));

        match order {
            TopOrder::Desc => self.urls.top_urls(domain.id, since, limit, false).await,
            TopOrder::Asc => self.urls.top_urls(domain.id, since, limit, true).await,
            TopOrder::Rand => {
                let mut top = self
                    .urls
                    .top_urls(domain.id, since, MAX_TOP_LIMIT, false)
                    .await?;
                top.shuffle(&mut rand::rng());
                top.truncate(limit as usize);
                Ok(top)
            }
        }
    }

    async fn find_by_slug(&self, domain: &Domain, slug: &str) -> Result<Url, AppError> {
        self.urls
            .find_by_slug(domain.id, slug, None)
            .await?
            .ok_or_else(|| not_found_slug(slug))
    }

    async fn find_by_id(&self, domain: &Domain, id: i64) -> Result<Url, AppError> {
        self.urls
            .find_by_id(domain.id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Url not found", json!({ "id": id })))
    }
}

fn not_found_slug(slug: &str) -> AppError {
    AppError::not_found("Url not found", json!({ "slug": slug }))
}

fn normalize(target: &str) -> Result<String, AppError> {
    normalize_target(target).map_err(|e| {
        AppError::bad_request("Invalid target URL", json!({ "reason": e.to_string() }))
    })
}

fn validate_window(start_at: DateTime<Utc>, end_at: Option<DateTime<Utc>>) -> Result<(), AppError> {
    match end_at {
        Some(end) if end <= start_at => Err(AppError::bad_request(
            "end_at must be after start_at",
            json!({ "start_at": start_at, "end_at": end }),
        )),
        _ => Ok(()),
    }
}
