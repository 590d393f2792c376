//! Repository trait for slug mappings.

use crate::domain::entities::{NewUrl, TopUrl, Url, UrlPatch};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for Urls.
///
/// Every lookup is scoped by `domain_id`; a slug only has meaning inside its
/// tenant.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUrlRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlRepository: Send + Sync {
    /// Finds a Url by slug within a domain.
    ///
    /// `enabled: Some(flag)` restricts the match to rows with that flag;
    /// `None` matches regardless of the flag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_slug(
        &self,
        domain_id: i64,
        slug: &str,
        enabled: Option<bool>,
    ) -> Result<Option<Url>, AppError>;

    /// Finds a Url by ID within a domain.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, domain_id: i64, id: i64) -> Result<Option<Url>, AppError>;

    /// Lists every Url of a domain ordered by slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, domain_id: i64) -> Result<Vec<Url>, AppError>;

    /// Creates a Url.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug already exists for the domain.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_url: NewUrl) -> Result<Url, AppError>;

    /// Partially updates a Url; `None` fields in the patch are unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the Url does not exist.
    /// Returns [`AppError::Conflict`] if the new slug is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, patch: UrlPatch) -> Result<Url, AppError>;

    /// Sets the enabled flag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the Url does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), AppError>;

    /// Deletes a Url. Returns `Ok(false)` if nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Most visited enabled Urls of a domain with at least one visit since `since`.
    ///
    /// Ordered by visit count, descending unless `ascending` is set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn top_urls(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
        limit: i64,
        ascending: bool,
    ) -> Result<Vec<TopUrl>, AppError>;
}
