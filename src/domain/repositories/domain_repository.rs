//! Repository trait for tenant domains.

use crate::domain::entities::{Domain, NewDomain};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for tenant domains.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgDomainRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// Finds a domain by its host (e.g. "shunt.to").
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_host(&self, host: &str) -> Result<Option<Domain>, AppError>;

    /// Finds a domain by its database ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Domain>, AppError>;

    /// Provisions a new tenant.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the host is already registered.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_domain: NewDomain) -> Result<Domain, AppError>;

    /// Lists all tenants ordered by host.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self) -> Result<Vec<Domain>, AppError>;

    /// Replaces the tenant's admin credential hash.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_admin_token_hash(&self, id: i64, token_hash: &str) -> Result<(), AppError>;
}
