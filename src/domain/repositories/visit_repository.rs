//! Repository trait for visit analytics.

use crate::domain::entities::{NewVisit, Visit};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for recording visits.
///
/// The redirect path only ever writes visits; reads belong to analytics
/// tooling outside this crate.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVisitRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Inserts a visit row and returns it with geo fields unset.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_visit: NewVisit) -> Result<Visit, AppError>;
}
