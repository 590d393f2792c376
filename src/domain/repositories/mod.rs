//! Repository trait definitions for the domain layer.
//!
//! These traits are the durable-store collaborators of the redirect core.
//! Implementations live in `crate::infrastructure::persistence`; mock
//! implementations are generated with `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`DomainRepository`] - Tenant lookup and provisioning
//! - [`UrlRepository`] - Slug mappings: lookup, admin mutations, top slugs
//! - [`VisitRepository`] - Visit inserts

pub mod domain_repository;
pub mod url_repository;
pub mod visit_repository;

pub use domain_repository::DomainRepository;
pub use url_repository::UrlRepository;
pub use visit_repository::VisitRepository;

#[cfg(test)]
pub use domain_repository::MockDomainRepository;
#[cfg(test)]
pub use url_repository::MockUrlRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
