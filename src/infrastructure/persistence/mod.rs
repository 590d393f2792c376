//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits using SQLx
//! runtime-checked queries mapped through [`sqlx::FromRow`] row types.
//!
//! # Repositories
//!
//! - [`PgDomainRepository`] - Tenant lookup and provisioning
//! - [`PgUrlRepository`] - Slug mappings and top-slug queries
//! - [`PgVisitRepository`] - Visit inserts

pub mod pg_domain_repository;
pub mod pg_url_repository;
pub mod pg_visit_repository;

pub use pg_domain_repository::PgDomainRepository;
pub use pg_url_repository::PgUrlRepository;
pub use pg_visit_repository::PgVisitRepository;
