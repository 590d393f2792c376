//! Application layer services implementing business logic.
//!
//! Services consume repository and cache traits and provide a clean API for
//! the HTTP layer and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::resolver::Resolver`] - (domain, slug) to a live Url
//! - [`services::redirect_service::RedirectService`] - Cache-first redirect decisions
//! - [`services::visit_logger::VisitLogger`] - Visit persistence and its worker
//! - [`services::cache_invalidator::CacheInvalidator`] - Stale entry removal
//! - [`services::url_service::UrlService`] - Admin Url lifecycle and top slugs
//! - [`services::domain_service::DomainService`] - Tenant provisioning
//! - [`services::auth_service::AuthService`] - Per-tenant admin tokens

pub mod services;
