//! Business logic services for the application layer.

pub mod auth_service;
pub mod cache_invalidator;
pub mod domain_service;
pub mod redirect_service;
pub mod resolver;
pub mod url_service;
pub mod visit_logger;

pub use auth_service::AuthService;
pub use cache_invalidator::CacheInvalidator;
pub use domain_service::DomainService;
pub use redirect_service::{PassReason, RedirectDecision, RedirectService, RedirectSource};
pub use resolver::Resolver;
pub use url_service::{TopOrder, UrlService};
pub use visit_logger::{VisitLogger, run_visit_worker};
