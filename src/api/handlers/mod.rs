//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod log_visit;
pub mod metrics;
pub mod resolve;
pub mod site;
pub mod urls;

pub use health::health_handler;
pub use log_visit::log_visit_handler;
pub use metrics::metrics_handler;
pub use resolve::resolve_handler;
pub use site::{site_handler, top_handler};
pub use urls::{
    create_url_handler, delete_url_handler, list_urls_handler, toggle_url_handler,
    update_url_handler,
};
