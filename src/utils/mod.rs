//! Helpers shared by the HTTP layer, services and the admin CLI.
//!
//! - [`request_context`] - Tenant host and client metadata from headers
//! - [`slug`] - Slug validation and admin token generation
//! - [`url_normalizer`] - Redirect target normalization

pub mod request_context;
pub mod slug;
pub mod url_normalizer;
