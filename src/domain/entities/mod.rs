//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Domain`] - A tenant identified by its host name
//! - [`Url`] - A slug to target mapping owned by a tenant
//! - [`Visit`] - An analytics event recorded for a resolved redirect
//!
//! Creation and mutation inputs live next to their entity:
//! `NewDomain`, `NewUrl`, `UrlPatch`, `NewVisit`.

pub mod domain;
pub mod url;
pub mod visit;

pub use domain::{Domain, NewDomain};
pub use url::{NewUrl, TopUrl, Url, UrlPatch};
pub use visit::{NewVisit, Visit};
