//! DTOs for the slug resolution endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::entities::Url;

/// Query for `GET /-/api/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub slug: Option<String>,
}

/// A resolved slug, or `{"target": null}` when nothing is redirectable.
#[derive(Debug, Serialize, PartialEq)]
pub struct ResolveResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl ResolveResponse {
    pub fn not_found() -> Self {
        Self {
            id: None,
            target: None,
            domain: None,
        }
    }
}

impl From<Url> for ResolveResponse {
    fn from(url: Url) -> Self {
        Self {
            id: Some(url.id),
            target: Some(url.target),
            domain: Some(url.domain),
        }
    }
}
