//! DTOs for the public tenant endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::TopOrder;
use crate::domain::entities::{Domain, TopUrl};

/// Public tenant information for `GET /-/api/site`.
#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub host: String,
    pub title: String,
    pub description: Option<String>,
    pub show_input: bool,
    pub show_top_slugs: bool,
}

impl From<Domain> for SiteResponse {
    fn from(d: Domain) -> Self {
        Self {
            host: d.host,
            title: d.title,
            description: d.description,
            show_input: d.show_input,
            show_top_slugs: d.show_top_slugs,
        }
    }
}

/// Query for `GET /-/api/top`.
#[derive(Debug, Deserialize, Validate)]
pub struct TopQuery {
    /// Number of slugs to return (1-100, default 10).
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Window size in hours (1-8760, default 24).
    #[validate(range(min = 1, max = 8760))]
    pub hours: Option<i64>,
    #[serde(default)]
    pub order: TopOrder,
}

impl TopQuery {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const DEFAULT_HOURS: i64 = 24;
}

#[derive(Debug, Serialize)]
pub struct TopUrlItem {
    pub slug: String,
    pub target: String,
    pub visits: i64,
}

impl From<TopUrl> for TopUrlItem {
    fn from(t: TopUrl) -> Self {
        Self {
            slug: t.slug,
            target: t.target,
            visits: t.visits,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub hours: i64,
    pub items: Vec<TopUrlItem>,
}
