//! DTOs for the admin Url endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use validator::Validate;

use crate::domain::entities::{NewUrl, Url, UrlPatch};

/// Request body for `POST /-/api/urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    #[validate(length(min = 1, max = 64))]
    pub slug: String,

    #[validate(length(min = 1, max = 2048))]
    pub target: String,

    /// Defaults to `true`.
    pub enabled: Option<bool>,

    /// Defaults to the time of creation.
    pub start_at: Option<DateTime<Utc>>,

    pub end_at: Option<DateTime<Utc>>,
}

impl CreateUrlRequest {
    /// Converts into a [`NewUrl`] for the given tenant.
    pub fn into_new_url(self, domain_id: i64) -> NewUrl {
        NewUrl {
            domain_id,
            slug: self.slug,
            target: self.target,
            enabled: self.enabled.unwrap_or(true),
            start_at: self.start_at,
            end_at: self.end_at,
        }
    }
}

/// Request body for `PATCH /-/api/urls/{id}`.
///
/// All fields are optional; only provided fields are changed.
///
/// # `end_at` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear the end of the window
/// - **Timestamp** → set a new end
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUrlRequest {
    #[validate(length(min = 1, max = 64))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 2048))]
    pub target: Option<String>,

    pub start_at: Option<DateTime<Utc>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub end_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateUrlRequest> for UrlPatch {
    fn from(r: UpdateUrlRequest) -> Self {
        UrlPatch {
            slug: r.slug,
            target: r.target,
            start_at: r.start_at,
            end_at: r.end_at,
        }
    }
}

/// Request body for `POST /-/api/urls/{slug}/toggle`.
#[derive(Debug, Deserialize)]
pub struct ToggleUrlRequest {
    pub enabled: bool,
}

/// JSON representation of a Url.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub id: i64,
    pub slug: String,
    pub target: String,
    pub short_url: String,
    pub enabled: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Url> for UrlResponse {
    fn from(u: Url) -> Self {
        Self {
            short_url: format!("https://{}/{}", u.domain, u.slug),
            id: u.id,
            slug: u.slug,
            target: u.target,
            enabled: u.enabled,
            start_at: u.start_at,
            end_at: u.end_at,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UrlListResponse {
    pub total: usize,
    pub items: Vec<UrlResponse>,
}
