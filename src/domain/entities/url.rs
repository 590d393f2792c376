//! Url entity: a slug mapping with an enabled flag and a validity window.

use chrono::{DateTime, Utc};

/// A slug to target mapping within a tenant.
///
/// Availability is the conjunction of [`Url::enabled`] and the validity window
/// checked by [`Url::is_live_at`]. The window is evaluated on every resolution,
/// never stored as a derived flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    pub id: i64,
    pub domain_id: i64,
    /// Host of the owning domain.
    pub domain: String,
    pub slug: String,
    pub target: String,
    pub enabled: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Url {
    /// Returns true if `now` falls inside `[start_at, end_at]`.
    ///
    /// Both bounds are inclusive; a missing `end_at` means the window never closes.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        if now < self.start_at {
            return false;
        }
        !self.end_at.is_some_and(|end| now > end)
    }

    /// Returns true if the Url is enabled and inside its window at `now`.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.is_live_at(now)
    }
}

/// Input data for creating a Url.
#[derive(Debug, Clone)]
pub struct NewUrl {
    pub domain_id: i64,
    pub slug: String,
    pub target: String,
    pub enabled: bool,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing Url.
///
/// `None` fields are left unchanged. `end_at: Some(None)` clears the end of
/// the window; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default)]
pub struct UrlPatch {
    pub slug: Option<String>,
    pub target: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<Option<DateTime<Utc>>>,
}

impl UrlPatch {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.target.is_none()
            && self.start_at.is_none()
            && self.end_at.is_none()
    }
}

/// A Url together with its visit count over some window.
#[derive(Debug, Clone)]
pub struct TopUrl {
    pub id: i64,
    pub slug: String,
    pub target: String,
    pub visits: i64,
}
