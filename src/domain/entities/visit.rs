//! Visit entity representing a single resolved redirect.

use chrono::{DateTime, Utc};

/// An analytics event recorded when a slug is resolved and redirected.
///
/// Geo fields are populated later by an out-of-band backfill job keyed on
/// [`Visit::ip`]; the redirect path never writes them.
#[derive(Debug, Clone)]
pub struct Visit {
    pub id: i64,
    pub visited_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub domain_id: i64,
    pub url_id: Option<i64>,
}

/// Input data for recording a visit.
///
/// `url_id` and `domain_id` must reference existing rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub visited_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub domain_id: i64,
    pub url_id: i64,
}
