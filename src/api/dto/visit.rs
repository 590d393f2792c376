//! DTOs for the visit logging endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for `POST /-/api/log-visit`.
///
/// `domain` defaults to the request's Host tenant when omitted.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogVisitRequest {
    #[validate(length(max = 255))]
    pub domain: Option<String>,
    pub slug: Option<String>,
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    #[validate(length(max = 1024))]
    pub user_agent: Option<String>,
    #[validate(length(max = 64))]
    pub ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogVisitResponse {
    pub success: bool,
}
