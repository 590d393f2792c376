//! Handler for the explicit visit logging endpoint.

use axum::{
    Extension, Json,
    extract::{ConnectInfo, State},
    http::HeaderMap,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::warn;
use validator::Validate;

use crate::api::dto::visit::{LogVisitRequest, LogVisitResponse};
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_context::extract_request_context;

/// Persists a visit synchronously.
///
/// # Endpoint
///
/// `POST /-/api/log-visit`
///
/// # Request Body
///
/// ```json
/// {
///   "domain": "shunt.to",      // optional, defaults to the Host tenant
///   "slug": "metrics",
///   "referrer": "https://news.example/",
///   "userAgent": "Mozilla/5.0",
///   "ip": "203.0.113.7"
/// }
/// ```
///
/// Omitted client fields fall back to this request's own headers and peer
/// address.
///
/// # Errors
///
/// Returns 400 Bad Request if `slug` is missing, no tenant can be determined,
/// or a field is too long.
/// Returns 500 Internal Server Error if the visit cannot be recorded,
/// including when the slug does not exist.
pub async fn log_visit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<Extension<ConnectInfo<SocketAddr>>>,
    Json(payload): Json<LogVisitRequest>,
) -> Result<Json<LogVisitResponse>, AppError> {
    payload.validate()?;

    let slug = payload
        .slug
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing slug", json!({ "field": "slug" })))?;

    let ctx = extract_request_context(&headers, state.localhost_alias()).ok();

    let domain = match payload.domain.filter(|d| !d.trim().is_empty()) {
        Some(domain) => domain.trim().to_ascii_lowercase(),
        None => ctx
            .as_ref()
            .map(|c| c.domain.clone())
            .ok_or_else(|| AppError::bad_request("Missing domain", json!({ "field": "domain" })))?,
    };

    let (ctx_ip, ctx_referrer, ctx_user_agent) = match ctx {
        Some(c) => (c.ip, c.referrer, c.user_agent),
        None => (None, None, None),
    };
    let peer_ip = peer.map(|Extension(ConnectInfo(addr))| addr.ip().to_string());

    let event = VisitEvent::new(
        domain,
        slug,
        payload.referrer.or(ctx_referrer),
        payload.user_agent.or(ctx_user_agent),
        payload.ip.or(ctx_ip).or(peer_ip),
    );

    state.visit_logger.log_visit(event).await.map_err(|e| {
        warn!(error = %e, "Explicit visit logging failed");
        AppError::internal("Failed to log visit", json!({ "reason": e.to_string() }))
    })?;

    Ok(Json(LogVisitResponse { success: true }))
}
