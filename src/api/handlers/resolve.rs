//! Handler for the slug resolution endpoint.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde_json::json;

use crate::api::dto::resolve::{ResolveQuery, ResolveResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_context::extract_request_context;

/// Resolves a slug for the Host tenant without redirecting.
///
/// # Endpoint
///
/// `GET /-/api/resolve?slug={slug}`
///
/// Bypasses the cache and applies the same enabled/window rules as the
/// redirect path. Does not log a visit.
///
/// # Response
///
/// ```json
/// { "id": 1, "target": "https://shunt.to/metrics", "domain": "shunt.to" }
/// ```
///
/// Unknown, disabled, and out-of-window slugs answer `200` with `{"target": null}`.
///
/// # Errors
///
/// Returns 400 Bad Request if `slug` is missing or the Host header is unusable.
/// Returns 500 Internal Server Error if the store fails.
pub async fn resolve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, AppError> {
    let slug = query
        .slug
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing slug", json!({ "param": "slug" })))?;

    let ctx = extract_request_context(&headers, state.localhost_alias())?;

    let response = match state.resolver.resolve(&ctx.domain, &slug).await? {
        Some(url) => ResolveResponse::from(url),
        None => ResolveResponse::not_found(),
    };

    Ok(Json(response))
}
