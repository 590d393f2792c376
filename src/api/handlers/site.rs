//! Handlers for public tenant metadata.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use validator::Validate;

use crate::api::dto::site::{SiteResponse, TopQuery, TopResponse, TopUrlItem};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_context::extract_request_context;

/// Returns display settings of the Host tenant.
///
/// # Endpoint
///
/// `GET /-/api/site`
///
/// # Errors
///
/// Returns 404 Not Found if the host is not a registered domain.
pub async fn site_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SiteResponse>, AppError> {
    let ctx = extract_request_context(&headers, state.localhost_alias())?;
    let domain = state.domain_service.get_by_host(&ctx.domain).await?;

    Ok(Json(domain.into()))
}

/// Lists the most (or least) visited slugs of the Host tenant.
///
/// # Endpoint
///
/// `GET /-/api/top?limit=10&hours=24&order=desc`
///
/// `order` is one of `desc`, `asc`, `rand`.
///
/// # Errors
///
/// Returns 404 Not Found if the host is unknown or does not publish top slugs.
/// Returns 400 Bad Request if `limit` or `hours` are out of range.
pub async fn top_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopResponse>, AppError> {
    query.validate()?;

    let ctx = extract_request_context(&headers, state.localhost_alias())?;
    let domain = state.domain_service.get_by_host(&ctx.domain).await?;

    let hours = query.hours.unwrap_or(TopQuery::DEFAULT_HOURS);
    let limit = query.limit.unwrap_or(TopQuery::DEFAULT_LIMIT);

    let items = state
        .url_service
        .top(&domain, limit, hours, query.order)
        .await?
        .into_iter()
        .map(TopUrlItem::from)
        .collect();

    Ok(Json(TopResponse { hours, items }))
}
