//! Handlers for tenant-scoped url management.
//!
//! The authenticated [`Domain`] is placed in request extensions by
//! [`crate::api::middleware::auth`].

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::url::{
    CreateUrlRequest, ToggleUrlRequest, UpdateUrlRequest, UrlListResponse, UrlResponse,
};
use crate::domain::entities::Domain;
use crate::error::AppError;
use crate::state::AppState;

/// Lists every url of the tenant, enabled or not.
///
/// # Endpoint
///
/// `GET /-/api/urls`
pub async fn list_urls_handler(
    State(state): State<AppState>,
    Extension(domain): Extension<Domain>,
) -> Result<Json<UrlListResponse>, AppError> {
    let items: Vec<UrlResponse> = state
        .url_service
        .list(&domain)
        .await?
        .into_iter()
        .map(UrlResponse::from)
        .collect();

    Ok(Json(UrlListResponse {
        total: items.len(),
        items,
    }))
}

/// Creates a slug mapping.
///
/// # Endpoint
///
/// `POST /-/api/urls`
///
/// # Request Body
///
/// ```json
/// {
///   "slug": "metrics",
///   "target": "https://shunt.to/metrics",
///   "enabled": true,                          // optional
///   "start_at": "2025-01-01T00:00:00Z",       // optional
///   "end_at": null                            // optional
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for an invalid slug, target, or window.
/// Returns 409 Conflict if the slug is taken in this tenant.
pub async fn create_url_handler(
    State(state): State<AppState>,
    Extension(domain): Extension<Domain>,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    payload.validate()?;

    let url = state
        .url_service
        .add(&domain, payload.into_new_url(domain.id))
        .await?;

    Ok((StatusCode::CREATED, Json(url.into())))
}

/// Partially updates a url by id.
///
/// # Endpoint
///
/// `PATCH /-/api/urls/{id}`
///
/// Absent fields are left unchanged. `"end_at": null` clears the end of the window.
pub async fn update_url_handler(
    State(state): State<AppState>,
    Extension(domain): Extension<Domain>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUrlRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    payload.validate()?;

    let url = state
        .url_service
        .update(&domain, id, payload.into())
        .await?;

    Ok(Json(url.into()))
}

/// Enables or disables a slug. Disabling evicts it from the cache.
///
/// # Endpoint
///
/// `POST /-/api/urls/{slug}/toggle`
pub async fn toggle_url_handler(
    State(state): State<AppState>,
    Extension(domain): Extension<Domain>,
    Path(slug): Path<String>,
    Json(payload): Json<ToggleUrlRequest>,
) -> Result<Json<UrlResponse>, AppError> {
    let url = state
        .url_service
        .toggle(&domain, &slug, payload.enabled)
        .await?;

    Ok(Json(url.into()))
}

/// Deletes a slug and evicts it from the cache.
///
/// # Endpoint
///
/// `DELETE /-/api/urls/{slug}`
///
/// # Errors
///
/// Returns 404 Not Found if the slug does not exist in this tenant.
pub async fn delete_url_handler(
    State(state): State<AppState>,
    Extension(domain): Extension<Domain>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    state.url_service.remove(&domain, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}
