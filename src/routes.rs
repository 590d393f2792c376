//! Top-level router configuration combining the edge redirect and API routes.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`      - Slug redirect, served by the edge middleware
//! - `GET  /-/health`    - Health check: DB, visit queue, cache
//! - `GET  /-/metrics`   - Prometheus counters
//! - `/-/api/*`          - JSON API (admin routes require a tenant Bearer token)
//! - anything else       - JSON 404
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Edge redirect** - Answers `/{slug}` before routing
//! - **Authentication** - Bearer token on admin routes

use crate::api;
use crate::api::handlers::{health_handler, metrics_handler};
use crate::api::middleware::rate_limit::{self, RateLimits};
use crate::api::middleware::{auth, edge_redirect, tracing};
use crate::error::AppError;
use crate::state::AppState;
use axum::http::Uri;
use axum::routing::get;
use axum::{Router, middleware};
use serde_json::json;

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limits` - per-client limits; `None` disables rate limiting, which
///   in-process test servers without a peer address require
///
/// Trailing-slash normalization wraps the returned router at serve time.
pub fn app_router(state: AppState, rate_limits: Option<RateLimits>) -> Router {
    let mut admin_router = api::routes::admin_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    if let Some(limits) = rate_limits {
        admin_router = rate_limit::secure(admin_router, limits);
    }

    let api_router = api::routes::public_routes().merge(admin_router);

    let mut router = Router::new()
        .route("/-/health", get(health_handler))
        .route("/-/metrics", get(metrics_handler))
        .nest("/-/api", api_router)
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            edge_redirect::layer,
        ))
        .with_state(state);

    if let Some(limits) = rate_limits {
        router = rate_limit::public(router, limits);
    }

    router.layer(tracing::layer())
}

async fn not_found_handler(uri: Uri) -> AppError {
    AppError::not_found("Not found", json!({ "path": uri.path() }))
}
