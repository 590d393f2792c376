//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /-/health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Lists registered domains
/// 2. **Visit Queue**: Checks if the channel is open and reports free capacity
/// 3. **Cache**: Pings the configured backend
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database":    { "status": "ok", "message": "Connected, 2 domains" },
///     "visit_queue": { "status": "ok", "message": "Capacity: 10000" },
///     "cache":       { "status": "ok", "message": "redis backend reachable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;

    let queue_check = check_visit_queue(&state);

    let cache_check = check_cache(&state).await;

    let all_healthy = db_check.is_ok() && queue_check.is_ok() && cache_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            visit_queue: queue_check,
            cache: cache_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.domain_service.list().await {
        Ok(domains) => CheckStatus::ok(format!("Connected, {} domains", domains.len())),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

fn check_visit_queue(state: &AppState) -> CheckStatus {
    if state.visit_recorder.is_closed() {
        CheckStatus::error("Visit queue is closed")
    } else {
        CheckStatus::ok(format!("Capacity: {}", state.visit_recorder.capacity()))
    }
}

/// The null backend always reports healthy: running without a cache is a
/// supported mode, not a fault.
async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.cache.backend();
    if state.cache.health_check().await {
        CheckStatus::ok(format!("{} backend reachable", backend))
    } else {
        CheckStatus::error(format!("{} backend unreachable", backend))
    }
}
