//! API route configuration.
//!
//! Public routes resolve against the Host tenant. Admin routes additionally
//! require that tenant's Bearer token via [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_url_handler, delete_url_handler, list_urls_handler, log_visit_handler,
    resolve_handler, site_handler, toggle_url_handler, top_handler, update_url_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Unauthenticated routes.
///
/// # Endpoints
///
/// - `GET  /resolve`   - Resolve a slug without redirecting
/// - `POST /log-visit` - Persist a visit synchronously
/// - `GET  /site`      - Tenant display settings
/// - `GET  /top`       - Most visited slugs in a time window
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/resolve", get(resolve_handler))
        .route("/log-visit", post(log_visit_handler))
        .route("/site", get(site_handler))
        .route("/top", get(top_handler))
}

/// Tenant admin routes, to be wrapped in the auth middleware.
///
/// # Endpoints
///
/// - `GET    /urls`               - List the tenant's urls
/// - `POST   /urls`               - Create a url
/// - `PATCH  /urls/{id}`          - Partially update a url
/// - `DELETE /urls/{slug}`        - Delete a url
/// - `POST   /urls/{slug}/toggle` - Enable or disable a url
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/urls", get(list_urls_handler).post(create_url_handler))
        .route("/urls/{key}", patch(update_url_handler).delete(delete_url_handler))
        .route("/urls/{slug}/toggle", post(toggle_url_handler))
}
