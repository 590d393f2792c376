//! Edge redirect middleware: the cache-first hot path for `/{slug}`.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::{debug, error};

use crate::application::services::RedirectDecision;
use crate::state::AppState;
use crate::utils::request_context::extract_request_context;
use crate::utils::slug::is_valid_slug;

/// Paths under this prefix belong to the service itself and never redirect.
pub const INTERNAL_PREFIX: &str = "/-/";

const PASS_THROUGH_PATHS: &[&str] = &["/favicon.ico"];

/// Extracts the candidate slug from a request path.
///
/// Returns `None` for internal paths, the root, nested paths, and anything
/// that is not a syntactically valid slug.
pub fn slug_from_path(path: &str) -> Option<&str> {
    if path.starts_with(INTERNAL_PREFIX) || PASS_THROUGH_PATHS.contains(&path) {
        return None;
    }

    let slug = path.strip_prefix('/')?;
    is_valid_slug(slug).then_some(slug)
}

/// Redirects `/{slug}` requests whose slug resolves for the Host tenant.
///
/// # Flow
///
/// 1. Internal paths, `/favicon.ico`, `/` and requests without a usable Host pass through
/// 2. Cache lookup, then the resolver on a miss
/// 3. Found → `307 Temporary Redirect` with `Location: <target>`
/// 4. Visit logging and the hit counter are scheduled after the decision and never awaited
///
/// Anything not redirected continues to the router unchanged, which renders
/// the JSON 404 fallback for unknown slugs.
pub async fn layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(slug) = slug_from_path(req.uri().path()).map(str::to_string) else {
        return next.run(req).await;
    };

    let mut ctx = match extract_request_context(req.headers(), state.localhost_alias()) {
        Ok(ctx) => ctx,
        Err(e) => {
            metrics::counter!("shunt_passthrough_total", "reason" => "no_host").increment(1);
            debug!(slug = %slug, error = %e, "No usable Host header, passing through");
            return next.run(req).await;
        }
    };

    let target = match state.redirect_service.lookup(&ctx.domain, &slug).await {
        RedirectDecision::Redirect { target, .. } => target,
        RedirectDecision::PassThrough(_) => return next.run(req).await,
    };

    let Ok(location) = HeaderValue::from_str(&target) else {
        error!(domain = %ctx.domain, slug = %slug, "Stored target is not a valid Location header");
        return next.run(req).await;
    };

    if ctx.ip.is_none() {
        ctx.ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
    }

    let response = (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response();
    state.redirect_service.dispatch_side_effects(ctx, &slug);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_path() {
        assert_eq!(slug_from_path("/metrics"), Some("metrics"));
        assert_eq!(slug_from_path("/slug0"), Some("slug0"));
        assert_eq!(slug_from_path("/Docs_2-x"), Some("Docs_2-x"));
    }

    #[test]
    fn test_internal_and_reserved_paths_pass_through() {
        assert_eq!(slug_from_path("/-/api/resolve"), None);
        assert_eq!(slug_from_path("/-/health"), None);
        assert_eq!(slug_from_path("/favicon.ico"), None);
        assert_eq!(slug_from_path("/"), None);
        assert_eq!(slug_from_path(""), None);
    }

    #[test]
    fn test_non_slug_paths_pass_through() {
        assert_eq!(slug_from_path("/a/b"), None);
        assert_eq!(slug_from_path("/robots.txt"), None);
        assert_eq!(slug_from_path("/%20"), None);
    }
}
