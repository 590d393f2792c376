//! Bearer token authentication for tenant admin endpoints.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;

use crate::utils::request_context::extract_request_context;
use crate::{error::AppError, state::AppState};

/// Authenticates admin requests for the tenant named by the Host header.
///
/// # Header Format
///
/// ```text
/// Host: shunt.to
/// Authorization: Bearer <token>
/// ```
///
/// On success the authenticated [`crate::domain::entities::Domain`] is
/// inserted into request extensions for handlers to extract.
///
/// # Errors
///
/// Returns `401 Unauthorized` (with `WWW-Authenticate: Bearer`) if the header
/// is missing or malformed, or the token is not valid for this tenant.
/// Returns `400 Bad Request` if the Host header is unusable.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let ctx = extract_request_context(&parts.headers, st.localhost_alias())?;
    let domain = st.auth_service.authenticate(&ctx.domain, &token).await?;

    parts.extensions.insert(domain);
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
