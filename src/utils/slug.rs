//! Slug validation and admin token generation.

use crate::error::AppError;
use base64::Engine as _;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

/// Maximum slug length.
pub const MAX_SLUG_LEN: usize = 64;

/// Random bytes behind a freshly issued admin token (43 base64 characters).
const TOKEN_LENGTH_BYTES: usize = 32;

/// Slugs that would shadow paths the edge middleware never redirects.
const RESERVED_SLUGS: &[&str] = &["favicon.ico", "-"];

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_-]*$").expect("slug pattern is valid")
});

/// Validates an admin-supplied slug.
///
/// # Rules
///
/// - Length: 1-64 characters
/// - Allowed characters: ASCII letters, digits, `_` and `-`
/// - Cannot start with `-` (the `/-/` prefix is internal)
/// - Cannot be a reserved path
///
/// Slugs are case-sensitive; `Docs` and `docs` are different Urls.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if any rule is violated.
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(AppError::bad_request(
            "Slug must be 1-64 characters",
            json!({ "provided_length": slug.len() }),
        ));
    }

    if RESERVED_SLUGS.contains(&slug) {
        return Err(AppError::bad_request(
            "Slug is reserved",
            json!({ "slug": slug }),
        ));
    }

    if !SLUG_RE.is_match(slug) {
        return Err(AppError::bad_request(
            "Slug may only contain letters, digits, '_' and '-', and cannot start with '-'",
            json!({ "slug": slug }),
        ));
    }

    Ok(())
}

/// Returns true if `slug` could name a Url. Used to skip store lookups for
/// paths that can never match.
pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LEN && !RESERVED_SLUGS.contains(&slug) && SLUG_RE.is_match(slug)
}

/// Generates a random admin bearer token.
///
/// Uses `getrandom` for entropy, encoded as URL-safe base64 without padding.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random source fails.
pub fn generate_token() -> Result<String, AppError> {
    let mut buffer = [0u8; TOKEN_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random bytes",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}
