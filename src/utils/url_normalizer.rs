//! Redirect target normalization.
//!
//! Targets are stored in canonical form so that admin edits and cache entries
//! agree byte for byte on what a slug points at.

use url::Url;

/// Maximum accepted target length after normalization.
pub const MAX_TARGET_LEN: usize = 2048;

/// Errors that can occur while normalizing a redirect target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS targets are allowed")]
    UnsupportedProtocol,

    #[error("Target must not embed credentials")]
    EmbeddedCredentials,

    #[error("Target exceeds {MAX_TARGET_LEN} characters")]
    TooLong,
}

/// Normalizes a redirect target to its canonical form.
///
/// - only absolute `http` and `https` URLs are accepted
/// - the host is lower-cased (the `url` crate already does this for special schemes)
/// - fragments are removed, and default ports are dropped by the parser
/// - `user:pass@` userinfo is rejected
///
/// Path and query are kept as given.
///
/// ```ignore
/// assert_eq!(
///     normalize_target("HTTPS://Shunt.TO:443/metrics#top").unwrap(),
///     "https://shunt.to/metrics"
/// );
/// ```
pub fn normalize_target(input: &str) -> Result<String, TargetError> {
    let mut url =
        Url::parse(input.trim()).map_err(|e| TargetError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TargetError::UnsupportedProtocol);
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(TargetError::EmbeddedCredentials);
    }

    url.set_fragment(None);

    let normalized = String::from(url);
    if normalized.len() > MAX_TARGET_LEN {
        return Err(TargetError::TooLong);
    }

    Ok(normalized)
}
