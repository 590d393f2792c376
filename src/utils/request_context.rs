//! Tenant and client metadata extraction from HTTP request headers.

use crate::error::AppError;
use axum::http::{HeaderMap, header};
use serde_json::json;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Per-request metadata the redirect path needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Tenant host, port stripped, after localhost aliasing.
    pub domain: String,
    /// Client IP as reported by the proxy headers, if any.
    pub ip: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// Extracts the tenant host and client metadata from request headers.
///
/// The `Host` header is parsed as:
/// - `[::1]:8080` → `[::1]` (IPv6 literals keep their brackets)
/// - `example.com:3000` → `example.com`
/// - `localhost` → `localhost_alias` when one is configured
///
/// The client IP is the first `X-Forwarded-For` entry, falling back to
/// `X-Real-IP`. Callers that know the peer address fill it in themselves.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the `Host` header is missing, empty or
/// not valid UTF-8.
pub fn extract_request_context(
    headers: &HeaderMap,
    localhost_alias: Option<&str>,
) -> Result<RequestContext, AppError> {
    let host = headers
        .get(header::HOST)
        .ok_or_else(|| AppError::bad_request("Missing Host header", json!({})))?
        .to_str()
        .map_err(|_| AppError::bad_request("Invalid Host header", json!({})))?
        .trim();

    let domain = strip_port(host).to_ascii_lowercase();
    if domain.is_empty() {
        return Err(AppError::bad_request("Empty Host header", json!({})));
    }

    let domain = match localhost_alias {
        Some(alias) if domain == "localhost" => alias.to_string(),
        _ => domain,
    };

    Ok(RequestContext {
        domain,
        ip: client_ip(headers),
        referrer: header_string(headers, header::REFERER.as_str()),
        user_agent: header_string(headers, header::USER_AGENT.as_str()),
    })
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_string(headers, X_FORWARDED_FOR)
        .and_then(|v| {
            v.split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header_string(headers, X_REAL_IP))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_host_only() {
        let ctx = extract_request_context(&headers(&[("host", "shunt.to")]), None).unwrap();

        assert_eq!(ctx.domain, "shunt.to");
        assert_eq!(ctx.ip, None);
        assert_eq!(ctx.referrer, None);
        assert_eq!(ctx.user_agent, None);
    }

    #[test]
    fn test_host_port_is_stripped() {
        let ctx = extract_request_context(&headers(&[("host", "shunt.to:3000")]), None).unwrap();
        assert_eq!(ctx.domain, "shunt.to");

        let ctx = extract_request_context(&headers(&[("host", "[::1]:8080")]), None).unwrap();
        assert_eq!(ctx.domain, "[::1]");
    }

    #[test]
    fn test_host_is_lowercased() {
        let ctx = extract_request_context(&headers(&[("host", "Shunt.TO")]), None).unwrap();
        assert_eq!(ctx.domain, "shunt.to");
    }

    #[test]
    fn test_localhost_alias() {
        let h = headers(&[("host", "localhost:3000")]);

        assert_eq!(
            extract_request_context(&h, Some("shunt.to")).unwrap().domain,
            "shunt.to"
        );
        assert_eq!(extract_request_context(&h, None).unwrap().domain, "localhost");
    }

    #[test]
    fn test_alias_only_applies_to_localhost() {
        let h = headers(&[("host", "other.example")]);
        assert_eq!(
            extract_request_context(&h, Some("shunt.to")).unwrap().domain,
            "other.example"
        );
    }

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let h = headers(&[
            ("host", "shunt.to"),
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1, 10.0.0.2"),
            ("x-real-ip", "198.51.100.1"),
        ]);

        let ctx = extract_request_context(&h, None).unwrap();
        assert_eq!(ctx.ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("host", "shunt.to"), ("x-real-ip", "198.51.100.1")]);

        let ctx = extract_request_context(&h, None).unwrap();
        assert_eq!(ctx.ip.as_deref(), Some("198.51.100.1"));
    }

    #[test]
    fn test_empty_forwarded_for_falls_back() {
        let h = headers(&[
            ("host", "shunt.to"),
            ("x-forwarded-for", " , 10.0.0.1"),
            ("x-real-ip", "198.51.100.1"),
        ]);

        let ctx = extract_request_context(&h, None).unwrap();
        assert_eq!(ctx.ip.as_deref(), Some("198.51.100.1"));
    }

    #[test]
    fn test_referrer_and_user_agent() {
        let h = headers(&[
            ("host", "shunt.to"),
            ("referer", "https://google.com/"),
            ("user-agent", "Mozilla/5.0"),
        ]);

        let ctx = extract_request_context(&h, None).unwrap();
        assert_eq!(ctx.referrer.as_deref(), Some("https://google.com/"));
        assert_eq!(ctx.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_missing_host_is_error() {
        let result = extract_request_context(&HeaderMap::new(), None);
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_invalid_utf8_host_is_error() {
        let mut h = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_bytes(&[0xFF, 0xFE]) {
            h.insert(header::HOST, value);
            assert!(extract_request_context(&h, None).is_err());
        }
    }

    #[test]
    fn test_empty_host_is_error() {
        let h = headers(&[("host", ":3000")]);
        assert!(extract_request_context(&h, None).is_err());
    }
}
