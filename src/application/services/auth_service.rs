//! Per-tenant admin token authentication.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::entities::Domain;
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(signing_secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(signing_secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Hashes a raw admin token with HMAC-SHA256 keyed by `signing_secret`.
///
/// Returns a 64-character lowercase hex-encoded MAC, the value stored in
/// `domains.admin_token_hash`.
pub fn hash_token(signing_secret: &str, token: &str) -> String {
    let mut mac = keyed_mac(signing_secret);
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Authenticates admin requests against the tenant named by the Host header.
///
/// Each domain carries its own credential; a token for one tenant never
/// authorizes mutations on another. An attacker with read-only access to the
/// database cannot verify or forge tokens without the server-side secret.
pub struct AuthService {
    domains: Arc<dyn DomainRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// `signing_secret` must match the value used when tokens were issued.
    pub fn new(domains: Arc<dyn DomainRepository>, signing_secret: String) -> Self {
        Self {
            domains,
            signing_secret,
        }
    }

    /// Verifies `token` for the tenant `host` and returns that tenant.
    ///
    /// The comparison runs in constant time over the decoded MAC.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the tenant is unknown, has no
    /// admin credential, or the token does not match.
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn authenticate(&self, host: &str, token: &str) -> Result<Domain, AppError> {
        let denied = || {
            AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Invalid token for this domain" }),
            )
        };

        let domain = self.domains.find_by_host(host).await?.ok_or_else(denied)?;

        let stored = domain
            .admin_token_hash
            .as_deref()
            .and_then(|h| hex::decode(h).ok())
            .ok_or_else(denied)?;

        let mut mac = keyed_mac(&self.signing_secret);
        mac.update(token.as_bytes());
        mac.verify_slice(&stored).map_err(|_| denied())?;

        Ok(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockDomainRepository;

    const SECRET: &str = "test-signing-secret";

    fn repo_with(hash: Option<String>) -> MockDomainRepository {
        let mut repo = MockDomainRepository::new();
        repo.expect_find_by_host().returning(move |host| {
            Ok((host == "shunt.to").then(|| Domain {
                admin_token_hash: hash.clone(),
                ..Domain::new(1, host)
            }))
        });
        repo
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let repo = repo_with(Some(hash_token(SECRET, "valid-token")));
        let service = AuthService::new(Arc::new(repo), SECRET.to_string());

        let domain = service.authenticate("shunt.to", "valid-token").await.unwrap();

        assert_eq!(domain.host, "shunt.to");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_token() {
        let repo = repo_with(Some(hash_token(SECRET, "valid-token")));
        let service = AuthService::new(Arc::new(repo), SECRET.to_string());

        let result = service.authenticate("shunt.to", "other-token").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_other_tenant() {
        let repo = repo_with(Some(hash_token(SECRET, "valid-token")));
        let service = AuthService::new(Arc::new(repo), SECRET.to_string());

        let result = service.authenticate("go.example.com", "valid-token").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_without_credential() {
        let service = AuthService::new(Arc::new(repo_with(None)), SECRET.to_string());

        let result = service.authenticate("shunt.to", "anything").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_malformed_stored_hash() {
        let service = AuthService::new(
            Arc::new(repo_with(Some("not-hex".to_string()))),
            SECRET.to_string(),
        );

        let result = service.authenticate("shunt.to", "not-hex").await;

        assert!(matches!(result, Err(AppError::Unauthorized { .. })));
    }

    #[test]
    fn test_hash_token_consistency() {
        let hash1 = hash_token(SECRET, "test-token");
        let hash2 = hash_token(SECRET, "test-token");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_token(SECRET, "test-token-2"));
    }

    #[test]
    fn test_hash_token_secret_matters() {
        assert_ne!(hash_token("secret-a", "token"), hash_token("secret-b", "token"));
    }
}
