//! Tenant provisioning and lookup.

use crate::application::services::auth_service::hash_token;
use crate::domain::entities::{Domain, NewDomain};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;
use crate::utils::slug::generate_token;
use serde_json::json;
use std::sync::Arc;

/// Service for the tenants that own slug namespaces.
///
/// Provisioning issues a fresh admin token; only its HMAC is persisted, so
/// the plain token is returned exactly once.
pub struct DomainService {
    repository: Arc<dyn DomainRepository>,
    signing_secret: String,
}

impl DomainService {
    pub fn new(repository: Arc<dyn DomainRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Provisions a tenant and returns it together with its admin token.
    ///
    /// The host is lower-cased before storage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the host is not a valid domain name.
    /// Returns [`AppError::Conflict`] if the host is already registered.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn provision(
        &self,
        host: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<(Domain, String), AppError> {
        let host = host.trim().to_ascii_lowercase();
        validate_host(&host)?;

        if self.repository.find_by_host(&host).await?.is_some() {
            return Err(AppError::conflict(
                "Domain already exists",
                json!({ "host": host }),
            ));
        }

        let token = generate_token()?;
        let new_domain = NewDomain {
            title: title.unwrap_or_else(|| host.clone()),
            host,
            description,
            admin_token_hash: Some(hash_token(&self.signing_secret, &token)),
        };

        let domain = self.repository.create(new_domain).await?;
        Ok((domain, token))
    }

    /// Replaces the tenant's admin token and returns the new one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the host is not registered.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn rotate_token(&self, host: &str) -> Result<String, AppError> {
        let domain = self.get_by_host(host).await?;

        let token = generate_token()?;
        self.repository
            .set_admin_token_hash(domain.id, &hash_token(&self.signing_secret, &token))
            .await?;

        Ok(token)
    }

    /// Retrieves a tenant by host.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the host is not registered.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn get_by_host(&self, host: &str) -> Result<Domain, AppError> {
        self.repository
            .find_by_host(host)
            .await?
            .ok_or_else(|| AppError::not_found("Domain not found", json!({ "host": host })))
    }

    /// Lists all tenants.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn list(&self) -> Result<Vec<Domain>, AppError> {
        self.repository.list().await
    }
}

/// Validates a tenant host name.
///
/// - Length: 1-255 characters
/// - Must contain at least one dot
/// - Allowed characters: ASCII letters, digits, dots, hyphens
fn validate_host(host: &str) -> Result<(), AppError> {
    if host.is_empty() || host.len() > 255 {
        return Err(AppError::bad_request(
            "Invalid domain name length",
            json!({ "min": 1, "max": 255 }),
        ));
    }

    if !host.contains('.') || host.starts_with('.') || host.ends_with('.') {
        return Err(AppError::bad_request(
            "Invalid domain format",
            json!({ "hint": "Domain must contain at least one inner dot" }),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(AppError::bad_request(
            "Invalid characters in domain name",
            json!({ "allowed": "a-z, 0-9, dots, hyphens" }),
        ));
    }

    Ok(())
}
