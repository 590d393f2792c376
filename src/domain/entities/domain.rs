//! Tenant entity: every request is scoped to the domain named by its Host header.

use chrono::{DateTime, Utc};

/// A hosting domain that owns a namespace of slugs.
///
/// Slugs are unique per domain, so `shunt.to/docs` and `go.example.com/docs`
/// are unrelated mappings.
#[derive(Debug, Clone)]
pub struct Domain {
    pub id: i64,
    pub host: String,
    pub title: String,
    pub description: Option<String>,
    /// HMAC-SHA256 of the tenant's admin bearer token, hex-encoded.
    pub admin_token_hash: Option<String>,
    pub show_input: bool,
    pub show_top_slugs: bool,
    pub created_at: DateTime<Utc>,
}

impl Domain {
    /// Creates a domain with default UI toggles and no admin credential.
    pub fn new(id: i64, host: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
            title: String::new(),
            description: None,
            admin_token_hash: None,
            show_input: true,
            show_top_slugs: true,
            created_at: Utc::now(),
        }
    }

    /// Returns true if an admin credential has been provisioned.
    pub fn has_admin_credential(&self) -> bool {
        self.admin_token_hash.is_some()
    }
}

/// Input data for provisioning a new tenant.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub host: String,
    pub title: String,
    pub description: Option<String>,
    pub admin_token_hash: Option<String>,
}
