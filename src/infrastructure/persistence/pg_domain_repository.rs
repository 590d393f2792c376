//! PostgreSQL implementation of domain repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Domain, NewDomain};
use crate::domain::repositories::DomainRepository;
use crate::error::AppError;
use serde_json::json;

const DOMAIN_COLUMNS: &str = "id, host, title, description, admin_token_hash, show_input, show_top_slugs, created_at";

#[derive(sqlx::FromRow)]
struct DomainRow {
    id: i64,
    host: String,
    title: String,
    description: Option<String>,
    admin_token_hash: Option<String>,
    show_input: bool,
    show_top_slugs: bool,
    created_at: DateTime<Utc>,
}

impl From<DomainRow> for Domain {
    fn from(r: DomainRow) -> Self {
        Domain {
            id: r.id,
            host: r.host,
            title: r.title,
            description: r.description,
            admin_token_hash: r.admin_token_hash,
            show_input: r.show_input,
            show_top_slugs: r.show_top_slugs,
            created_at: r.created_at,
        }
    }
}

/// PostgreSQL repository for tenant domains.
pub struct PgDomainRepository {
    pool: Arc<PgPool>,
}

impl PgDomainRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainRepository for PgDomainRepository {
    async fn find_by_host(&self, host: &str) -> Result<Option<Domain>, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE host = $1"
        ))
        .bind(host)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Domain::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Domain>, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Domain::from))
    }

    async fn create(&self, new_domain: NewDomain) -> Result<Domain, AppError> {
        let row = sqlx::query_as::<_, DomainRow>(&format!(
            r#"
            INSERT INTO domains (host, title, description, admin_token_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(&new_domain.host)
        .bind(&new_domain.title)
        .bind(&new_domain.description)
        .bind(&new_domain.admin_token_hash)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict { .. } => AppError::conflict(
                "Domain already exists",
                json!({ "host": new_domain.host }),
            ),
            other => other,
        })?;

        Ok(row.into())
    }

    async fn list(&self) -> Result<Vec<Domain>, AppError> {
        let rows = sqlx::query_as::<_, DomainRow>(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains ORDER BY host"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Domain::from).collect())
    }

    async fn set_admin_token_hash(&self, id: i64, token_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE domains SET admin_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(token_hash)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Domain not found", json!({ "id": id })));
        }

        Ok(())
    }
}
