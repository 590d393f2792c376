//! PostgreSQL implementation of url repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUrl, TopUrl, Url, UrlPatch};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;
use serde_json::json;

/// Selected columns of `urls u JOIN domains d`, in [`UrlRow`] order.
const URL_COLUMNS: &str = "u.id, u.domain_id, d.host AS domain, u.slug, u.target, u.enabled, \
                           u.start_at, u.end_at, u.created_at, u.updated_at";

#[derive(sqlx::FromRow)]
struct UrlRow {
    id: i64,
    domain_id: i64,
    domain: String,
    slug: String,
    target: String,
    enabled: bool,
    start_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UrlRow> for Url {
    fn from(r: UrlRow) -> Self {
        Url {
            id: r.id,
            domain_id: r.domain_id,
            domain: r.domain,
            slug: r.slug,
            target: r.target,
            enabled: r.enabled,
            start_at: r.start_at,
            end_at: r.end_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TopUrlRow {
    id: i64,
    slug: String,
    target: String,
    visits: i64,
}

/// Maps a unique violation on `(domain_id, slug)` to a slug-specific conflict.
fn slug_conflict(e: sqlx::Error, slug: Option<&str>) -> AppError {
    match AppError::from(e) {
        AppError::Conflict { .. } => AppError::conflict(
            "Slug already exists for this domain",
            json!({ "slug": slug }),
        ),
        other => other,
    }
}

/// PostgreSQL repository for slug mappings.
///
/// Every returned [`Url`] carries its owning host via a join on `domains`.
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
}

impl PgUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn find_by_slug(
        &self,
        domain_id: i64,
        slug: &str,
        enabled: Option<bool>,
    ) -> Result<Option<Url>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            SELECT {URL_COLUMNS}
            FROM urls u
            JOIN domains d ON d.id = u.domain_id
            WHERE u.domain_id = $1
              AND u.slug = $2
              AND ($3::BOOLEAN IS NULL OR u.enabled = $3)
            "#
        ))
        .bind(domain_id)
        .bind(slug)
        .bind(enabled)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Url::from))
    }

    async fn find_by_id(&self, domain_id: i64, id: i64) -> Result<Option<Url>, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            SELECT {URL_COLUMNS}
            FROM urls u
            JOIN domains d ON d.id = u.domain_id
            WHERE u.domain_id = $1 AND u.id = $2
            "#
        ))
        .bind(domain_id)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Url::from))
    }

    async fn list(&self, domain_id: i64) -> Result<Vec<Url>, AppError> {
        let rows = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            SELECT {URL_COLUMNS}
            FROM urls u
            JOIN domains d ON d.id = u.domain_id
            WHERE u.domain_id = $1
            ORDER BY u.slug
            "#
        ))
        .bind(domain_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Url::from).collect())
    }

    async fn create(&self, new_url: NewUrl) -> Result<Url, AppError> {
        let row = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            WITH u AS (
                INSERT INTO urls (domain_id, slug, target, enabled, start_at, end_at)
                VALUES ($1, $2, $3, $4, COALESCE($5::TIMESTAMPTZ, NOW()), $6)
                RETURNING *
            )
            SELECT {URL_COLUMNS}
            FROM u
            JOIN domains d ON d.id = u.domain_id
            "#
        ))
        .bind(new_url.domain_id)
        .bind(&new_url.slug)
        .bind(&new_url.target)
        .bind(new_url.enabled)
        .bind(new_url.start_at)
        .bind(new_url.end_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| slug_conflict(e, Some(&new_url.slug)))?;

        Ok(row.into())
    }

    async fn update(&self, id: i64, patch: UrlPatch) -> Result<Url, AppError> {
        let update_end_at = patch.end_at.is_some();
        let new_end_at = patch.end_at.flatten();

        let row = sqlx::query_as::<_, UrlRow>(&format!(
            r#"
            WITH u AS (
                UPDATE urls SET
                    slug       = COALESCE($2::TEXT, slug),
                    target     = COALESCE($3::TEXT, target),
                    start_at   = COALESCE($4::TIMESTAMPTZ, start_at),
                    end_at     = CASE WHEN $5 THEN $6::TIMESTAMPTZ ELSE end_at END,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {URL_COLUMNS}
            FROM u
            JOIN domains d ON d.id = u.domain_id
            "#
        ))
        .bind(id)
        .bind(&patch.slug)
        .bind(&patch.target)
        .bind(patch.start_at)
        .bind(update_end_at)
        .bind(new_end_at)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| slug_conflict(e, patch.slug.as_deref()))?;

        row.map(Url::from)
            .ok_or_else(|| AppError::not_found("Url not found", json!({ "id": id })))
    }

    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE urls SET enabled = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(enabled)
                .execute(self.pool.as_ref())
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Url not found", json!({ "id": id })));
        }

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM urls WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn top_urls(
        &self,
        domain_id: i64,
        since: DateTime<Utc>,
        limit: i64,
        ascending: bool,
    ) -> Result<Vec<TopUrl>, AppError> {
        let direction = if ascending { "ASC" } else { "DESC" };

        let rows = sqlx::query_as::<_, TopUrlRow>(&format!(
            r#"
            SELECT u.id, u.slug, u.target, COUNT(v.id) AS visits
            FROM urls u
            JOIN visits v ON v.url_id = u.id
            WHERE u.domain_id = $1
              AND u.enabled = TRUE
              AND v.visited_at >= $2
            GROUP BY u.id, u.slug, u.target
            ORDER BY visits {direction}, u.slug
            LIMIT $3
            "#
        ))
        .bind(domain_id)
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopUrl {
                id: r.id,
                slug: r.slug,
                target: r.target,
                visits: r.visits,
            })
            .collect())
    }
}
