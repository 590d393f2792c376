//! PostgreSQL implementation of visit repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewVisit, Visit};
use crate::domain::repositories::VisitRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: i64,
    visited_at: DateTime<Utc>,
    referrer: Option<String>,
    user_agent: Option<String>,
    ip: Option<String>,
    country: Option<String>,
    region: Option<String>,
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone: Option<String>,
    domain_id: i64,
    url_id: Option<i64>,
}

impl From<VisitRow> for Visit {
    fn from(r: VisitRow) -> Self {
        Visit {
            id: r.id,
            visited_at: r.visited_at,
            referrer: r.referrer,
            user_agent: r.user_agent,
            ip: r.ip,
            country: r.country,
            region: r.region,
            city: r.city,
            latitude: r.latitude,
            longitude: r.longitude,
            timezone: r.timezone,
            domain_id: r.domain_id,
            url_id: r.url_id,
        }
    }
}

/// PostgreSQL repository for visit inserts.
pub struct PgVisitRepository {
    pool: Arc<PgPool>,
}

impl PgVisitRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn insert(&self, new_visit: NewVisit) -> Result<Visit, AppError> {
        let row = sqlx::query_as::<_, VisitRow>(
            r#"
            INSERT INTO visits (visited_at, referrer, user_agent, ip, domain_id, url_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, visited_at, referrer, user_agent, ip,
                      country, region, city, latitude, longitude, timezone,
                      domain_id, url_id
            "#,
        )
        .bind(new_visit.visited_at)
        .bind(new_visit.referrer)
        .bind(new_visit.user_agent)
        .bind(new_visit.ip)
        .bind(new_visit.domain_id)
        .bind(new_visit.url_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }
}
