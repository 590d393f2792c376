#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use shunt::domain::visit_event::{VisitEvent, VisitRecorder};
use shunt::infrastructure::cache::{CacheError, CacheResult, CacheService, MemoryCache};
use shunt::infrastructure::persistence::{PgDomainRepository, PgUrlRepository, PgVisitRepository};
use shunt::routes::app_router;
use shunt::state::{AppState, Repositories, StateOptions};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;

pub const SIGNING_SECRET: &str = "test-signing-secret";

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// A cache backend whose every operation fails.
pub struct FailingCache;

#[async_trait]
impl CacheService for FailingCache {
    async fn get(&self, _domain: &str, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::ConnectionError("connection refused".into()))
    }

    async fn set(
        &self,
        _domain: &str,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> CacheResult<()> {
        Err(CacheError::ConnectionError("connection refused".into()))
    }

    async fn increment(&self, _domain: &str, _key: &str) -> CacheResult<i64> {
        Err(CacheError::ConnectionError("connection refused".into()))
    }

    async fn delete(&self, _domain: &str, _key: &str) -> CacheResult<()> {
        Err(CacheError::ConnectionError("connection refused".into()))
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

pub struct TestContext {
    pub state: AppState,
    pub visits: mpsc::Receiver<VisitEvent>,
    pub cache: Arc<MemoryCache>,
}

pub fn repositories(pool: PgPool) -> Repositories {
    let pool = Arc::new(pool);
    Repositories {
        domains: Arc::new(PgDomainRepository::new(pool.clone())),
        urls: Arc::new(PgUrlRepository::new(pool.clone())),
        visits: Arc::new(PgVisitRepository::new(pool)),
    }
}

pub fn test_options() -> StateOptions {
    StateOptions {
        token_signing_secret: SIGNING_SECRET.to_string(),
        cache_ttl: None,
        localhost_alias: None,
    }
}

/// State backed by PostgreSQL and an inspectable in-memory cache.
pub fn create_test_state(pool: PgPool) -> TestContext {
    create_test_state_with(pool, test_options())
}

pub fn create_test_state_with(pool: PgPool, options: StateOptions) -> TestContext {
    let cache = Arc::new(MemoryCache::new());
    let (tx, rx) = mpsc::channel(100);

    let state = AppState::new(
        repositories(pool),
        cache.clone(),
        VisitRecorder::new(tx),
        options,
    );

    TestContext {
        state,
        visits: rx,
        cache,
    }
}

/// State whose cache backend always fails.
pub fn create_failing_cache_state(pool: PgPool) -> (AppState, mpsc::Receiver<VisitEvent>) {
    let (tx, rx) = mpsc::channel(100);
    let state = AppState::new(
        repositories(pool),
        Arc::new(FailingCache),
        VisitRecorder::new(tx),
        test_options(),
    );
    (state, rx)
}

/// The full router without rate limiting, with a fixed peer address.
pub fn test_server(state: AppState) -> TestServer {
    let app: Router = app_router(state, None).layer(MockConnectInfoLayer);
    TestServer::new(app).unwrap()
}

pub async fn create_domain(pool: &PgPool, host: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO domains (host, title) VALUES ($1, $1) RETURNING id")
        .bind(host)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_url(pool: &PgPool, domain_id: i64, slug: &str, target: &str) -> i64 {
    let yesterday = Utc::now() - chrono::Duration::days(1);
    create_url_with(pool, domain_id, slug, target, true, yesterday, None).await
}

pub async fn create_url_with(
    pool: &PgPool,
    domain_id: i64,
    slug: &str,
    target: &str,
    enabled: bool,
    start_at: DateTime<Utc>,
    end_at: Option<DateTime<Utc>>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO urls (domain_id, slug, target, enabled, start_at, end_at) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(domain_id)
    .bind(slug)
    .bind(target)
    .bind(enabled)
    .bind(start_at)
    .bind(end_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_visit(pool: &PgPool, domain_id: i64, url_id: i64, visited_at: DateTime<Utc>) {
    sqlx::query("INSERT INTO visits (domain_id, url_id, visited_at) VALUES ($1, $2, $3)")
        .bind(domain_id)
        .bind(url_id)
        .bind(visited_at)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn count_visits(pool: &PgPool, url_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM visits WHERE url_id = $1")
        .bind(url_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// The development dataset: `shunt.to` with `metrics` and `slug0..slug11`,
/// every fifth slug disabled. Returns the domain id.
pub async fn seed_shunt(pool: &PgPool) -> i64 {
    let domain_id = create_domain(pool, "shunt.to").await;
    create_url(pool, domain_id, "metrics", "https://shunt.to/metrics").await;

    let yesterday = Utc::now() - chrono::Duration::days(1);
    for i in 0..12 {
        create_url_with(
            pool,
            domain_id,
            &format!("slug{i}"),
            "https://github.com/",
            i % 5 != 0,
            yesterday,
            None,
        )
        .await;
    }

    domain_id
}

/// Lets spawned side-effect tasks run to completion.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
