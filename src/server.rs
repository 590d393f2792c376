//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum server lifecycle.

use crate::api::middleware::rate_limit::RateLimits;
use crate::application::services::{VisitLogger, run_visit_worker};
use crate::config::Config;
use crate::domain::visit_event::VisitRecorder;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::metrics;
use crate::infrastructure::persistence::{PgDomainRepository, PgUrlRepository, PgVisitRepository};
use crate::routes::app_router;
use crate::state::{AppState, Repositories, StateOptions};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Prometheus metrics recorder
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - Background visit worker
/// - Axum HTTP server with graceful shutdown
///
/// On SIGTERM or Ctrl-C the server stops accepting connections, then waits
/// up to `SHUTDOWN_GRACE_SECONDS` for queued visits to be persisted.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let metrics_handle = metrics::install_recorder();

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = connect_cache(&config).await;

    let pool = Arc::new(pool);
    let repos = Repositories {
        domains: Arc::new(PgDomainRepository::new(pool.clone())),
        urls: Arc::new(PgUrlRepository::new(pool.clone())),
        visits: Arc::new(PgVisitRepository::new(pool.clone())),
    };

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    let worker_logger = Arc::new(VisitLogger::new(
        repos.domains.clone(),
        repos.urls.clone(),
        repos.visits.clone(),
    ));
    let worker = tokio::spawn(run_visit_worker(
        visit_rx,
        worker_logger,
        config.visit_worker_concurrency,
    ));

    let state = AppState::new(
        repos,
        cache,
        VisitRecorder::new(visit_tx),
        StateOptions {
            token_signing_secret: config.token_signing_secret.clone(),
            cache_ttl: config.cache_ttl(),
            localhost_alias: config.localhost_alias.clone(),
        },
    )
    .with_metrics(metrics_handle);

    let router = app_router(
        state,
        Some(RateLimits {
            behind_proxy: config.behind_proxy,
        }),
    );
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router owned the last VisitRecorder; the worker now drains and exits.
    tracing::info!("Server stopped, draining visit queue");
    match tokio::time::timeout(config.shutdown_grace(), worker).await {
        Ok(Ok(())) => tracing::info!("Visit queue drained"),
        Ok(Err(e)) => tracing::error!("Visit worker panicked: {}", e),
        Err(_) => tracing::warn!(
            "Visit queue not drained within {}s, pending visits are lost",
            config.shutdown_grace_seconds
        ),
    }

    Ok(())
}

/// Connects to Redis when configured, degrading to [`NullCache`].
async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
