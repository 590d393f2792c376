//! Durable visit logging and the background worker that drives it.

use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::domain::entities::{NewVisit, Visit};
use crate::domain::repositories::{DomainRepository, UrlRepository, VisitRepository};
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use serde_json::json;

/// Persists visits for redirects that were issued.
///
/// The event's (domain, slug) pair is resolved again at write time with no
/// `enabled` filter, so a Url disabled between redirect and write still gets
/// its visit.
pub struct VisitLogger {
    domains: Arc<dyn DomainRepository>,
    urls: Arc<dyn UrlRepository>,
    visits: Arc<dyn VisitRepository>,
}

impl VisitLogger {
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        urls: Arc<dyn UrlRepository>,
        visits: Arc<dyn VisitRepository>,
    ) -> Self {
        Self {
            domains,
            urls,
            visits,
        }
    }

    /// Inserts one visit row stamped with the event's `visited_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the domain or slug no longer exists.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn log_visit(&self, event: VisitEvent) -> Result<Visit, AppError> {
        let domain = self
            .domains
            .find_by_host(&event.domain)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Domain not found", json!({ "domain": event.domain }))
            })?;

        let url = self
            .urls
            .find_by_slug(domain.id, &event.slug, None)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "Url not found",
                    json!({ "domain": event.domain, "slug": event.slug }),
                )
            })?;

        self.visits
            .insert(NewVisit {
                visited_at: event.visited_at,
                referrer: event.referrer,
                user_agent: event.user_agent,
                ip: event.ip,
                domain_id: domain.id,
                url_id: url.id,
            })
            .await
    }
}

/// Drains the visit queue until every sender is dropped.
///
/// At most `concurrency` inserts run at once; while all permits are taken the
/// worker stops receiving and the bounded queue absorbs the burst. Returns
/// after in-flight inserts have finished.
pub async fn run_visit_worker(
    mut rx: mpsc::Receiver<VisitEvent>,
    logger: Arc<VisitLogger>,
    concurrency: usize,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    info!(concurrency, "Visit worker started");

    while let Some(event) = rx.recv().await {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let logger = Arc::clone(&logger);

        tasks.spawn(async move {
            let _permit = permit;
            persist(&logger, event).await;
        });

        while let Some(result) = tasks.try_join_next() {
            reap(result);
        }
    }

    let pending = tasks.len();
    if pending > 0 {
        debug!(pending, "Waiting for in-flight visit inserts");
    }
    while let Some(result) = tasks.join_next().await {
        reap(result);
    }

    info!("Visit worker stopped");
}

async fn persist(logger: &VisitLogger, event: VisitEvent) {
    let (domain, slug) = (event.domain.clone(), event.slug.clone());

    match logger.log_visit(event).await {
        Ok(visit) => {
            metrics::counter!("shunt_visits_total", "outcome" => "persisted").increment(1);
            debug!(domain = %domain, slug = %slug, visit_id = visit.id, "Visit recorded");
        }
        Err(AppError::NotFound { message, .. }) => {
            metrics::counter!("shunt_visits_total", "outcome" => "skipped").increment(1);
            warn!(domain = %domain, slug = %slug, reason = %message, "Dropping visit");
        }
        Err(e) => {
            metrics::counter!("shunt_visits_total", "outcome" => "failed").increment(1);
            warn!(domain = %domain, slug = %slug, error = %e, "Failed to record visit");
        }
    }
}

fn reap(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "Visit task panicked");
        } else {
            warn!(error = %e, "Visit task cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Domain, Url};
    use crate::domain::repositories::{MockDomainRepository, MockUrlRepository, MockVisitRepository};
    use crate::domain::visit_event::VisitRecorder;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    fn metrics_url(enabled: bool) -> Url {
        let now = Utc::now();
        Url {
            id: 42,
            domain_id: 1,
            domain: "shunt.to".to_string(),
            slug: "metrics".to_string(),
            target: "https://shunt.to/metrics".to_string(),
            enabled,
            start_at: now - Duration::days(1),
            end_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn visit_from(new_visit: &NewVisit) -> Visit {
        Visit {
            id: 1,
            visited_at: new_visit.visited_at,
            referrer: new_visit.referrer.clone(),
            user_agent: new_visit.user_agent.clone(),
            ip: new_visit.ip.clone(),
            country: None,
            region: None,
            city: None,
            latitude: None,
            longitude: None,
            timezone: None,
            domain_id: new_visit.domain_id,
            url_id: Some(new_visit.url_id),
        }
    }

    fn tenant_repo() -> MockDomainRepository {
        let mut domains = MockDomainRepository::new();
        domains
            .expect_find_by_host()
            .returning(|host| Ok((host == "shunt.to").then(|| Domain::new(1, host))));
        domains
    }

    fn event() -> VisitEvent {
        VisitEvent::new(
            "shunt.to",
            "metrics",
            Some("https://google.com/".to_string()),
            Some("Mozilla/5.0".to_string()),
            Some("203.0.113.7".to_string()),
        )
    }

    #[tokio::test]
    async fn test_log_visit_inserts_with_resolved_ids() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug()
            .withf(|domain_id, slug, enabled| *domain_id == 1 && slug == "metrics" && enabled.is_none())
            .returning(|_, _, _| Ok(Some(metrics_url(true))));

        let ev = event();
        let visited_at = ev.visited_at;

        let mut visits = MockVisitRepository::new();
        visits
            .expect_insert()
            .withf(move |v| {
                v.url_id == 42
                    && v.domain_id == 1
                    && v.visited_at == visited_at
                    && v.ip.as_deref() == Some("203.0.113.7")
            })
            .times(1)
            .returning(|v| Ok(visit_from(&v)));

        let logger = VisitLogger::new(Arc::new(tenant_repo()), Arc::new(urls), Arc::new(visits));

        let visit = logger.log_visit(ev).await.unwrap();
        assert_eq!(visit.url_id, Some(42));
        assert_eq!(visit.country, None);
    }

    #[tokio::test]
    async fn test_log_visit_for_disabled_url_still_records() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug()
            .returning(|_, _, _| Ok(Some(metrics_url(false))));

        let mut visits = MockVisitRepository::new();
        visits.expect_insert().times(1).returning(|v| Ok(visit_from(&v)));

        let logger = VisitLogger::new(Arc::new(tenant_repo()), Arc::new(urls), Arc::new(visits));

        assert!(logger.log_visit(event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_visit_unknown_domain() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug().never();
        let mut visits = MockVisitRepository::new();
        visits.expect_insert().never();

        let logger = VisitLogger::new(Arc::new(tenant_repo()), Arc::new(urls), Arc::new(visits));

        let ev = VisitEvent::new("nope.example", "metrics", None, None, None);
        let result = logger.log_visit(ev).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_log_visit_unknown_slug() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug().returning(|_, _, _| Ok(None));
        let mut visits = MockVisitRepository::new();
        visits.expect_insert().never();

        let logger = VisitLogger::new(Arc::new(tenant_repo()), Arc::new(urls), Arc::new(visits));

        let result = logger.log_visit(event()).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_worker_drains_queue_after_senders_drop() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug()
            .returning(|_, _, _| Ok(Some(metrics_url(true))));

        let inserted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&inserted);
        let mut visits = MockVisitRepository::new();
        visits.expect_insert().times(5).returning(move |v| {
            sink.lock().unwrap().push(v.clone());
            Ok(visit_from(&v))
        });

        let logger = Arc::new(VisitLogger::new(
            Arc::new(tenant_repo()),
            Arc::new(urls),
            Arc::new(visits),
        ));

        let (tx, rx) = mpsc::channel(16);
        let recorder = VisitRecorder::new(tx);
        for _ in 0..5 {
            assert!(recorder.record(event()));
        }
        drop(recorder);

        run_visit_worker(rx, logger, 2).await;

        assert_eq!(inserted.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_worker_survives_failed_inserts() {
        let mut urls = MockUrlRepository::new();
        urls.expect_find_by_slug()
            .returning(|_, _, _| Ok(Some(metrics_url(true))));

        let mut visits = MockVisitRepository::new();
        visits
            .expect_insert()
            .times(3)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let logger = Arc::new(VisitLogger::new(
            Arc::new(tenant_repo()),
            Arc::new(urls),
            Arc::new(visits),
        ));

        let (tx, rx) = mpsc::channel(8);
        for _ in 0..3 {
            tx.send(event()).await.unwrap();
        }
        drop(tx);

        run_visit_worker(rx, logger, 1).await;
    }
}
