//! Visit event model and the non-blocking handle used to emit it.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

/// An in-memory representation of a visit awaiting persistence.
///
/// Carries the tenant host and slug rather than a Url id: the logger resolves
/// them again at write time so the event stays self-contained.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitEvent {
    pub domain: String,
    pub slug: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl VisitEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        domain: impl Into<String>,
        slug: impl Into<String>,
        referrer: Option<String>,
        user_agent: Option<String>,
        ip: Option<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            slug: slug.into(),
            referrer,
            user_agent,
            ip,
            visited_at: Utc::now(),
        }
    }
}

/// Fire-and-forget sender for visit events.
///
/// [`VisitRecorder::record`] never waits: a full or closed queue drops the
/// event and logs a warning.
#[derive(Debug, Clone)]
pub struct VisitRecorder {
    sender: mpsc::Sender<VisitEvent>,
}

impl VisitRecorder {
    pub fn new(sender: mpsc::Sender<VisitEvent>) -> Self {
        Self { sender }
    }

    /// Offers an event to the visit queue. Returns whether it was accepted.
    pub fn record(&self, event: VisitEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => {
                metrics::counter!("shunt_visits_total", "outcome" => "queued").increment(1);
                true
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                metrics::counter!("shunt_visits_total", "outcome" => "dropped").increment(1);
                warn!(domain = %event.domain, slug = %event.slug, "Visit queue full, dropping visit");
                false
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                metrics::counter!("shunt_visits_total", "outcome" => "dropped").increment(1);
                warn!(domain = %event.domain, slug = %event.slug, "Visit queue closed, dropping visit");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Remaining free slots in the queue.
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(slug: &str) -> VisitEvent {
        VisitEvent::new(
            "shunt.to",
            slug,
            Some("https://google.com".to_string()),
            Some("Mozilla/5.0".to_string()),
            Some("203.0.113.7".to_string()),
        )
    }

    #[test]
    fn test_visit_event_creation() {
        let before = Utc::now();
        let ev = event("metrics");

        assert_eq!(ev.domain, "shunt.to");
        assert_eq!(ev.slug, "metrics");
        assert_eq!(ev.referrer.as_deref(), Some("https://google.com"));
        assert_eq!(ev.ip.as_deref(), Some("203.0.113.7"));
        assert!(ev.visited_at >= before);
    }

    #[tokio::test]
    async fn test_record_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let recorder = VisitRecorder::new(tx);

        assert!(recorder.record(event("metrics")));
        assert_eq!(rx.recv().await.unwrap().slug, "metrics");
    }

    #[test]
    fn test_record_drops_when_full() {
        let (tx, _rx) = mpsc::channel(1);
        let recorder = VisitRecorder::new(tx);

        assert!(recorder.record(event("first")));
        assert!(!recorder.record(event("second")));
    }

    #[test]
    fn test_record_drops_when_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let recorder = VisitRecorder::new(tx);

        assert!(recorder.is_closed());
        assert!(!recorder.record(event("metrics")));
    }
}
