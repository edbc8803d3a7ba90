use super::controller::StagingController;
use super::state::{FetchTicket, FetchedPayload, RequestOutcome, ResourceKey, ResourceView};
use crate::api::AnalyticsFetcher;
use crate::error::Result;
use crate::insight::PolicyLimits;
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Completion = (FetchTicket, Result<FetchedPayload>);

/// Runs fetches on worker threads and applies their results to a
/// [`StagingController`] on the owning thread.
pub struct StagingDriver<F: AnalyticsFetcher + 'static> {
    controller: StagingController,
    fetcher: Arc<F>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    repaint: Option<egui::Context>,
}

impl<F: AnalyticsFetcher + 'static> StagingDriver<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_limits(fetcher, PolicyLimits::default())
    }

    pub fn with_limits(fetcher: Arc<F>, limits: PolicyLimits) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            controller: StagingController::with_limits(limits),
            fetcher,
            tx,
            rx,
            repaint: None,
        }
    }

    /// Workers ask `ctx` to repaint once their result is queued.
    pub fn with_repaint_context(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn request(&mut self, key: &ResourceKey, force_refresh: bool) -> RequestOutcome {
        let outcome = self.controller.request(key, force_refresh, Utc::now());
        if let RequestOutcome::Issued(ticket) = &outcome {
            self.spawn_fetch(ticket.clone(), force_refresh);
        }
        outcome
    }

    pub fn refresh(&mut self, key: &ResourceKey) -> RequestOutcome {
        self.request(key, true)
    }

    fn spawn_fetch(&self, ticket: FetchTicket, force_refresh: bool) {
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let repaint = self.repaint.clone();

        std::thread::spawn(move || {
            let result = fetcher.fetch(&ticket.key, force_refresh);
            if tx.send((ticket, result)).is_err() {
                log::error!("Failed to send fetch result");
            }
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }

    /// Applies every completed fetch. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Blocks until no fetch is outstanding or `timeout` elapses. Returns
    /// `true` when everything settled.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.controller.in_flight_count() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(completion) => {
                    self.apply(completion);
                }
                Err(_) => return false,
            }
        }
        true
    }

    fn apply(&mut self, (ticket, result): Completion) -> bool {
        match result {
            Ok(payload) => self.controller.on_success(&ticket, payload),
            Err(err) => self.controller.on_failure(&ticket, err.to_string()),
        }
    }

    pub fn view(&self, key: &ResourceKey) -> ResourceView {
        self.controller.view(key)
    }

    pub fn controller(&self) -> &StagingController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StaticFetcher;
    use crate::staging::state::{ResourceKind, ResourceStatus};
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_driver_fetches_then_serves_cache() {
        let key = ResourceKey::new(ResourceKind::LargeLosses, "C-1");
        let fetcher = Arc::new(StaticFetcher::new());
        let now = Utc::now();
        fetcher.set_payload(
            key.clone(),
            FetchedPayload::new(
                vec![json!({"claim": "A", "paid_amount": 300000})],
                now,
                now + ChronoDuration::hours(1),
            ),
        );

        let mut driver = StagingDriver::new(Arc::clone(&fetcher));
        assert!(matches!(driver.request(&key, false), RequestOutcome::Issued(_)));
        assert_eq!(driver.view(&key).status, ResourceStatus::Loading);
        assert!(driver.wait_for_completion(WAIT));

        let view = driver.view(&key);
        assert_eq!(view.status, ResourceStatus::Ready);
        assert!(view.table.is_some_and(|t| t.row_flagged(0)));

        assert_eq!(driver.request(&key, false), RequestOutcome::Cached);
        assert_eq!(fetcher.call_count(), 1);

        driver.refresh(&key);
        assert!(driver.wait_for_completion(WAIT));
        assert_eq!(fetcher.call_count(), 2);
    }

    #[test]
    fn test_driver_reports_failure() {
        let key = ResourceKey::new(ResourceKind::SeverityTrend, "C-2");
        let fetcher = Arc::new(StaticFetcher::new());
        fetcher.set_failure(key.clone(), "connection refused");

        let mut driver = StagingDriver::new(fetcher);
        driver.request(&key, false);
        assert!(driver.wait_for_completion(WAIT));
        assert_eq!(driver.poll(), 0);

        let view = driver.view(&key);
        assert_eq!(view.status, ResourceStatus::Error);
        assert_eq!(view.error.as_deref(), Some("Network error: connection refused"));
    }
}
