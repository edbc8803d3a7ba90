//! Per-resource fetch lifecycle as an explicit state machine.
//!
//! ```text
//!            request                 success
//!   Idle ─────────────> Loading ─────────────> Ready <──────────┐
//!                          │                    │  request      │ success, or
//!                          │ failure            │  (forced or   │ failure with
//!                          v                    v   expired)    │ payload kept
//!                        Error ──retry──>   Refreshing ─────────┘
//! ```
//!
//! The controller never performs I/O. It hands out [`FetchTicket`]s and the
//! caller reports each ticket's outcome back; stale outcomes are dropped by
//! generation so the newest request always wins.

use super::state::{
    FetchTicket, FetchedPayload, RequestOutcome, ResourceKey, ResourceState, ResourceStatus,
    ResourceView,
};
use crate::insight::{PolicyLimits, build_table_with};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct StagingController {
    resources: HashMap<ResourceKey, ResourceState>,
    limits: PolicyLimits,
}

impl StagingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: PolicyLimits) -> Self {
        Self {
            resources: HashMap::new(),
            limits,
        }
    }

    /// Asks for `key`'s data.
    ///
    /// A fresh cached payload is served without a fetch unless
    /// `force_refresh` is set. A non-forced request while a fetch is running
    /// is a no-op; a forced one supersedes the running fetch.
    pub fn request(
        &mut self,
        key: &ResourceKey,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> RequestOutcome {
        let state = self.resources.entry(key.clone()).or_default();

        match state.status {
            ResourceStatus::Loading | ResourceStatus::Refreshing if !force_refresh => {
                log::debug!("Fetch already in flight for {key}");
                return RequestOutcome::InFlight;
            }
            ResourceStatus::Ready if !force_refresh && state.is_fresh(now) => {
                log::info!("Cache hit: {key}");
                return RequestOutcome::Cached;
            }
            _ => {}
        }

        state.latest_issued += 1;
        state.outstanding = Some(state.latest_issued);
        state.status = if state.payload.is_some() {
            ResourceStatus::Refreshing
        } else {
            ResourceStatus::Loading
        };

        log::info!(
            "Issuing fetch #{} for {key} (force_refresh={force_refresh})",
            state.latest_issued
        );
        RequestOutcome::Issued(FetchTicket {
            key: key.clone(),
            generation: state.latest_issued,
        })
    }

    /// Applies a successful fetch. Returns `false` when the result was stale
    /// and discarded.
    pub fn on_success(&mut self, ticket: &FetchTicket, payload: FetchedPayload) -> bool {
        let limits = self.limits;
        let Some(state) = self.resources.get_mut(&ticket.key) else {
            log::warn!("Success for unknown resource {}", ticket.key);
            return false;
        };

        // Superseded results may still land while the newer fetch is
        // outstanding, never after any newer fetch completed.
        let Some(outstanding) = state.outstanding else {
            log::info!(
                "Discarding fetch #{} for {}: newer request already completed",
                ticket.generation,
                ticket.key
            );
            return false;
        };
        if ticket.generation <= state.latest_settled || ticket.generation > outstanding {
            log::info!("Discarding stale fetch #{} for {}", ticket.generation, ticket.key);
            return false;
        }

        let variant = ticket.key.kind.display_variant();
        let table = build_table_with(Some(&payload.table_payload()), variant, &limits);
        if table.is_none() {
            log::info!("{} returned no displayable rows", ticket.key);
        }

        state.latest_settled = ticket.generation;
        state.table = table.map(Arc::new);
        state.cached_at = Some(payload.cached_at);
        state.cache_expires_at = Some(payload.cache_expires_at);
        state.payload = Some(payload);
        state.error = None;

        if ticket.generation == outstanding {
            state.outstanding = None;
            state.status = ResourceStatus::Ready;
        } else {
            state.status = ResourceStatus::Refreshing;
        }
        log::info!(
            "Applied fetch #{} for {} ({})",
            ticket.generation,
            ticket.key,
            state.status.as_str()
        );
        true
    }

    /// Records a failed fetch. A failure never drops a working payload: with
    /// a payload the status returns to `Ready` and the error is kept
    /// alongside it. Returns `false` when the failure was stale.
    pub fn on_failure(&mut self, ticket: &FetchTicket, message: impl Into<String>) -> bool {
        let Some(state) = self.resources.get_mut(&ticket.key) else {
            log::warn!("Failure for unknown resource {}", ticket.key);
            return false;
        };
        if state.outstanding != Some(ticket.generation) {
            log::info!(
                "Ignoring failure of superseded fetch #{} for {}",
                ticket.generation,
                ticket.key
            );
            return false;
        }

        let message = message.into();
        state.latest_settled = ticket.generation;
        state.outstanding = None;
        if state.payload.is_some() {
            log::warn!("Refresh failed for {}, keeping stale data: {message}", ticket.key);
            state.status = ResourceStatus::Ready;
        } else {
            log::error!("Fetch failed for {}: {message}", ticket.key);
            state.status = ResourceStatus::Error;
        }
        state.error = Some(message);
        true
    }

    pub fn state(&self, key: &ResourceKey) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    pub fn status(&self, key: &ResourceKey) -> ResourceStatus {
        self.resources.get(key).map(|s| s.status).unwrap_or_default()
    }

    pub fn view(&self, key: &ResourceKey) -> ResourceView {
        self.resources.get(key).map_or_else(
            || ResourceView::idle(key.clone()),
            |state| ResourceView::from_state(key.clone(), state),
        )
    }

    pub fn in_flight_count(&self) -> usize {
        self.resources
            .values()
            .filter(|s| s.outstanding.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::state::ResourceKind;
    use chrono::Duration;
    use serde_json::json;

    fn key() -> ResourceKey {
        ResourceKey::new(ResourceKind::LargeLosses, "C-1")
    }

    fn payload(now: DateTime<Utc>, paid: i64) -> FetchedPayload {
        FetchedPayload::new(
            vec![json!({"claim_id": "X", "paid_amount": paid})],
            now,
            now + Duration::hours(1),
        )
    }

    fn issued(outcome: RequestOutcome) -> FetchTicket {
        match outcome {
            RequestOutcome::Issued(ticket) => ticket,
            other => panic!("expected a ticket, got {other:?}"),
        }
    }

    fn first_paid(ctl: &StagingController) -> Option<f64> {
        ctl.view(&key()).table?.rows.first()?.number("paid_amount")
    }

    #[test]
    fn test_idle_to_loading_to_ready() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        assert_eq!(ctl.status(&key()), ResourceStatus::Idle);

        let ticket = issued(ctl.request(&key(), false, now));
        assert_eq!(ctl.status(&key()), ResourceStatus::Loading);

        assert!(ctl.on_success(&ticket, payload(now, 100)));
        let view = ctl.view(&key());
        assert_eq!(view.status, ResourceStatus::Ready);
        assert!(view.table.is_some());
        assert_eq!(view.cache_expires_at, Some(now + Duration::hours(1)));
    }

    #[test]
    fn test_fresh_cache_skips_fetch_until_forced() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let ticket = issued(ctl.request(&key(), false, now));
        ctl.on_success(&ticket, payload(now, 100));

        let later = now + Duration::minutes(30);
        assert_eq!(ctl.request(&key(), false, later), RequestOutcome::Cached);

        let forced = issued(ctl.request(&key(), true, later));
        assert_eq!(forced.generation, 2);
        assert_eq!(ctl.status(&key()), ResourceStatus::Refreshing);
        assert!(ctl.view(&key()).is_refreshing);
        assert_eq!(first_paid(&ctl), Some(100.0));
    }

    #[test]
    fn test_expired_cache_refreshes_in_background() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let ticket = issued(ctl.request(&key(), false, now));
        ctl.on_success(&ticket, payload(now, 100));

        let outcome = ctl.request(&key(), false, now + Duration::hours(2));
        assert!(matches!(outcome, RequestOutcome::Issued(_)));
        assert_eq!(ctl.status(&key()), ResourceStatus::Refreshing);
    }

    #[test]
    fn test_second_request_while_loading_is_noop() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        issued(ctl.request(&key(), false, now));
        assert_eq!(ctl.request(&key(), false, now), RequestOutcome::InFlight);
        assert_eq!(ctl.in_flight_count(), 1);
    }

    #[test]
    fn test_second_request_while_refreshing_is_noop() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let first = issued(ctl.request(&key(), false, now));
        ctl.on_success(&first, payload(now, 100));

        let refresh = issued(ctl.request(&key(), true, now));
        assert_eq!(ctl.status(&key()), ResourceStatus::Refreshing);
        assert_eq!(ctl.request(&key(), false, now), RequestOutcome::InFlight);
        assert_eq!(ctl.in_flight_count(), 1);

        // Still the refresh ticket that completes the fetch.
        assert!(ctl.on_success(&refresh, payload(now, 200)));
        assert_eq!(ctl.status(&key()), ResourceStatus::Ready);
    }

    #[test]
    fn test_failure_without_payload_is_error() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let ticket = issued(ctl.request(&key(), false, now));
        assert!(ctl.on_failure(&ticket, "Network error: timed out"));

        let view = ctl.view(&key());
        assert_eq!(view.status, ResourceStatus::Error);
        assert!(view.table.is_none());
        assert_eq!(view.error.as_deref(), Some("Network error: timed out"));
        assert!(!view.is_stale_warning());

        // Retry from error loads again.
        issued(ctl.request(&key(), false, now));
        assert_eq!(ctl.status(&key()), ResourceStatus::Loading);
    }

    #[test]
    fn test_failed_refresh_keeps_payload() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let first = issued(ctl.request(&key(), false, now));
        ctl.on_success(&first, payload(now, 100));

        let refresh = issued(ctl.request(&key(), true, now));
        assert!(ctl.on_failure(&refresh, "Backend returned 503: unavailable"));

        let view = ctl.view(&key());
        assert_eq!(view.status, ResourceStatus::Ready);
        assert!(view.is_stale_warning());
        assert_eq!(first_paid(&ctl), Some(100.0));

        // A later success clears the warning.
        let again = issued(ctl.request(&key(), true, now));
        ctl.on_success(&again, payload(now, 200));
        assert!(ctl.view(&key()).error.is_none());
        assert_eq!(first_paid(&ctl), Some(200.0));
    }

    #[test]
    fn test_superseded_result_after_newer_completes_is_discarded() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let old = issued(ctl.request(&key(), false, now));
        let new = issued(ctl.request(&key(), true, now));
        assert_eq!(ctl.status(&key()), ResourceStatus::Loading);

        assert!(ctl.on_success(&new, payload(now, 200)));
        assert!(!ctl.on_success(&old, payload(now, 100)));
        assert_eq!(first_paid(&ctl), Some(200.0));
        assert_eq!(ctl.status(&key()), ResourceStatus::Ready);
    }

    #[test]
    fn test_superseded_result_before_newer_completes_is_shown() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let old = issued(ctl.request(&key(), false, now));
        let new = issued(ctl.request(&key(), true, now));

        assert!(ctl.on_success(&old, payload(now, 100)));
        assert_eq!(ctl.status(&key()), ResourceStatus::Refreshing);
        assert_eq!(first_paid(&ctl), Some(100.0));

        assert!(ctl.on_success(&new, payload(now, 200)));
        assert_eq!(ctl.status(&key()), ResourceStatus::Ready);
        assert_eq!(first_paid(&ctl), Some(200.0));
    }

    #[test]
    fn test_superseded_failure_is_ignored() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let old = issued(ctl.request(&key(), false, now));
        let new = issued(ctl.request(&key(), true, now));

        assert!(!ctl.on_failure(&old, "boom"));
        assert_eq!(ctl.status(&key()), ResourceStatus::Loading);
        assert!(ctl.view(&key()).error.is_none());

        assert!(ctl.on_success(&new, payload(now, 200)));
        assert_eq!(ctl.status(&key()), ResourceStatus::Ready);
    }

    #[test]
    fn test_superseded_success_after_newer_failure_is_discarded() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let first = issued(ctl.request(&key(), false, now));
        assert!(ctl.on_success(&first, payload(now, 100)));

        let second = issued(ctl.request(&key(), true, now));
        let third = issued(ctl.request(&key(), true, now));
        assert!(ctl.on_failure(&third, "Backend returned 503: unavailable"));
        assert_eq!(ctl.status(&key()), ResourceStatus::Ready);

        let fourth = issued(ctl.request(&key(), true, now));
        assert!(!ctl.on_success(&second, payload(now, 50)));

        let view = ctl.view(&key());
        assert_eq!(view.status, ResourceStatus::Refreshing);
        assert_eq!(view.error.as_deref(), Some("Backend returned 503: unavailable"));
        assert_eq!(first_paid(&ctl), Some(100.0));

        assert!(ctl.on_success(&fourth, payload(now, 400)));
        assert_eq!(ctl.status(&key()), ResourceStatus::Ready);
        assert!(ctl.view(&key()).error.is_none());
        assert_eq!(first_paid(&ctl), Some(400.0));
    }

    #[test]
    fn test_keys_are_independent() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let other = ResourceKey::new(ResourceKind::SeverityTrend, "C-1");
        let a = issued(ctl.request(&key(), false, now));
        let b = issued(ctl.request(&other, false, now));
        assert_eq!(a.generation, 1);
        assert_eq!(b.generation, 1);

        ctl.on_failure(&b, "down");
        assert_eq!(ctl.status(&other), ResourceStatus::Error);
        assert_eq!(ctl.status(&key()), ResourceStatus::Loading);
    }

    #[test]
    fn test_empty_payload_is_ready_without_table() {
        let now = Utc::now();
        let mut ctl = StagingController::new();
        let ticket = issued(ctl.request(&key(), false, now));
        ctl.on_success(
            &ticket,
            FetchedPayload::new(vec![json!("junk")], now, now + Duration::hours(1)),
        );
        let view = ctl.view(&key());
        assert_eq!(view.status, ResourceStatus::Ready);
        assert!(view.has_payload);
        assert!(view.table.is_none());
    }
}
