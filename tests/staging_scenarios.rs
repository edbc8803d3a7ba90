//! Integration tests for resource staging
//!
//! These drive the threaded staging driver against an in-memory fetcher and
//! check cache, refresh and failure behavior per resource.

use case_insights::api::{AnalyticsFetcher, StaticFetcher};
use case_insights::error::{InsightError, Result};
use case_insights::staging::{
    FetchedPayload, RequestOutcome, ResourceKey, ResourceKind, ResourceStatus, StagingDriver,
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const WAIT: std::time::Duration = std::time::Duration::from_secs(5);

fn risk_key() -> ResourceKey {
    "large-losses:C-1".parse().unwrap()
}

fn payload_expiring_in(hours: i64, paid: i64) -> FetchedPayload {
    let now = Utc::now();
    FetchedPayload::new(
        vec![json!({"claim": "CLM-1", "paid_amount": paid})],
        now,
        now + Duration::hours(hours),
    )
}

#[test]
fn test_cache_hit_then_forced_refresh() {
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.set_payload(risk_key(), payload_expiring_in(1, 300_000));
    let mut driver = StagingDriver::new(Arc::clone(&fetcher));

    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Idle);
    assert!(matches!(
        driver.request(&risk_key(), false),
        RequestOutcome::Issued(_)
    ));
    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Loading);
    assert!(driver.wait_for_completion(WAIT));
    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Ready);

    assert_eq!(driver.request(&risk_key(), false), RequestOutcome::Cached);
    assert_eq!(fetcher.call_count(), 1, "fresh cache must not fetch again");

    assert!(matches!(
        driver.request(&risk_key(), true),
        RequestOutcome::Issued(_)
    ));
    assert!(driver.wait_for_completion(WAIT));
    assert_eq!(fetcher.call_count(), 2);
}

#[test]
fn test_stale_on_error() {
    let fetcher = Arc::new(StaticFetcher::new());
    let original = payload_expiring_in(1, 300_000);
    fetcher.set_payload(risk_key(), original.clone());
    let mut driver = StagingDriver::new(Arc::clone(&fetcher));

    driver.request(&risk_key(), false);
    assert!(driver.wait_for_completion(WAIT));

    fetcher.set_failure(risk_key(), "Fabric data unavailable");
    driver.refresh(&risk_key());
    assert!(driver.wait_for_completion(WAIT));

    let state = driver.controller().state(&risk_key()).unwrap();
    assert_eq!(state.status, ResourceStatus::Ready);
    assert_eq!(state.payload.as_ref(), Some(&original));
    assert_eq!(
        state.error.as_deref(),
        Some("Network error: Fabric data unavailable")
    );

    let view = driver.view(&risk_key());
    assert!(view.is_stale_warning());
    assert!(view.table.is_some());
}

#[test]
fn test_expired_cache_refetches() {
    let fetcher = Arc::new(StaticFetcher::new());
    fetcher.set_payload(risk_key(), payload_expiring_in(-1, 300_000));
    let mut driver = StagingDriver::new(Arc::clone(&fetcher));

    driver.request(&risk_key(), false);
    assert!(driver.wait_for_completion(WAIT));
    assert!(matches!(
        driver.request(&risk_key(), false),
        RequestOutcome::Issued(_)
    ));
    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Refreshing);
    assert!(driver.wait_for_completion(WAIT));
    assert_eq!(fetcher.call_count(), 2);
}

#[test]
fn test_repeated_requests_share_one_fetch() {
    let fetcher =
        Arc::new(StaticFetcher::new().with_delay(std::time::Duration::from_millis(200)));
    fetcher.set_payload(risk_key(), payload_expiring_in(-1, 300_000));
    let mut driver = StagingDriver::new(Arc::clone(&fetcher));

    assert!(matches!(
        driver.request(&risk_key(), false),
        RequestOutcome::Issued(_)
    ));
    assert_eq!(driver.request(&risk_key(), false), RequestOutcome::InFlight);
    assert!(driver.wait_for_completion(WAIT));
    assert_eq!(fetcher.call_count(), 1);

    // Expired payload: the background refresh is shared the same way.
    assert!(matches!(
        driver.request(&risk_key(), false),
        RequestOutcome::Issued(_)
    ));
    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Refreshing);
    assert_eq!(driver.request(&risk_key(), false), RequestOutcome::InFlight);
    assert!(driver.wait_for_completion(WAIT));
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Ready);
}

/// Answers plain requests slowly and forced ones immediately, so an older
/// fetch finishes after a newer one.
struct SlowUnforcedFetcher {
    calls: AtomicUsize,
}

impl AnalyticsFetcher for SlowUnforcedFetcher {
    fn fetch(&self, _key: &ResourceKey, force_refresh: bool) -> Result<FetchedPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !force_refresh {
            std::thread::sleep(std::time::Duration::from_millis(300));
            return Ok(payload_expiring_in(1, 100_000));
        }
        Ok(payload_expiring_in(1, 900_000))
    }
}

#[test]
fn test_late_superseded_response_is_discarded() {
    let fetcher = Arc::new(SlowUnforcedFetcher {
        calls: AtomicUsize::new(0),
    });
    let mut driver = StagingDriver::new(Arc::clone(&fetcher));

    driver.request(&risk_key(), false);
    driver.refresh(&risk_key());
    assert!(driver.wait_for_completion(WAIT));

    // Let the slow first fetch land after the newer one was applied.
    std::thread::sleep(std::time::Duration::from_millis(500));
    assert_eq!(driver.poll(), 0, "stale result must not apply");

    let table = driver.view(&risk_key()).table.unwrap();
    assert_eq!(table.rows[0].number("paid_amount"), Some(900_000.0));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_resources_fail_independently() {
    let fetcher = Arc::new(StaticFetcher::new());
    let severity = ResourceKey::new(ResourceKind::SeverityTrend, "C-1");
    fetcher.set_payload(risk_key(), payload_expiring_in(1, 10_000));
    fetcher.set_failure(severity.clone(), "timed out");
    let mut driver = StagingDriver::new(Arc::clone(&fetcher));

    driver.request(&risk_key(), false);
    driver.request(&severity, false);
    assert!(driver.wait_for_completion(WAIT));

    assert_eq!(driver.view(&risk_key()).status, ResourceStatus::Ready);
    let failed = driver.view(&severity);
    assert_eq!(failed.status, ResourceStatus::Error);
    assert!(failed.table.is_none());

    // Unknown keys surface as backend errors.
    let missing = ResourceKey::new(ResourceKind::ZipClaimStats, "C-404");
    let err = fetcher.fetch(&missing, false).unwrap_err();
    assert!(matches!(err, InsightError::Http { status: 404, .. }));
}
