use super::AnalyticsFetcher;
use crate::error::{InsightError, Result};
use crate::staging::{FetchedPayload, ResourceKey};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Debug)]
enum Canned {
    Payload(FetchedPayload),
    Failure(String),
}

/// In-memory fetcher serving canned payloads or failures per key.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: Mutex<HashMap<ResourceKey, Canned>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_payload(&self, key: ResourceKey, payload: FetchedPayload) {
        self.store(key, Canned::Payload(payload));
    }

    /// Later fetches of `key` fail with a network error carrying `message`.
    pub fn set_failure(&self, key: ResourceKey, message: impl Into<String>) {
        self.store(key, Canned::Failure(message.into()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn store(&self, key: ResourceKey, canned: Canned) {
        match self.responses.lock() {
            Ok(mut responses) => {
                responses.insert(key, canned);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, canned);
            }
        }
    }
}

impl AnalyticsFetcher for StaticFetcher {
    fn fetch(&self, key: &ResourceKey, _force_refresh: bool) -> Result<FetchedPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let canned = self
            .responses
            .lock()
            .map_err(|_| InsightError::Other("fixture lock poisoned".to_owned()))?
            .get(key)
            .cloned();
        match canned {
            Some(Canned::Payload(payload)) => Ok(payload),
            Some(Canned::Failure(message)) => Err(InsightError::Network(message)),
            None => Err(InsightError::Http {
                status: 404,
                detail: format!("No data for {key}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::ResourceKind;
    use chrono::Utc;

    #[test]
    fn test_static_fetcher_counts_calls() {
        let fetcher = StaticFetcher::new();
        let key = ResourceKey::new(ResourceKind::LargeLosses, "C-1");
        assert!(fetcher.fetch(&key, false).is_err());

        let now = Utc::now();
        fetcher.set_payload(key.clone(), FetchedPayload::new(Vec::new(), now, now));
        assert!(fetcher.fetch(&key, false).is_ok());

        fetcher.set_failure(key.clone(), "offline");
        let err = fetcher.fetch(&key, true).unwrap_err();
        assert_eq!(err.to_string(), "Network error: offline");
        assert_eq!(fetcher.call_count(), 3);
    }
}
