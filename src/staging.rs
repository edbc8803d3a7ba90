//! Per-resource fetch and cache state.
//!
//! Each analytic panel is a [`ResourceKey`] with its own lifecycle
//! (`idle → loading → ready | error`, and `refreshing` while a newer fetch
//! runs over displayed data). [`StagingController`] holds the state machine;
//! [`StagingDriver`] runs fetches on worker threads through an
//! [`crate::api::AnalyticsFetcher`] and feeds the results back.
//!
//! ```
//! use case_insights::api::StaticFetcher;
//! use case_insights::staging::{
//!     FetchedPayload, ResourceKey, ResourceKind, ResourceStatus, StagingDriver,
//! };
//! use chrono::{Duration, Utc};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let key = ResourceKey::new(ResourceKind::LargeLosses, "C-123");
//! let fetcher = Arc::new(StaticFetcher::new());
//! let now = Utc::now();
//! fetcher.set_payload(
//!     key.clone(),
//!     FetchedPayload::new(vec![json!({"paid_amount": 120000})], now, now + Duration::hours(72)),
//! );
//!
//! let mut driver = StagingDriver::new(fetcher);
//! driver.request(&key, false);
//! driver.wait_for_completion(std::time::Duration::from_secs(5));
//! assert_eq!(driver.view(&key).status, ResourceStatus::Ready);
//! ```

pub mod controller;
pub mod driver;
pub mod state;

pub use controller::StagingController;
pub use driver::StagingDriver;
pub use state::{
    FetchTicket, FetchedPayload, RequestOutcome, ResourceKey, ResourceKind, ResourceState,
    ResourceStatus, ResourceView,
};
