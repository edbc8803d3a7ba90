//! Data-fetch collaborator for the staging layer.
//!
//! [`AnalyticsFetcher`] is the seam the [`crate::staging::StagingDriver`]
//! calls from its worker threads. [`BackendClient`] talks to the
//! underwriting backend over HTTP; [`StaticFetcher`] serves canned payloads.

pub mod fixture;
pub mod wire;

pub use fixture::StaticFetcher;

use crate::config::AppSettings;
use crate::error::{InsightError, Result};
use crate::staging::{FetchedPayload, ResourceKey, ResourceKind};
use std::time::Duration;

pub const DEFAULT_ZIP_STATS_YEARS: u32 = 10;
pub const DEFAULT_MIN_LOSS: u32 = 1_000;

/// Something that can produce a payload for a resource key.
///
/// Called off the UI thread, possibly concurrently for different keys.
pub trait AnalyticsFetcher: Send + Sync {
    fn fetch(&self, key: &ResourceKey, force_refresh: bool) -> Result<FetchedPayload>;
}

/// Blocking HTTP client for the `/api/fabric` and
/// `/api/location-intelligence` endpoints.
pub struct BackendClient {
    base_url: String,
    client: reqwest::blocking::Client,
    zip_stats_years: u32,
    min_loss: u32,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), Duration::from_secs(60))
    }

    pub fn from_settings(settings: &AppSettings) -> Result<Self> {
        let client = Self::build(
            settings.backend_url.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )?;
        Ok(client
            .with_zip_stats_years(settings.zip_stats_years)
            .with_min_loss(settings.min_loss_threshold))
    }

    fn build(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InsightError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
            zip_stats_years: DEFAULT_ZIP_STATS_YEARS,
            min_loss: DEFAULT_MIN_LOSS,
        })
    }

    /// Years of ZIP history to request, clamped to the backend's 1..=20.
    pub fn with_zip_stats_years(mut self, years: u32) -> Self {
        self.zip_stats_years = years.clamp(1, 20);
        self
    }

    /// Large-loss floor, clamped to the backend's 1,000..=500,000.
    pub fn with_min_loss(mut self, min_loss: u32) -> Self {
        self.min_loss = min_loss.clamp(1_000, 500_000);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, key: &ResourceKey, force_refresh: bool) -> String {
        let case = encode_path_segment(&key.id);
        let base = &self.base_url;
        match key.kind {
            ResourceKind::PropertySummary => format!(
                "{base}/api/fabric/property-summary/{case}?force_refresh={force_refresh}"
            ),
            ResourceKind::ZipClaimStats => format!(
                "{base}/api/fabric/zip-stats/{case}?force_refresh={force_refresh}&years={}",
                self.zip_stats_years
            ),
            ResourceKind::SeverityTrend | ResourceKind::LargeLosses => format!(
                "{base}/api/fabric/risk-assessment/{case}?force_refresh={force_refresh}&min_loss={}",
                self.min_loss
            ),
            // Not cached server side, so there is nothing to force.
            ResourceKind::LocationIntelligence => {
                format!("{base}/api/location-intelligence/{case}")
            }
        }
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(InsightError::Http {
                status: status.as_u16(),
                detail: wire::error_detail(&body),
            });
        }
        Ok(body)
    }
}

impl AnalyticsFetcher for BackendClient {
    fn fetch(&self, key: &ResourceKey, force_refresh: bool) -> Result<FetchedPayload> {
        let url = self.endpoint_url(key, force_refresh);
        log::info!("GET {url}");
        let body = self.get_text(&url)?;
        let payload = wire::parse_payload(key.kind, &body)?;
        log::info!(
            "{key}: {} rows, cache expires {}",
            payload.rows.len(),
            payload.cache_expires_at
        );
        Ok(payload)
    }
}

/// Percent-encodes anything outside the URL path "unreserved" set.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
