use crate::insight::{DisplayVariant, TableModel, TablePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// The analytic panels shown for a case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    PropertySummary,
    #[serde(rename = "zip-stats")]
    ZipClaimStats,
    SeverityTrend,
    LargeLosses,
    LocationIntelligence,
}

impl ResourceKind {
    pub const ALL: [Self; 5] = [
        Self::PropertySummary,
        Self::ZipClaimStats,
        Self::SeverityTrend,
        Self::LargeLosses,
        Self::LocationIntelligence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PropertySummary => "property-summary",
            Self::ZipClaimStats => "zip-stats",
            Self::SeverityTrend => "severity-trend",
            Self::LargeLosses => "large-losses",
            Self::LocationIntelligence => "location-intelligence",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::PropertySummary => "County Claim Summary",
            Self::ZipClaimStats => "ZIP Claim Frequency",
            Self::SeverityTrend => "Severity Trend: County vs State",
            Self::LargeLosses => "Large Losses",
            Self::LocationIntelligence => "Location & Weather Alerts",
        }
    }

    pub fn display_variant(&self) -> DisplayVariant {
        match self {
            Self::PropertySummary | Self::ZipClaimStats | Self::LocationIntelligence => {
                DisplayVariant::Standard
            }
            Self::SeverityTrend => DisplayVariant::SeverityComparison,
            Self::LargeLosses => DisplayVariant::LargeLossListing,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalised)
            .ok_or_else(|| {
                format!("unknown resource kind '{s}' (expected property-summary, zip-stats, severity-trend, large-losses or location-intelligence)")
            })
    }
}

/// Identity under which fetch and cache state is tracked.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ResourceKey {
    type Err = String;

    /// Parses `"<kind>:<id>"`, e.g. `"large-losses:C-123"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("resource key '{s}' must look like <kind>:<id>"))?;
        if id.is_empty() {
            return Err(format!("resource key '{s}' has an empty id"));
        }
        Ok(Self::new(kind.parse()?, id))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
    Refreshing,
}

impl ResourceStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Loading | Self::Refreshing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Refreshing => "refreshing",
        }
    }
}

/// One successful response from the data-fetch collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchedPayload {
    pub rows: Vec<Value>,
    #[serde(default)]
    pub column_keys: Vec<String>,
    pub cached_at: DateTime<Utc>,
    pub cache_expires_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl FetchedPayload {
    pub fn new(rows: Vec<Value>, cached_at: DateTime<Utc>, cache_expires_at: DateTime<Utc>) -> Self {
        Self {
            rows,
            column_keys: Vec::new(),
            cached_at,
            cache_expires_at,
            summary: None,
        }
    }

    pub fn table_payload(&self) -> TablePayload {
        TablePayload::new(self.rows.clone()).with_keys(self.column_keys.clone())
    }
}

/// Identifies one issued fetch. Generations increase per key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub key: ResourceKey,
    pub generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A fetch must be issued for this ticket.
    Issued(FetchTicket),
    /// The cached payload is fresh; nothing to do.
    Cached,
    /// A fetch is already running for this key.
    InFlight,
}

/// Per-key state owned by the staging controller.
#[derive(Clone, Debug, Default)]
pub struct ResourceState {
    pub status: ResourceStatus,
    pub payload: Option<FetchedPayload>,
    /// Display model built once from `payload`.
    pub table: Option<Arc<TableModel>>,
    pub error: Option<String>,
    pub cached_at: Option<DateTime<Utc>>,
    pub cache_expires_at: Option<DateTime<Utc>>,
    pub(crate) latest_issued: u64,
    /// Newest generation that completed, by success or failure.
    pub(crate) latest_settled: u64,
    /// Newest issued generation that has not completed yet.
    pub(crate) outstanding: Option<u64>,
}

impl ResourceState {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.cache_expires_at.is_some_and(|expires| expires > now)
    }
}

/// What the rendering layer sees for one resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceView {
    pub key: ResourceKey,
    pub status: ResourceStatus,
    /// `None` while nothing has loaded, or when the payload had no usable rows.
    pub table: Option<Arc<TableModel>>,
    pub has_payload: bool,
    pub error: Option<String>,
    pub cached_at: Option<DateTime<Utc>>,
    pub cache_expires_at: Option<DateTime<Utc>>,
    pub is_refreshing: bool,
    pub summary: Option<String>,
}

impl ResourceView {
    pub fn idle(key: ResourceKey) -> Self {
        Self {
            key,
            status: ResourceStatus::Idle,
            table: None,
            has_payload: false,
            error: None,
            cached_at: None,
            cache_expires_at: None,
            is_refreshing: false,
            summary: None,
        }
    }

    pub fn from_state(key: ResourceKey, state: &ResourceState) -> Self {
        Self {
            key,
            status: state.status,
            table: state.table.clone(),
            has_payload: state.payload.is_some(),
            error: state.error.clone(),
            cached_at: state.cached_at,
            cache_expires_at: state.cache_expires_at,
            is_refreshing: state.status == ResourceStatus::Refreshing,
            summary: state.payload.as_ref().and_then(|p| p.summary.clone()),
        }
    }

    /// An error shown next to data that is still displayed.
    pub fn is_stale_warning(&self) -> bool {
        self.has_payload && self.error.is_some()
    }
}
