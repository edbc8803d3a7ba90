//! Response bodies of the `/api/fabric` and `/api/location-intelligence`
//! endpoints.

use crate::error::{InsightError, Result};
use crate::insight::TablePayload;
use crate::staging::{FetchedPayload, ResourceKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct PropertySummaryResponse {
    #[serde(default)]
    pub rows: Vec<Value>,
    pub cached_at: String,
    pub cache_expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ZipStatsResponse {
    pub zip_code: String,
    pub years: i64,
    pub claim_frequency: i64,
    pub avg_loss: f64,
    pub cached_at: String,
    pub cache_expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RiskAssessmentResponse {
    #[serde(default)]
    pub severity_table: Option<Value>,
    #[serde(default)]
    pub large_losses_table: Option<Value>,
    pub cached_at: String,
    pub cache_expires_at: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationIntelligenceResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<LocationData>,
}

#[derive(Debug, Deserialize)]
pub struct LocationData {
    pub location: LocationContext,
    #[serde(default)]
    pub weather: WeatherSection,
}

#[derive(Debug, Deserialize)]
pub struct LocationContext {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub admin: AdminArea,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminArea {
    pub municipality: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherSection {
    #[serde(default)]
    pub alerts: Vec<Value>,
}

impl LocationContext {
    /// One line such as `"1 Main St, Austin, TX (Travis County, TX) at 30.26710, -97.74310"`.
    pub fn summary(&self) -> String {
        let area: Vec<&str> = [&self.admin.county, &self.admin.state]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();
        let place = self
            .address
            .as_deref()
            .or(self.admin.municipality.as_deref())
            .unwrap_or("Property location");

        let mut line = place.to_owned();
        if !area.is_empty() {
            line.push_str(&format!(" ({})", area.join(", ")));
        }
        line.push_str(&format!(" at {:.5}, {:.5}", self.lat, self.lon));
        line
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Parses a success body for `kind` into a payload.
pub fn parse_payload(kind: ResourceKind, body: &str) -> Result<FetchedPayload> {
    match kind {
        ResourceKind::PropertySummary => {
            let resp: PropertySummaryResponse = serde_json::from_str(body)?;
            Ok(FetchedPayload::new(
                resp.rows,
                parse_timestamp(&resp.cached_at)?,
                parse_timestamp(&resp.cache_expires_at)?,
            ))
        }
        ResourceKind::ZipClaimStats => {
            let resp: ZipStatsResponse = serde_json::from_str(body)?;
            let row = json!({
                "zip_code": resp.zip_code,
                "years": resp.years,
                "claim_frequency": resp.claim_frequency,
                "avg_loss": resp.avg_loss,
            });
            Ok(FetchedPayload::new(
                vec![row],
                parse_timestamp(&resp.cached_at)?,
                parse_timestamp(&resp.cache_expires_at)?,
            ))
        }
        ResourceKind::SeverityTrend | ResourceKind::LargeLosses => {
            let resp: RiskAssessmentResponse = serde_json::from_str(body)?;
            let cached_at = parse_timestamp(&resp.cached_at)?;
            let cache_expires_at = parse_timestamp(&resp.cache_expires_at)?;
            let table = if kind == ResourceKind::SeverityTrend {
                resp.severity_table
            } else {
                resp.large_losses_table
            };
            Ok(agent_table_payload(table, cached_at, cache_expires_at))
        }
        ResourceKind::LocationIntelligence => {
            let resp: LocationIntelligenceResponse = serde_json::from_str(body)?;
            location_payload(resp, Utc::now())
        }
    }
}

/// Weather alerts become rows and the location context the summary. The
/// backend keeps no cache for this endpoint, so the payload expires as soon
/// as it is fetched.
fn location_payload(
    resp: LocationIntelligenceResponse,
    fetched_at: DateTime<Utc>,
) -> Result<FetchedPayload> {
    if !resp.success {
        return Err(InsightError::Http {
            status: 503,
            detail: resp
                .error
                .unwrap_or_else(|| "Location intelligence service unavailable".to_owned()),
        });
    }
    let data = resp
        .data
        .ok_or_else(|| InsightError::Parse("Location response has no data".to_owned()))?;

    let mut payload = FetchedPayload::new(data.weather.alerts, fetched_at, fetched_at);
    payload.summary = Some(data.location.summary());
    Ok(payload)
}

/// A missing or unreadable agent table becomes an empty payload.
fn agent_table_payload(
    table: Option<Value>,
    cached_at: DateTime<Utc>,
    cache_expires_at: DateTime<Utc>,
) -> FetchedPayload {
    let Some(table) = table.filter(|t| !t.is_null()) else {
        return FetchedPayload::new(Vec::new(), cached_at, cache_expires_at);
    };
    let summary = table
        .get("summary")
        .and_then(Value::as_str)
        .map(str::to_owned);

    let parsed = TablePayload::from_json(table).unwrap_or_default();
    FetchedPayload {
        rows: parsed.rows,
        column_keys: parsed.explicit_keys,
        cached_at,
        cache_expires_at,
        summary,
    }
}

/// Accepts RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| InsightError::Parse(format!("Invalid timestamp '{raw}': {e}")))
}

/// Pulls FastAPI's `detail` out of an error body, else the trimmed body.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    }
}
