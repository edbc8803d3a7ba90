use crate::error::{InsightError, Result, ResultExt as _};
use crate::insight::PolicyLimits;
use crate::insight::policy::{
    DEFAULT_LARGE_LOSS_ALERT_THRESHOLD, DEFAULT_LARGE_LOSS_ROW_LIMIT, DEFAULT_VARIANCE_ALERT_PCT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const BACKEND_URL_ENV: &str = "CASE_INSIGHTS_BACKEND_URL";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Base URL of the underwriting backend (default: `http://localhost:8000`)
    pub backend_url: String,
    /// Per-request HTTP timeout. Agent-backed endpoints can take 10-20s on a cold cache.
    pub request_timeout_secs: u64,
    /// Years of ZIP claim history to request (backend accepts 1-20)
    pub zip_stats_years: u32,
    /// Minimum loss for the large-loss listing (backend accepts 1,000-500,000)
    pub min_loss_threshold: u32,
    pub large_loss_row_limit: usize,
    pub large_loss_alert_threshold: f64,
    pub variance_alert_pct: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_owned(),
            request_timeout_secs: 60,
            zip_stats_years: 10,
            min_loss_threshold: 1_000,
            large_loss_row_limit: DEFAULT_LARGE_LOSS_ROW_LIMIT,
            large_loss_alert_threshold: DEFAULT_LARGE_LOSS_ALERT_THRESHOLD,
            variance_alert_pct: DEFAULT_VARIANCE_ALERT_PCT,
        }
    }
}

impl AppSettings {
    pub fn policy_limits(&self) -> PolicyLimits {
        PolicyLimits {
            large_loss_row_limit: self.large_loss_row_limit,
            large_loss_alert_threshold: self.large_loss_alert_threshold,
            variance_alert_pct: self.variance_alert_pct,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://"))
        {
            return Err(InsightError::Config(format!(
                "backend_url must start with http:// or https:// (got '{}')",
                self.backend_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(InsightError::Config(
                "request_timeout_secs must be greater than zero".to_owned(),
            ));
        }
        if self.large_loss_row_limit == 0 {
            return Err(InsightError::Config(
                "large_loss_row_limit must be greater than zero".to_owned(),
            ));
        }
        if !self.variance_alert_pct.is_finite() || self.variance_alert_pct < 0.0 {
            return Err(InsightError::Config(
                "variance_alert_pct must be a non-negative number".to_owned(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV)
            && !url.trim().is_empty()
        {
            log::info!("Backend URL overridden by {BACKEND_URL_ENV}");
            self.backend_url = url.trim().to_owned();
        }
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("case-insights").join("settings.json"))
}

/// Loads settings from `path` (or the per-user config file), falling back to
/// defaults when the file does not exist. Environment overrides are applied
/// last and the result is validated.
pub fn load_app_settings(path: Option<&Path>) -> Result<AppSettings> {
    let path = path.map(Path::to_path_buf).or_else(get_config_path);
    let mut settings = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let settings = serde_json::from_str::<AppSettings>(&content).map_err(|e| {
                InsightError::Config(format!("Invalid settings in {}: {e}", path.display()))
            })?;
            log::info!("Loaded settings from {}", path.display());
            settings
        }
        _ => {
            log::info!("No settings file found, using defaults");
            AppSettings::default()
        }
    };
    settings.apply_env_overrides();
    settings.validate()?;
    Ok(settings)
}

pub fn save_app_settings(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
