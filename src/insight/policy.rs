//! Display variants and the sort/derive/highlight policy each one selects.
//!
//! Column classification is literal, case-insensitive substring matching on
//! the raw key. The rules are a fixed contract, not a fuzzy classifier:
//!
//! | Rule              | Key must contain                                  |
//! |-------------------|---------------------------------------------------|
//! | loss year         | `loss` and `year`                                 |
//! | county average    | `county` and one of `avg`, `severity`, `paid`     |
//! | state average     | `state` and one of `avg`, `severity`, `paid`      |
//! | large-loss amount | (`total` or `loss`) and (`paid` or `amount`)      |
//! | amount fallback   | `paid` or `amount`                                |
//!
//! When several keys match a rule the first one in column order wins. The
//! amount fallback only applies when no key satisfies the large-loss rule, so
//! listings keyed by a bare `paid_amount` still sort and flag.

use super::format::Highlight;
use super::row::AnalyticRow;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_LARGE_LOSS_ROW_LIMIT: usize = 10;
pub const DEFAULT_LARGE_LOSS_ALERT_THRESHOLD: f64 = 250_000.0;
pub const DEFAULT_VARIANCE_ALERT_PCT: f64 = 10.0;

/// Key and label of the derived county-vs-state column.
pub const VARIANCE_COLUMN_KEY: &str = "county_state_variance_pct";
pub const VARIANCE_COLUMN_LABEL: &str = "County vs State Variance";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayVariant {
    /// Columns pass through; no sort, limit or highlight.
    #[default]
    Standard,
    /// County vs state severity by loss year.
    SeverityComparison,
    /// Top large losses by paid amount.
    LargeLossListing,
}

impl DisplayVariant {
    pub const ALL: [Self; 3] = [
        Self::Standard,
        Self::SeverityComparison,
        Self::LargeLossListing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::SeverityComparison => "severity-comparison",
            Self::LargeLossListing => "large-loss-listing",
        }
    }
}

impl std::fmt::Display for DisplayVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DisplayVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == normalised)
            .ok_or_else(|| {
                format!("unknown display variant '{s}' (expected standard, severity-comparison or large-loss-listing)")
            })
    }
}

/// Thresholds behind the variant rules. Defaults are the dashboard's fixed
/// values; settings may override them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyLimits {
    pub large_loss_row_limit: usize,
    pub large_loss_alert_threshold: f64,
    pub variance_alert_pct: f64,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self {
            large_loss_row_limit: DEFAULT_LARGE_LOSS_ROW_LIMIT,
            large_loss_alert_threshold: DEFAULT_LARGE_LOSS_ALERT_THRESHOLD,
            variance_alert_pct: DEFAULT_VARIANCE_ALERT_PCT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivedColumnSpec {
    /// `(county - state) / state * 100`
    PercentVariance {
        key: String,
        label: String,
        county_key: String,
        state_key: String,
    },
}

impl DerivedColumnSpec {
    pub fn key(&self) -> &str {
        match self {
            Self::PercentVariance { key, .. } => key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::PercentVariance { label, .. } => label,
        }
    }

    /// Computed value for `row`, or `None` when it is not applicable.
    pub fn value(&self, row: &AnalyticRow) -> Option<f64> {
        match self {
            Self::PercentVariance {
                county_key,
                state_key,
                ..
            } => percent_variance(row.number(county_key), row.number(state_key)),
        }
    }
}

/// Which cells the variant's highlight predicate targets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum HighlightRule {
    #[default]
    None,
    /// The derived variance column: `>= +pct` alerts, `<= -pct` is favorable.
    Variance { column: String, threshold_pct: f64 },
    /// A row whose `key` value exceeds `threshold` is high severity; the
    /// `key` cell itself is rendered as an alert.
    RowAbove { key: String, threshold: f64 },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub sort: Option<SortSpec>,
    pub row_limit: Option<usize>,
    pub derived_columns: Vec<DerivedColumnSpec>,
    pub highlight: HighlightRule,
}

impl Policy {
    /// Highlight for one cell. `value` is the raw number for base columns or
    /// the computed value for derived ones.
    pub fn cell_highlight(&self, key: &str, value: Option<f64>) -> Highlight {
        match &self.highlight {
            HighlightRule::None => Highlight::None,
            HighlightRule::Variance {
                column,
                threshold_pct,
            } if column == key => match value {
                Some(v) if v >= *threshold_pct => Highlight::Alert,
                Some(v) if v <= -*threshold_pct => Highlight::Favorable,
                _ => Highlight::None,
            },
            HighlightRule::RowAbove {
                key: target,
                threshold,
            } if target == key => match value {
                Some(v) if v > *threshold => Highlight::Alert,
                _ => Highlight::None,
            },
            HighlightRule::Variance { .. } | HighlightRule::RowAbove { .. } => Highlight::None,
        }
    }

    /// Whether the whole row is flagged as high severity.
    pub fn row_flagged(&self, row: &AnalyticRow) -> bool {
        match &self.highlight {
            HighlightRule::RowAbove { key, threshold } => {
                row.number(key).is_some_and(|v| v > *threshold)
            }
            HighlightRule::None | HighlightRule::Variance { .. } => false,
        }
    }
}

pub fn resolve_policy(variant: DisplayVariant, keys: &[String]) -> Policy {
    resolve_policy_with(variant, keys, &PolicyLimits::default())
}

pub fn resolve_policy_with(
    variant: DisplayVariant,
    keys: &[String],
    limits: &PolicyLimits,
) -> Policy {
    match variant {
        DisplayVariant::Standard => Policy::default(),
        DisplayVariant::SeverityComparison => severity_policy(keys, limits),
        DisplayVariant::LargeLossListing => large_loss_policy(keys, limits),
    }
}

fn severity_policy(keys: &[String], limits: &PolicyLimits) -> Policy {
    let sort = find_key(keys, is_loss_year_key).map(|key| SortSpec {
        key: key.to_owned(),
        direction: SortDirection::Descending,
    });

    let county = find_key(keys, |k| is_regional_average_key(k, "county"));
    let state = county.and_then(|county_key| {
        keys.iter()
            .map(String::as_str)
            .find(|k| *k != county_key && is_regional_average_key(*k, "state"))
    });

    let mut policy = Policy {
        sort,
        ..Policy::default()
    };

    if let (Some(county_key), Some(state_key)) = (county, state) {
        policy.derived_columns.push(DerivedColumnSpec::PercentVariance {
            key: VARIANCE_COLUMN_KEY.to_owned(),
            label: VARIANCE_COLUMN_LABEL.to_owned(),
            county_key: county_key.to_owned(),
            state_key: state_key.to_owned(),
        });
        policy.highlight = HighlightRule::Variance {
            column: VARIANCE_COLUMN_KEY.to_owned(),
            threshold_pct: limits.variance_alert_pct,
        };
    }
    policy
}

fn large_loss_policy(keys: &[String], limits: &PolicyLimits) -> Policy {
    let amount_key = find_key(keys, is_large_loss_key).or_else(|| find_key(keys, is_amount_key));

    Policy {
        sort: amount_key.map(|key| SortSpec {
            key: key.to_owned(),
            direction: SortDirection::Descending,
        }),
        row_limit: Some(limits.large_loss_row_limit),
        derived_columns: Vec::new(),
        highlight: amount_key.map_or(HighlightRule::None, |key| HighlightRule::RowAbove {
            key: key.to_owned(),
            threshold: limits.large_loss_alert_threshold,
        }),
    }
}

fn find_key(keys: &[String], rule: impl Fn(&str) -> bool) -> Option<&str> {
    keys.iter().map(String::as_str).find(|k| rule(*k))
}

pub fn is_loss_year_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("loss") && k.contains("year")
}

/// `region` is `county` or `state`.
pub fn is_regional_average_key(key: &str, region: &str) -> bool {
    let k = key.to_lowercase();
    k.contains(region) && (k.contains("avg") || k.contains("severity") || k.contains("paid"))
}

pub fn is_large_loss_key(key: &str) -> bool {
    let k = key.to_lowercase();
    (k.contains("total") || k.contains("loss")) && (k.contains("paid") || k.contains("amount"))
}

pub fn is_amount_key(key: &str) -> bool {
    let k = key.to_lowercase();
    k.contains("paid") || k.contains("amount")
}

/// Percentage variance of `county` over `state`. Not applicable when either
/// side is missing or the state value is zero.
pub fn percent_variance(county: Option<f64>, state: Option<f64>) -> Option<f64> {
    match (county, state) {
        (Some(c), Some(s)) if s != 0.0 => Some((c - s) / s * 100.0),
        _ => None,
    }
}
