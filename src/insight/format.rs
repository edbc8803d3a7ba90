//! Cell formatting.
//!
//! Formatting is a pure function of `(value, key, policy)`: there is no
//! cached state, so rendering the same cell twice always yields the same
//! [`RenderedCell`], and it never fails. Values that do not fit the numeric
//! rules fall back to their JSON text.

use super::policy::Policy;
use super::row::CellValue;
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";

const CURRENCY_HINTS: [&str; 5] = ["avg", "total", "paid", "loss", "severity"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    #[default]
    None,
    /// Rendered in the alert color.
    Alert,
    /// Rendered in the positive color.
    Favorable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCell {
    pub text: String,
    pub highlight: Highlight,
    /// Placeholder text ("N/A") that should be drawn weak.
    pub muted: bool,
}

impl RenderedCell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: Highlight::None,
            muted: false,
        }
    }

    pub fn not_available() -> Self {
        Self {
            text: NOT_AVAILABLE.to_owned(),
            highlight: Highlight::None,
            muted: true,
        }
    }

    fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = highlight;
        self
    }
}

/// Formats a raw cell and applies the policy's highlight if it targets `key`.
pub fn format_cell(value: CellValue<'_>, key: &str, policy: &Policy) -> RenderedCell {
    let cell = format_value(value, key);
    if cell.muted {
        return cell;
    }
    let highlight = policy.cell_highlight(key, value.as_number());
    cell.with_highlight(highlight)
}

/// Formats a raw cell without any highlight.
///
/// Currency hints are checked before the year hint, so a key carrying both
/// (`loss_year`) renders as currency: `2023` becomes `$2,023`.
pub fn format_value(value: CellValue<'_>, key: &str) -> RenderedCell {
    match value {
        CellValue::Null => RenderedCell::not_available(),
        CellValue::Text("") => RenderedCell::not_available(),
        CellValue::Text(s) => RenderedCell::plain(s),
        CellValue::Number(x) => RenderedCell::plain(format_number_for_key(x, key)),
        CellValue::Bool(b) => RenderedCell::plain(b.to_string()),
        CellValue::Other(raw) => RenderedCell::plain(
            serde_json::to_string(raw).unwrap_or_else(|_| raw.to_string()),
        ),
    }
}

/// Formats a derived percentage such as `+20.0%`.
pub fn format_percent_variance(value: Option<f64>, policy: &Policy, key: &str) -> RenderedCell {
    match value {
        Some(v) if v.is_finite() => {
            RenderedCell::plain(format!("{v:+.1}%")).with_highlight(policy.cell_highlight(key, Some(v)))
        }
        _ => RenderedCell::not_available(),
    }
}

pub fn is_currency_key(key: &str) -> bool {
    let k = key.to_lowercase();
    CURRENCY_HINTS.iter().any(|hint| k.contains(hint))
}

pub fn is_year_key(key: &str) -> bool {
    key.to_lowercase().contains("year")
}

fn format_number_for_key(x: f64, key: &str) -> String {
    if is_currency_key(key) {
        format_currency(x)
    } else if is_year_key(key) {
        format!("{:.0}", x.round())
    } else if x.abs() < 100.0 {
        format_grouped(x, 2)
    } else {
        format_grouped(x, 0)
    }
}

/// Whole-dollar currency with thousands separators: `$1,234,568`.
pub fn format_currency(x: f64) -> String {
    let rounded = x.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(&format!("{:.0}", rounded.abs())))
}

/// Grouped number with a fixed number of decimals: `1,234.50`.
pub fn format_grouped(x: f64, decimals: usize) -> String {
    let scale = 10f64.powi(i32::try_from(decimals).unwrap_or(0));
    let rounded = (x * scale).round() / scale;
    let text = format!("{:.*}", decimals, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let sign = if rounded < 0.0 { "-" } else { "" };
    let grouped = group_thousands(int_part);
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
