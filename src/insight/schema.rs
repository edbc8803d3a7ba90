use super::row::AnalyticRow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// Union of row keys in first-seen order: rows in input order, then each
/// row's own key order. Every key appears once.
pub fn infer_columns(rows: &[AnalyticRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for row in rows {
        for key in row.keys() {
            if seen.insert(key) {
                ordered.push(key.to_owned());
            }
        }
    }
    ordered
}

/// A column is numeric when at least one row holds a finite number for it.
pub fn detect_kind(rows: &[AnalyticRow], key: &str) -> ColumnKind {
    if rows.iter().any(|row| row.number(key).is_some()) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

/// Turns a raw column key into a header label.
///
/// `avg_paid_per_claim` becomes `Avg Paid Per Claim`, `lossYear` becomes
/// `Loss Year`. Only the first letter of each word is touched, so acronyms
/// such as `ZIP` survive.
pub fn humanize_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' {
            spaced.push(' ');
            prev_lower = false;
            continue;
        }
        if prev_lower && c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
        prev_lower = c.is_lowercase();
    }

    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
