use super::format::{RenderedCell, format_cell, format_percent_variance};
use super::policy::{
    DerivedColumnSpec, DisplayVariant, Policy, PolicyLimits, SortDirection, resolve_policy_with,
};
use super::row::AnalyticRow;
use super::schema::{ColumnKind, detect_kind, humanize_key, infer_columns};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub alignment: Alignment,
    pub is_derived: bool,
    pub kind: ColumnKind,
}

/// Raw rows as received, plus an optional upstream column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub rows: Vec<Value>,
    #[serde(default)]
    pub explicit_keys: Vec<String>,
}

impl TablePayload {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            explicit_keys: Vec::new(),
        }
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.explicit_keys = keys;
        self
    }

    /// Reads either a bare array of rows or an object carrying `rows` (or
    /// the agent table's `response`) and optional `column_keys`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Array(rows) => Some(Self::new(rows)),
            Value::Object(mut map) => {
                // Agent tables use `rows` for the row count.
                let rows = match (map.remove("rows"), map.remove("response")) {
                    (Some(Value::Array(rows)), _) | (_, Some(Value::Array(rows))) => rows,
                    _ => return None,
                };
                let keys = match map.remove("column_keys") {
                    Some(Value::Array(keys)) => keys
                        .into_iter()
                        .filter_map(|k| match k {
                            Value::String(s) => Some(s),
                            Value::Number(n) => Some(n.to_string()),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                Some(Self::new(rows).with_keys(keys))
            }
            _ => None,
        }
    }
}

/// A sorted, truncated, typed table ready for painting.
///
/// Only raw rows and column descriptors are stored; cell text is produced on
/// demand by [`TableModel::cell`], so repainting never re-sorts or re-selects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableModel {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<AnalyticRow>,
    pub truncated: bool,
    pub total_row_count: usize,
    pub variant: DisplayVariant,
    pub policy: Policy,
}

/// Builds a table with the default policy limits.
///
/// Returns `None` when there is no payload, no rows, no record rows after
/// dropping non-objects, or no displayable columns.
pub fn build_table(payload: Option<&TablePayload>, variant: DisplayVariant) -> Option<TableModel> {
    build_table_with(payload, variant, &PolicyLimits::default())
}

pub fn build_table_with(
    payload: Option<&TablePayload>,
    variant: DisplayVariant,
    limits: &PolicyLimits,
) -> Option<TableModel> {
    let payload = payload?;
    if payload.rows.is_empty() {
        return None;
    }

    let mut rows: Vec<AnalyticRow> = payload
        .rows
        .iter()
        .filter_map(|v| AnalyticRow::from_value(v.clone()))
        .collect();

    let dropped = payload.rows.len() - rows.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} non-record row(s) from {variant} table");
    }
    if rows.is_empty() {
        return None;
    }

    let keys = if payload.explicit_keys.is_empty() {
        infer_columns(&rows)
    } else {
        payload.explicit_keys.clone()
    };
    if keys.is_empty() {
        return None;
    }

    let policy = resolve_policy_with(variant, &keys, limits);

    let mut columns: Vec<ColumnDescriptor> = keys
        .iter()
        .map(|key| {
            let kind = detect_kind(&rows, key);
            ColumnDescriptor {
                key: key.clone(),
                label: humanize_key(key),
                alignment: alignment_for(kind),
                is_derived: false,
                kind,
            }
        })
        .collect();
    columns.extend(policy.derived_columns.iter().map(|spec| ColumnDescriptor {
        key: spec.key().to_owned(),
        label: spec.label().to_owned(),
        alignment: Alignment::Right,
        is_derived: true,
        kind: ColumnKind::Numeric,
    }));

    if let Some(sort) = &policy.sort {
        sort_rows(&mut rows, &sort.key, sort.direction);
    }

    let total_row_count = rows.len();
    if let Some(limit) = policy.row_limit {
        rows.truncate(limit);
    }

    Some(TableModel {
        columns,
        truncated: rows.len() < total_row_count,
        rows,
        total_row_count,
        variant,
        policy,
    })
}

fn alignment_for(kind: ColumnKind) -> Alignment {
    match kind {
        ColumnKind::Numeric => Alignment::Right,
        ColumnKind::Text => Alignment::Left,
    }
}

/// Stable sort on the numeric value of `key`. Rows without a numeric value
/// keep their relative order after all numeric rows, in either direction.
fn sort_rows(rows: &mut [AnalyticRow], key: &str, direction: SortDirection) {
    rows.sort_by(|a, b| {
        match (a.get(key).sort_number(), b.get(key).sort_number()) {
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

impl TableModel {
    pub fn visible_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.key.as_str()).collect()
    }

    /// Renders one cell. `None` only for out-of-range indices.
    pub fn cell(&self, row: usize, column: usize) -> Option<RenderedCell> {
        let data = self.rows.get(row)?;
        let descriptor = self.columns.get(column)?;

        if descriptor.is_derived {
            let spec = self.derived_spec(&descriptor.key)?;
            return Some(format_percent_variance(
                spec.value(data),
                &self.policy,
                &descriptor.key,
            ));
        }
        Some(format_cell(data.get(&descriptor.key), &descriptor.key, &self.policy))
    }

    pub fn render_row(&self, row: usize) -> Vec<RenderedCell> {
        (0..self.columns.len())
            .filter_map(|column| self.cell(row, column))
            .collect()
    }

    /// Whether the variant flags this row as high severity.
    pub fn row_flagged(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|data| self.policy.row_flagged(data))
    }

    pub fn derived_value(&self, row: usize, key: &str) -> Option<f64> {
        let data = self.rows.get(row)?;
        self.derived_spec(key)?.value(data)
    }

    fn derived_spec(&self, key: &str) -> Option<&DerivedColumnSpec> {
        self.policy.derived_columns.iter().find(|spec| spec.key() == key)
    }
}
