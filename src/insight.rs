//! Schema-free tabular insight engine.
//!
//! Turns loosely-typed analytic rows into a sorted, typed, highlighted
//! [`TableModel`]:
//!
//! ```text
//! raw JSON rows ──> AnalyticRow (records only)
//!                     │
//!                     ├─> schema::infer_columns   (unless explicit keys)
//!                     ├─> policy::resolve_policy  (sort, limit, derived, highlight)
//!                     └─> table::build_table      (sort, truncate, describe columns)
//!                                │
//!                                └─> TableModel::cell ──> format::format_cell
//! ```
//!
//! ```
//! use case_insights::insight::{DisplayVariant, TablePayload, build_table};
//! use serde_json::json;
//!
//! let payload = TablePayload::new(vec![
//!     json!({"claim_id": "A", "paid_amount": 310000}),
//!     json!({"claim_id": "B", "paid_amount": 90000}),
//! ]);
//! let table = build_table(Some(&payload), DisplayVariant::LargeLossListing).unwrap();
//! assert_eq!(table.cell(0, 1).unwrap().text, "$310,000");
//! assert!(table.row_flagged(0));
//! ```

pub mod format;
pub mod policy;
pub mod row;
pub mod schema;
pub mod table;
pub mod text;

pub use format::{Highlight, RenderedCell, format_cell, format_value};
pub use policy::{DisplayVariant, Policy, PolicyLimits, resolve_policy, resolve_policy_with};
pub use row::{AnalyticRow, CellValue};
pub use schema::{ColumnKind, infer_columns};
pub use table::{
    Alignment, ColumnDescriptor, TableModel, TablePayload, build_table, build_table_with,
};
pub use text::render_text;
