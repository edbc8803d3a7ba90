//! # Case Insights - Underwriting Case Analytics
//!
//! Core of an underwriting case dashboard: loosely-typed analytic rows from
//! the backend become sorted, formatted, highlighted tables, and each
//! analytic panel tracks its own fetch and cache lifecycle.
//!
//! ## Quick Start
//!
//! ```
//! use case_insights::insight::{DisplayVariant, TablePayload, build_table, render_text};
//! use serde_json::json;
//!
//! let payload = TablePayload::new(vec![
//!     json!({"loss_year": 2022, "county_avg_paid": 12000, "state_avg_paid": 10000}),
//!     json!({"loss_year": 2023, "county_avg_paid": 9000, "state_avg_paid": 10000}),
//! ]);
//! let table = build_table(Some(&payload), DisplayVariant::SeverityComparison).unwrap();
//!
//! // Newest loss year first, with a derived county-vs-state column.
//! assert_eq!(table.rows[0].number("loss_year"), Some(2023.0));
//! assert_eq!(table.columns.last().unwrap().label, "County vs State Variance");
//! println!("{}", render_text(&table));
//! ```
//!
//! ## Core Modules
//!
//! - [`insight`]: Schema-free table engine
//!   - [`insight::schema`]: Column discovery and labels
//!   - [`insight::policy`]: Per-variant sort, limit, derived columns and highlights
//!   - [`insight::format`]: Cell formatting
//!   - [`insight::table`]: Table model builder
//! - [`staging`]: Per-resource fetch state machine and threaded driver
//! - [`api`]: Backend client and the fetcher seam
//! - [`ui`]: egui painting of tables and resource panels
//! - [`config`]: Settings file and environment overrides
//! - [`error`]: Error types and handling utilities
//!
//! ## Key Concepts
//!
//! ### Rendering never fails
//!
//! Malformed rows are dropped, missing values print as `N/A`, and odd values
//! fall back to their JSON text. Only fetching and configuration return
//! [`error::InsightError`].
//!
//! ### Newest request wins
//!
//! Every fetch carries a generation. A late response from a superseded fetch
//! never overwrites data from a newer one, and a failed refresh keeps the
//! previously loaded table on screen.

#![warn(clippy::all, rust_2018_idioms)]

pub mod api;
pub mod config;
pub mod error;
pub mod insight;
pub mod logging;
pub mod staging;
pub mod ui;
