//! Error handling for the case insights crate.
//!
//! Only the edges of the crate fail: fetching analytics from the backend,
//! loading settings, and reading files from the CLI. The table engine in
//! [`crate::insight`] never returns errors; malformed rows and unformattable
//! cells degrade to placeholders instead.
//!
//! ## Error categories
//!
//! ```
//! use case_insights::error::InsightError;
//!
//! fn describe(err: &InsightError) -> &'static str {
//!     match err {
//!         InsightError::Network(_) | InsightError::Http { .. } => "backend unavailable",
//!         InsightError::Parse(_) => "unexpected response shape",
//!         _ => "local failure",
//!     }
//! }
//!
//! let err = InsightError::Http { status: 503, detail: "Fabric data unavailable".to_owned() };
//! assert_eq!(describe(&err), "backend unavailable");
//! ```
//!
//! ## Context
//!
//! [`ResultExt`] adds `.context()` to any result whose error converts into
//! [`InsightError`]:
//!
//! ```no_run
//! use case_insights::error::ResultExt;
//!
//! fn read_rows(path: &str) -> case_insights::error::Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read rows file")
//! }
//! ```

use std::fmt;

/// Main error type for fetch, configuration and I/O failures.
#[derive(Debug)]
pub enum InsightError {
    /// Transport failure reaching the backend (connect, timeout, reset).
    Network(String),

    /// Backend answered with a non-success status.
    Http { status: u16, detail: String },

    /// Response body or file content did not have the expected shape.
    Parse(String),

    /// Invalid or unreadable settings.
    Config(String),

    /// Local I/O errors.
    Io(std::io::Error),

    /// Generic error with context
    Other(String),
}

impl InsightError {
    /// True for failures of a remote fetch, which the dashboard surfaces to
    /// the user with a retry action.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. } | Self::Parse(_))
    }
}

impl fmt::Display for InsightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Http { status, detail } => write!(f, "Backend returned {status}: {detail}"),
            Self::Parse(msg) => write!(f, "Unexpected response: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for InsightError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InsightError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("JSON error: {err}"))
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                detail: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<InsightError> for String {
    fn from(err: InsightError) -> Self {
        err.to_string()
    }
}

/// Result type alias for case insights operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<InsightError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: InsightError = e.into();
            InsightError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: InsightError = e.into();
            InsightError::Other(format!("{}: {}", f(), err))
        })
    }
}
