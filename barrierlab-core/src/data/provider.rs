//! Series source trait and structured error types.
//!
//! The SeriesSource trait abstracts over where daily bars come from (Yahoo
//! Finance, a directory of per-symbol CSV files) so the fetch and build stages
//! can swap implementations and mock them in tests.

use crate::domain::{PriceBar, SeriesError};
use chrono::NaiveDate;
use thiserror::Error;

/// Structured error types for data operations.
///
/// Every variant is recoverable at the symbol level: callers log it and omit
/// the symbol.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no stored data for symbol '{symbol}'; run `fetch {symbol}` first")]
    NoStoredData { symbol: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("malformed series: {0}")]
    Series(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    pub(crate) fn io(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        DataError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Trait for series sources (Yahoo Finance, CSV directory, test fixtures).
///
/// Returned bars are date-ascending and carry `code` as their symbol.
pub trait SeriesSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily bars for `code` on or after `start`.
    fn fetch(&self, code: &str, start: NaiveDate) -> Result<Vec<PriceBar>, DataError>;
}
