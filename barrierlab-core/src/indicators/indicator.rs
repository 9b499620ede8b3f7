//! Indicator trait and the ordered container of computed feature columns.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Each is computed once per symbol over the whole series.

use crate::domain::PriceBar;

/// Trait for feature indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at row t may depend on price data from row t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "sma_20", "rsi").
    fn name(&self) -> &str;

    /// Number of rows needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Named feature columns in insertion order.
///
/// Order is part of the output schema, so columns are kept in a `Vec` rather
/// than a map; lookups by name are linear over a handful of columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorValues {
    columns: Vec<(String, Vec<f64>)>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named series, replacing any existing column of the same name.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name, values)),
        }
    }

    /// Get the value of a named column at a row index.
    pub fn get(&self, name: &str, row: usize) -> Option<f64> {
        self.get_series(name).and_then(|v| v.get(row).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    /// All column values at one row, in column order.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns
            .iter()
            .map(|(_, v)| v.get(row).copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Number of columns stored.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
