//! PriceSeries: a validated, date-ordered run of bars for one symbol.

use super::bar::PriceBar;
use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a series is rejected as malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series has an empty symbol code")]
    EmptySymbol,

    #[error("row {index} belongs to '{found}', expected '{expected}'")]
    ForeignRow {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("dates not strictly increasing at row {index}: {previous} then {current}")]
    NonMonotonicDate {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("row {index} has an out-of-range {field}")]
    InvalidValue { index: usize, field: &'static str },
}

/// Ordered price/volume series for exactly one symbol.
///
/// Invariants (checked by [`PriceSeries::new`]):
/// - every bar carries the series symbol
/// - dates are unique and strictly increasing
/// - OHLC and volume are finite and non-negative
/// - close is strictly positive
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(SeriesError::EmptySymbol);
        }

        for (index, bar) in bars.iter().enumerate() {
            if bar.symbol != symbol {
                return Err(SeriesError::ForeignRow {
                    index,
                    expected: symbol,
                    found: bar.symbol.clone(),
                });
            }
            if let Some(field) = bar.invalid_field() {
                return Err(SeriesError::InvalidValue { index, field });
            }
            if index > 0 && bars[index - 1].date >= bar.date {
                return Err(SeriesError::NonMonotonicDate {
                    index,
                    previous: bars[index - 1].date,
                    current: bar.date,
                });
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}
