//! PriceBar: one trading day of one symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single symbol.
///
/// `volume` is the share count; currency volume is derived on demand via
/// [`PriceBar::trading_volume`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// (high + low + close) / 3, the price VWAP weights by volume.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Close price × share volume.
    pub fn trading_volume(&self) -> f64 {
        self.close * self.volume
    }

    /// Returns the name of the first field that is non-finite or negative,
    /// or `"close"` when the close is zero (returns are taken relative to it).
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
        .into_iter()
        .find(|&(name, v)| !v.is_finite() || v < 0.0 || (name == "close" && v == 0.0))
        .map(|(name, _)| name)
    }
}
