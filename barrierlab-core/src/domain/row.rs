//! LabeledRow: a bar plus its derived features and barrier target.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One labeled sample.
///
/// `features` is positionally aligned with the owning table's feature names.
/// Individual feature values may be NaN (warmup); `target` is always defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub features: Vec<f64>,
    /// Percentage return realized by the triggered exit.
    pub target: f64,
}

impl LabeledRow {
    /// Close price × share volume.
    pub fn trading_volume(&self) -> f64 {
        self.close * self.volume
    }

    /// True when every feature value is defined.
    pub fn is_complete(&self) -> bool {
        self.features.iter().all(|v| !v.is_nan())
    }
}
