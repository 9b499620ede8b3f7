//! Volume Rate of Change.
//!
//! Percentage change of currency volume (close × volume) over N rows.
//! VROC[t] = (tv[t] / tv[t-period] - 1) * 100
//! Lookback: period.
//! Edge cases: tv[t-period] == 0 → NaN.

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct VolumeRoc {
    period: usize,
    name: String,
}

impl VolumeRoc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume ROC period must be >= 1");
        Self {
            period,
            name: format!("volume_roc_{period}"),
        }
    }
}

impl Indicator for VolumeRoc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let tv: Vec<f64> = bars.iter().map(PriceBar::trading_volume).collect();
        pct_change(&tv, self.period)
    }
}

/// Percentage change against the value `period` rows earlier.
pub fn pct_change(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    for i in period..n {
        let prev = values[i - period];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            result[i] = f64::NAN;
        } else {
            result[i] = (curr / prev - 1.0) * 100.0;
        }
    }

    result
}
