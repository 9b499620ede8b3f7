//! Relative Strength Index (RSI).
//!
//! Simple rolling means of gains and losses over the last `period`
//! close-to-close changes.
//! RSI = 100 - 100 / (1 + mean_gain / mean_loss)
//! Lookback: period.
//! Edge cases: mean_loss == 0 → RSI = 100 (flat windows included); mean_gain == 0 → RSI = 0.

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self { period }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period + 1 {
            return result;
        }

        let changes: Vec<f64> = bars
            .windows(2)
            .map(|w| w[1].close - w[0].close)
            .collect();

        // changes[k] is the move into row k + 1; row t uses changes[t-period..t].
        for t in self.period..n {
            let window = &changes[t - self.period..t];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }
            // Summing each window directly keeps flat windows exactly at zero loss.
            let gain: f64 = window.iter().filter(|&&c| c > 0.0).sum();
            let loss: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum();
            result[t] = compute_rsi(gain, loss);
        }

        result
    }
}

/// Both inputs are sums over the same window, so the common divisor cancels.
fn compute_rsi(gain: f64, loss: f64) -> f64 {
    if loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + gain / loss)
    }
}
