//! Volume-Weighted Average Price (VWAP), anchored at the first row.
//!
//! VWAP[t] = Σ_{k<=t} volume[k] * typical[k] / Σ_{k<=t} volume[k]
//! typical = (high + low + close) / 3
//! Running totals from series start; never reset.
//! Lookback: 0. Undefined while cumulative volume is zero.

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let mut weighted = 0.0;
        let mut volume = 0.0;

        bars.iter()
            .map(|bar| {
                weighted += bar.volume * bar.typical_price();
                volume += bar.volume;
                if volume == 0.0 {
                    f64::NAN
                } else {
                    weighted / volume
                }
            })
            .collect()
    }
}
