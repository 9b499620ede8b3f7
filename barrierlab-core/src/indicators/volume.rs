//! Currency-volume columns.
//!
//! - `trading_volume`: close × volume. Lookback 0.
//! - `ma_trading_volume_{w}`: rolling mean of trading volume. Lookback w - 1.
//! - `accumulated_trading_volume`: running total of trading volume from row 0. Lookback 0.

use super::indicator::Indicator;
use super::sma::sma_of_series;
use crate::domain::PriceBar;

fn trading_volumes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(PriceBar::trading_volume).collect()
}

#[derive(Debug, Clone, Default)]
pub struct TradingVolume;

impl Indicator for TradingVolume {
    fn name(&self) -> &str {
        "trading_volume"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        trading_volumes(bars)
    }
}

#[derive(Debug, Clone)]
pub struct TradingVolumeMean {
    period: usize,
    name: String,
}

impl TradingVolumeMean {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "trading volume mean period must be >= 1");
        Self {
            period,
            name: format!("ma_trading_volume_{period}"),
        }
    }
}

impl Indicator for TradingVolumeMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        sma_of_series(&trading_volumes(bars), self.period)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccumulatedTradingVolume;

impl Indicator for AccumulatedTradingVolume {
    fn name(&self) -> &str {
        "accumulated_trading_volume"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let mut total = 0.0;
        bars.iter()
            .map(|bar| {
                total += bar.trading_volume();
                total
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn trading_volume_is_close_times_volume() {
        let bars = make_bars(&[10.0, 20.0]);
        let result = TradingVolume.compute(&bars);
        assert_eq!(result, vec![10_000.0, 20_000.0]);
    }

    #[test]
    fn trading_volume_mean_window() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let result = TradingVolumeMean::new(2).compute(&bars);
        assert!(result[0].is_nan());
        assert_approx(result[1], 15_000.0, DEFAULT_EPSILON);
        assert_approx(result[3], 35_000.0, DEFAULT_EPSILON);
    }

    #[test]
    fn accumulated_volume_is_running_total() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let result = AccumulatedTradingVolume.compute(&bars);
        assert_eq!(result, vec![10_000.0, 30_000.0, 60_000.0]);
    }

    #[test]
    fn names() {
        assert_eq!(TradingVolumeMean::new(20).name(), "ma_trading_volume_20");
        assert_eq!(TradingVolumeMean::new(20).lookback(), 19);
        assert_eq!(TradingVolumeMean::new(1).lookback(), 0);
    }
}
