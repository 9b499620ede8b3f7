//! Indicator engine: the configured feature set for one symbol's series.
//!
//! The feature set is fixed by [`IndicatorConfig`] and computed once over the
//! whole series. Rows are never dropped here; warmup rows carry NaN so that
//! forward-looking labeling still sees every bar.

use super::ema::Ema;
use super::indicator::{Indicator, IndicatorValues};
use super::macd::{Macd, MacdLine};
use super::roc::VolumeRoc;
use super::rsi::Rsi;
use super::sma::Sma;
use super::volume::{AccumulatedTradingVolume, TradingVolume, TradingVolumeMean};
use super::vwap::Vwap;
use crate::config::{ConfigError, IndicatorConfig};
use crate::domain::{PriceBar, PriceSeries};

/// A price series together with its computed feature columns.
///
/// Every column has exactly `series.len()` values.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    series: PriceSeries,
    values: IndicatorValues,
}

impl IndicatorFrame {
    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    pub fn bars(&self) -> &[PriceBar] {
        self.series.bars()
    }

    pub fn values(&self) -> &IndicatorValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_parts(self) -> (PriceSeries, IndicatorValues) {
        (self.series, self.values)
    }
}

pub struct IndicatorEngine {
    config: IndicatorConfig,
    indicators: Vec<Box<dyn Indicator>>,
}

impl std::fmt::Debug for IndicatorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorEngine")
            .field("config", &self.config)
            .field("features", &self.feature_names())
            .finish()
    }
}

impl IndicatorEngine {
    /// Build the feature set. Rejects zero windows and `macd_fast >= macd_slow`.
    pub fn new(config: IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Rsi::new(config.rsi_window)),
            Box::new(Macd::new(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
                MacdLine::Main,
            )),
            Box::new(Macd::new(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
                MacdLine::Signal,
            )),
        ];
        for &period in &config.ma_periods {
            indicators.push(Box::new(Sma::new(period)));
            indicators.push(Box::new(Ema::new(period)));
        }
        indicators.push(Box::new(TradingVolume));
        indicators.push(Box::new(Vwap::new()));
        indicators.push(Box::new(TradingVolumeMean::new(config.matv_window)));
        indicators.push(Box::new(VolumeRoc::new(config.vroc_window)));
        indicators.push(Box::new(AccumulatedTradingVolume));

        Ok(Self { config, indicators })
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Output column names, in output order.
    pub fn feature_names(&self) -> Vec<String> {
        self.indicators.iter().map(|i| i.name().to_string()).collect()
    }

    /// The maximum lookback across all columns: rows before this index have
    /// at least one undefined feature.
    pub fn lookback(&self) -> usize {
        self.indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
    }

    pub fn compute(&self, series: PriceSeries) -> IndicatorFrame {
        let bars = series.bars();
        let mut values = IndicatorValues::new();
        for indicator in &self.indicators {
            let column = indicator.compute(bars);
            debug_assert_eq!(
                column.len(),
                bars.len(),
                "indicator '{}' produced {} values for {} bars (symbol={})",
                indicator.name(),
                column.len(),
                bars.len(),
                series.symbol()
            );
            values.insert(indicator.name(), column);
        }
        IndicatorFrame { series, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn small_config() -> IndicatorConfig {
        IndicatorConfig {
            rsi_window: 3,
            macd_fast: 2,
            macd_slow: 4,
            macd_signal: 2,
            ma_periods: [5, 2].into_iter().collect(),
            matv_window: 3,
            vroc_window: 2,
        }
    }

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("TEST", make_bars(closes)).unwrap()
    }

    #[test]
    fn feature_names_in_output_order() {
        let engine = IndicatorEngine::new(small_config()).unwrap();
        assert_eq!(
            engine.feature_names(),
            vec![
                "rsi",
                "macd",
                "macd_signal",
                "sma_2",
                "ema_2",
                "sma_5",
                "ema_5",
                "trading_volume",
                "vwap",
                "ma_trading_volume_3",
                "volume_roc_2",
                "accumulated_trading_volume",
            ]
        );
    }

    #[test]
    fn default_engine_lookback_is_longest_window() {
        let engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
        assert_eq!(engine.lookback(), 199);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = IndicatorConfig {
            rsi_window: 0,
            ..Default::default()
        };
        assert!(IndicatorEngine::new(config).is_err());
    }

    #[test]
    fn compute_preserves_length_and_order() {
        let closes: Vec<f64> = (0..12).map(|i| 100.0 + i as f64).collect();
        let engine = IndicatorEngine::new(small_config()).unwrap();
        let frame = engine.compute(series(&closes));

        assert_eq!(frame.len(), 12);
        assert_eq!(frame.symbol(), "TEST");
        assert_eq!(frame.values().len(), engine.feature_names().len());
        for name in engine.feature_names() {
            assert_eq!(frame.values().get_series(&name).unwrap().len(), 12);
        }
        assert_approx(
            frame.values().get("sma_5", 4).unwrap(),
            102.0,
            DEFAULT_EPSILON,
        );
        assert!(frame.values().get("sma_5", 3).unwrap().is_nan());
    }

    #[test]
    fn every_feature_defined_after_lookback() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64).sin()).collect();
        let engine = IndicatorEngine::new(small_config()).unwrap();
        let frame = engine.compute(series(&closes));
        for row in engine.lookback()..frame.len() {
            assert!(frame.values().row(row).iter().all(|v| !v.is_nan()));
        }
    }

    #[test]
    fn empty_series_yields_empty_columns() {
        let engine = IndicatorEngine::new(small_config()).unwrap();
        let frame = engine.compute(PriceSeries::new("TEST", Vec::new()).unwrap());
        assert!(frame.is_empty());
        assert_eq!(frame.values().get_series("rsi").unwrap().len(), 0);
    }
}
