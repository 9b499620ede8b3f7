//! Feature indicators and the engine that assembles them.
//!
//! Every indicator implements the single-series `Indicator` trait and is
//! computed once per symbol over the whole series. The engine fixes the set
//! and order of output columns from an `IndicatorConfig`.
//!
//! MACD is exposed as two named instances (main and signal line), keeping the
//! single-series trait unchanged.

pub mod ema;
pub mod engine;
pub mod indicator;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod volume;
pub mod vwap;

pub use ema::{ema_of_series, Ema};
pub use engine::{IndicatorEngine, IndicatorFrame};
pub use indicator::{Indicator, IndicatorValues};
pub use macd::{Macd, MacdLine};
pub use roc::{pct_change, VolumeRoc};
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma};
pub use volume::{AccumulatedTradingVolume, TradingVolume, TradingVolumeMean};
pub use vwap::Vwap;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            PriceBar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
