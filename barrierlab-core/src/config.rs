//! Typed parameter records for the indicator engine and the barrier labeler.
//!
//! Both records deserialize from TOML with every field defaulted, and both are
//! validated before any computation starts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Parameter misconfiguration. Always fatal: raised before any symbol is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1 (got {value})")]
    ZeroWindow { name: &'static str, value: usize },

    #[error("macd_fast ({fast}) must be shorter than macd_slow ({slow})")]
    MacdOrder { fast: usize, slow: usize },

    #[error("profit_threshold must be finite and > 1 (got {0})")]
    ProfitThreshold(f64),

    #[error("loss_threshold must be finite and in (0, 1) (got {0})")]
    LossThreshold(f64),

    #[error("horizon must be a positive number of rows")]
    ZeroHorizon,
}

/// Window sizes for every derived feature column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// One SMA and one EMA column per period, in ascending order.
    pub ma_periods: BTreeSet<usize>,
    /// Rolling window for the mean of currency volume.
    pub matv_window: usize,
    /// Lag for the percentage rate-of-change of currency volume.
    pub vroc_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_window: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            ma_periods: [20, 50, 100, 200].into_iter().collect(),
            matv_window: 20,
            vroc_window: 20,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("rsi_window", self.rsi_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("matv_window", self.matv_window),
            ("vroc_window", self.vroc_window),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::ZeroWindow { name, value });
            }
        }
        if self.ma_periods.contains(&0) {
            return Err(ConfigError::ZeroWindow {
                name: "ma_periods",
                value: 0,
            });
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::MacdOrder {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        Ok(())
    }
}

/// First-touch barrier parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    /// Upper barrier as a multiple of the entry close (must be > 1).
    pub profit_threshold: f64,
    /// Lower barrier as a multiple of the entry close (must be in (0, 1)).
    pub loss_threshold: f64,
    /// Number of forward rows examined; the auto-close row is `i + horizon`.
    pub horizon: usize,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            profit_threshold: 1.05,
            loss_threshold: 0.95,
            horizon: 20,
        }
    }
}

impl BarrierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.profit_threshold.is_finite() || self.profit_threshold <= 1.0 {
            return Err(ConfigError::ProfitThreshold(self.profit_threshold));
        }
        if !self.loss_threshold.is_finite()
            || self.loss_threshold <= 0.0
            || self.loss_threshold >= 1.0
        {
            return Err(ConfigError::LossThreshold(self.loss_threshold));
        }
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        Ok(())
    }
}
