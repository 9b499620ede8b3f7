//! Liquidity and capitalization row filter.
//!
//! Each row is joined to the reference table by code. A row survives when its
//! currency trading volume is at least `min_trading_volume` and its joined
//! market cap lies in `[min_market_cap, max_market_cap]`. Rows whose code is
//! missing from the reference table are dropped. Survivors carry the joined
//! value as a `market_cap` feature column.

use crate::config::ConfigError;
use barrierlab_core::data::{DataError, ReferenceTable};
use barrierlab_core::Dataset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const MARKET_CAP_COLUMN: &str = "market_cap";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_trading_volume: f64,
    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub reference_path: PathBuf,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_trading_volume: 0.0,
            min_market_cap: 0.0,
            max_market_cap: 1e20,
            reference_path: PathBuf::from("data/market_cap.csv"),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = [
            ("min_trading_volume", self.min_trading_volume),
            ("min_market_cap", self.min_market_cap),
            ("max_market_cap", self.max_market_cap),
        ];
        for (name, value) in bounds {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::Filter(format!(
                    "{name} must be a non-negative number (got {value})"
                )));
            }
        }
        if self.min_market_cap > self.max_market_cap {
            return Err(ConfigError::Filter(format!(
                "min_market_cap ({}) exceeds max_market_cap ({})",
                self.min_market_cap, self.max_market_cap
            )));
        }
        Ok(())
    }
}

/// Row counts removed by each rule, in the order the rules apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub input: usize,
    pub below_volume: usize,
    pub unmatched: usize,
    pub outside_cap: usize,
}

impl FilterStats {
    pub fn kept(&self) -> usize {
        self.input - self.below_volume - self.unmatched - self.outside_cap
    }
}

/// Filter sharing one read-only reference table across every partition.
#[derive(Debug, Clone)]
pub struct LiquidityFilter {
    config: FilterConfig,
    reference: Arc<ReferenceTable>,
}

impl LiquidityFilter {
    pub fn new(config: FilterConfig, reference: Arc<ReferenceTable>) -> Self {
        Self { config, reference }
    }

    /// Load the reference table named by `config.reference_path`.
    pub fn from_config(config: FilterConfig) -> Result<Self, DataError> {
        let reference = ReferenceTable::from_csv(&config.reference_path)?;
        Ok(Self::new(config, Arc::new(reference)))
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn reference(&self) -> &Arc<ReferenceTable> {
        &self.reference
    }

    pub fn apply(&self, dataset: Dataset) -> Dataset {
        self.apply_with_stats(dataset).0
    }

    pub fn apply_with_stats(&self, mut dataset: Dataset) -> (Dataset, FilterStats) {
        let mut stats = FilterStats {
            input: dataset.len(),
            ..Default::default()
        };
        let config = &self.config;

        dataset.retain(|row| {
            if row.trading_volume() < config.min_trading_volume {
                stats.below_volume += 1;
                return false;
            }
            match self.reference.market_cap(&row.symbol) {
                None => {
                    stats.unmatched += 1;
                    false
                }
                Some(cap) if (config.min_market_cap..=config.max_market_cap).contains(&cap) => {
                    true
                }
                Some(_) => {
                    stats.outside_cap += 1;
                    false
                }
            }
        });

        let reference = &self.reference;
        dataset.set_feature(MARKET_CAP_COLUMN, |row| {
            reference.market_cap(&row.symbol).unwrap_or(f64::NAN)
        });

        info!(
            input = stats.input,
            kept = stats.kept(),
            below_volume = stats.below_volume,
            unmatched = stats.unmatched,
            outside_cap = stats.outside_cap,
            "liquidity filter applied"
        );
        (dataset, stats)
    }
}
