//! Serializable build configuration.
//!
//! One TOML document captures every parameter needed to reproduce a dataset:
//! indicator windows, barrier thresholds, split periods, the optional
//! liquidity filter, and output options. Every field has a default, so an
//! empty file is a valid configuration.

use crate::filter::FilterConfig;
use crate::split::{SplitConfig, SplitError};
use barrierlab_core::data::TableFormat;
use barrierlab_core::{BarrierConfig, IndicatorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Content-addressable identifier of a build configuration.
pub type ConfigId = String;

/// Configuration failures. Always raised before any symbol is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid config TOML: {0}")]
    Parse(String),

    #[error(transparent)]
    Parameter(#[from] barrierlab_core::ConfigError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("invalid filter: {0}")]
    Filter(String),

    #[error("config serialization failed: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: TableFormat,
    /// Drop labeled rows with any undefined feature (warmup rows).
    pub drop_incomplete_features: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub indicators: IndicatorConfig,
    pub barrier: BarrierConfig,
    pub split: SplitConfig,
    /// Applied to every partition when present.
    pub filter: Option<FilterConfig>,
    pub output: OutputConfig,
}

impl BuildConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    /// Check every section. The first failure is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        self.barrier.validate()?;
        self.split.validate()?;
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the canonical JSON encoding.
    ///
    /// Two builds with identical configs share an id.
    pub fn config_id(&self) -> Result<ConfigId, ConfigError> {
        let json = serde_json::to_vec(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = BuildConfig::from_toml("").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert!(config.validate().is_ok());
        assert!(config.filter.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let text = r#"
            [indicators]
            rsi_window = 10
            ma_periods = [5, 60]

            [barrier]
            profit_threshold = 1.15
            horizon = 10

            [split]
            train_period_years = 4
            val_ratio = 0.1

            [filter]
            min_trading_volume = 1e9
            min_market_cap = 1e10
            max_market_cap = 1e12
            reference_path = "ref/market_cap.csv"

            [output]
            format = "csv"
            drop_incomplete_features = true
        "#;
        let config = BuildConfig::from_toml(text).unwrap();
        assert_eq!(config.indicators.rsi_window, 10);
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.barrier.profit_threshold, 1.15);
        assert_eq!(config.barrier.loss_threshold, 0.95);
        assert_eq!(config.split.train_period_years, 4);
        assert_eq!(config.split.seed, 42);
        let filter = config.filter.as_ref().unwrap();
        assert_eq!(filter.min_market_cap, 1e10);
        assert_eq!(config.output.format, TableFormat::Csv);
        assert!(config.output.drop_incomplete_features);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_reports_each_section() {
        let mut config = BuildConfig::default();
        config.barrier.loss_threshold = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Parameter(_))));

        let mut config = BuildConfig::default();
        config.split.test_period_years = 5;
        assert!(matches!(config.validate(), Err(ConfigError::Split(_))));

        let config = BuildConfig {
            filter: Some(FilterConfig {
                min_trading_volume: -1.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Filter(_))));
    }

    #[test]
    fn unknown_format_is_parse_error() {
        let err = BuildConfig::from_toml("[output]\nformat = \"hdf5\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn config_id_deterministic_and_sensitive() {
        let a = BuildConfig::default();
        let mut b = BuildConfig::default();
        assert_eq!(a.config_id().unwrap(), b.config_id().unwrap());

        b.barrier.horizon = 10;
        assert_ne!(a.config_id().unwrap(), b.config_id().unwrap());
    }
}
