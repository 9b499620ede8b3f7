//! BarrierLab Core: price series, indicators, barrier labeling, data sources and stores.
//!
//! This crate contains the per-symbol half of the dataset pipeline:
//! - Domain types (bars, validated series, labeled rows, datasets)
//! - Indicator trait, concrete indicators, and the indicator engine
//! - First-touch barrier labeler
//! - Series sources (Yahoo Finance, CSV directory) and table persistence
//! - Market-capitalization reference table

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod labeling;

pub use config::{BarrierConfig, ConfigError, IndicatorConfig};
pub use domain::{Dataset, LabeledRow, PriceBar, PriceSeries, SeriesError};
pub use indicators::{IndicatorEngine, IndicatorFrame};
pub use labeling::{BarrierLabeler, BarrierOutcome, ExitKind, LabelStats, LabeledTable};
