//! BarrierLab Runner: dataset build orchestration.
//!
//! This crate builds on `barrierlab-core` to provide:
//! - TOML build configuration with a reproducibility fingerprint
//! - Parallel per-symbol labeling and merge
//! - Bounded-parallel series fetching
//! - Time-based train/validation/test splitting
//! - Liquidity and market-cap filtering
//! - Build manifests

pub mod builder;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod manifest;
pub mod split;

pub use builder::{
    BuildError, BuildOutput, BuildProgress, BuildReport, DatasetBuilder, StderrProgress,
    SymbolBars, SymbolError, SymbolReport, SymbolStatus,
};
pub use config::{BuildConfig, ConfigError, ConfigId, OutputConfig};
pub use fetch::{fetch_all, FetchError, FetchSummary};
pub use filter::{FilterConfig, FilterStats, LiquidityFilter, MARKET_CAP_COLUMN};
pub use manifest::{dataset_hash, BuildManifest, ManifestError, PartitionEntry};
pub use split::{compute_cutoffs, split_dataset, DatasetSplits, SplitConfig, SplitCutoffs, SplitError};
