//! Build manifest: a JSON record of what a build produced and from what.

use crate::builder::{BuildReport, SymbolReport};
use crate::config::ConfigId;
use crate::filter::FilterStats;
use crate::split::{DatasetSplits, SplitCutoffs};
use barrierlab_core::{Dataset, LabelStats};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_err(path: &Path, err: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub name: String,
    pub rows: usize,
    pub symbols: usize,
    pub path: Option<PathBuf>,
    /// BLAKE3 of the partition's rows (see [`dataset_hash`]).
    pub hash: String,
    pub filter: Option<FilterStats>,
}

impl PartitionEntry {
    pub fn new(name: &str, dataset: &Dataset) -> Self {
        Self {
            name: name.to_string(),
            rows: dataset.len(),
            symbols: dataset.symbols().len(),
            path: None,
            hash: dataset_hash(dataset),
            filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub config_id: ConfigId,
    pub created_at: chrono::NaiveDateTime,
    pub feature_names: Vec<String>,
    pub symbols: Vec<SymbolReport>,
    pub rows: usize,
    pub label_stats: LabelStats,
    pub cutoffs: SplitCutoffs,
    pub discarded: usize,
    pub partitions: Vec<PartitionEntry>,
}

impl BuildManifest {
    /// Record a build. Partition entries describe `splits` as given; callers
    /// that filter or write partitions afterwards update the entries.
    pub fn new(config_id: ConfigId, report: &BuildReport, splits: &DatasetSplits) -> Self {
        Self {
            config_id,
            created_at: chrono::Utc::now().naive_utc(),
            feature_names: splits.train.feature_names().to_vec(),
            symbols: report.symbols.clone(),
            rows: report.rows,
            label_stats: report.stats,
            cutoffs: splits.cutoffs,
            discarded: splits.discarded,
            partitions: splits
                .partitions()
                .into_iter()
                .map(|(name, ds)| PartitionEntry::new(name, ds))
                .collect(),
        }
    }

    pub fn partition_mut(&mut self, name: &str) -> Option<&mut PartitionEntry> {
        self.partitions.iter_mut().find(|p| p.name == name)
    }

    /// Write as pretty JSON via a temp file and rename.
    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))
    }

    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Content hash of a dataset: feature schema then every row in stored order.
///
/// Floats are hashed by bit pattern with every NaN mapped to one canonical
/// value.
pub fn dataset_hash(dataset: &Dataset) -> String {
    let mut hasher = blake3::Hasher::new();
    for name in dataset.feature_names() {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    for row in dataset.rows() {
        hasher.update(row.symbol.as_bytes());
        hasher.update(&[0]);
        hasher.update(row.date.to_string().as_bytes());
        let values = [row.open, row.high, row.low, row.close, row.volume, row.target];
        for v in values.iter().chain(&row.features) {
            let bits = if v.is_nan() { f64::NAN.to_bits() } else { v.to_bits() };
            hasher.update(&bits.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
