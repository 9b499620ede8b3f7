//! Parallel per-symbol labeling and merge.
//!
//! Each symbol runs indicators then barrier labeling independently on a rayon
//! worker. Symbols share nothing but the read-only engine and labeler, so the
//! merged result does not depend on worker count or completion order. A
//! malformed or unfetchable symbol is logged and omitted; it never aborts the
//! batch.

use crate::config::BuildConfig;
use barrierlab_core::data::{DataError, SeriesSource};
use barrierlab_core::{
    BarrierConfig, BarrierLabeler, Dataset, IndicatorConfig, IndicatorEngine, LabelStats,
    LabeledTable, PriceBar, PriceSeries, SeriesError,
};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Raw bars for one symbol, as handed to the builder.
#[derive(Debug, Clone)]
pub struct SymbolBars {
    pub code: String,
    pub bars: Vec<PriceBar>,
}

impl SymbolBars {
    pub fn new(code: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            code: code.into(),
            bars,
        }
    }
}

/// Why a single symbol was omitted from the merged dataset.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] barrierlab_core::ConfigError),

    #[error("no symbols provided")]
    NoSymbols,

    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolStatus {
    Labeled { rows: usize, stats: LabelStats },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub code: String,
    #[serde(flatten)]
    pub status: SymbolStatus,
}

/// Per-symbol outcomes in input order, plus totals over the merged dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub symbols: Vec<SymbolReport>,
    pub rows: usize,
    pub stats: LabelStats,
}

impl BuildReport {
    pub fn succeeded(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s.status, SymbolStatus::Labeled { .. }))
            .count()
    }

    /// `(code, error)` for every omitted symbol.
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.symbols
            .iter()
            .filter_map(|s| match &s.status {
                SymbolStatus::Failed { error } => Some((s.code.as_str(), error.as_str())),
                SymbolStatus::Labeled { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Merged rows of every labeled symbol, ordered by (date, code).
    pub dataset: Dataset,
    pub report: BuildReport,
}

/// Progress callback for a build. Called from worker threads.
pub trait BuildProgress: Sync {
    /// Called once per symbol as it finishes; `completed` counts finished
    /// symbols including this one.
    fn on_symbol_done(&self, code: &str, completed: usize, total: usize, status: &SymbolStatus);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints one line per symbol to stderr.
pub struct StderrProgress;

impl BuildProgress for StderrProgress {
    fn on_symbol_done(&self, code: &str, completed: usize, total: usize, status: &SymbolStatus) {
        match status {
            SymbolStatus::Labeled { rows, .. } => {
                eprintln!("[{completed}/{total}] {code}: {rows} rows")
            }
            SymbolStatus::Failed { error } => {
                eprintln!("[{completed}/{total}] {code}: FAILED ({error})")
            }
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        eprintln!("labeled {succeeded}/{total} symbols ({failed} failed)");
    }
}

#[derive(Debug)]
pub struct DatasetBuilder {
    engine: IndicatorEngine,
    labeler: BarrierLabeler,
    drop_incomplete: bool,
    threads: Option<usize>,
}

impl DatasetBuilder {
    pub fn new(indicators: IndicatorConfig, barrier: BarrierConfig) -> Result<Self, BuildError> {
        Ok(Self {
            engine: IndicatorEngine::new(indicators)?,
            labeler: BarrierLabeler::new(barrier)?,
            drop_incomplete: false,
            threads: None,
        })
    }

    pub fn from_config(config: &BuildConfig) -> Result<Self, BuildError> {
        Ok(Self::new(config.indicators.clone(), config.barrier)?
            .with_drop_incomplete(config.output.drop_incomplete_features))
    }

    /// Drop labeled rows that have any undefined feature.
    pub fn with_drop_incomplete(mut self, drop: bool) -> Self {
        self.drop_incomplete = drop;
        self
    }

    /// Run on a dedicated pool of `n` workers instead of the global pool.
    pub fn with_threads(mut self, n: usize) -> Self {
        self.threads = Some(n.max(1));
        self
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.engine.feature_names()
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn labeler(&self) -> &BarrierLabeler {
        &self.labeler
    }

    /// Validate, compute indicators, and label one symbol.
    pub fn process_symbol(&self, input: SymbolBars) -> Result<LabeledTable, SymbolError> {
        let series = PriceSeries::new(input.code, input.bars)?;
        let frame = self.engine.compute(series);
        let mut table = self.labeler.label(frame);
        if self.drop_incomplete {
            table.rows.retain(|row| row.is_complete());
        }
        debug!(symbol = %table.symbol, rows = table.rows.len(), "symbol labeled");
        Ok(table)
    }

    /// Label every symbol in parallel and merge the results.
    pub fn build(
        &self,
        inputs: Vec<SymbolBars>,
        progress: Option<&dyn BuildProgress>,
    ) -> Result<BuildOutput, BuildError> {
        let work = |input: SymbolBars| {
            let code = input.code.clone();
            (code, self.process_symbol(input))
        };
        self.fan_out(inputs, work, progress)
    }

    /// Fetch each code from `source` and label it, both on the worker pool.
    pub fn build_from_source(
        &self,
        source: &dyn SeriesSource,
        codes: &[String],
        start: NaiveDate,
        progress: Option<&dyn BuildProgress>,
    ) -> Result<BuildOutput, BuildError> {
        let work = |code: String| {
            let result = source
                .fetch(&code, start)
                .map_err(SymbolError::from)
                .and_then(|bars| self.process_symbol(SymbolBars::new(code.clone(), bars)));
            (code, result)
        };
        self.fan_out(codes.to_vec(), work, progress)
    }

    fn fan_out<T, F>(
        &self,
        items: Vec<T>,
        work: F,
        progress: Option<&dyn BuildProgress>,
    ) -> Result<BuildOutput, BuildError>
    where
        T: Send,
        F: Fn(T) -> (String, Result<LabeledTable, SymbolError>) + Sync,
    {
        if items.is_empty() {
            return Err(BuildError::NoSymbols);
        }
        let total = items.len();
        let started = Instant::now();
        let completed = AtomicUsize::new(0);

        let run = || -> Vec<(String, Result<LabeledTable, SymbolError>)> {
            items
                .into_par_iter()
                .map(|item| {
                    let (code, result) = work(item);
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.on_symbol_done(&code, done, total, &status_of(&result));
                    }
                    (code, result)
                })
                .collect()
        };

        let results = match self.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| BuildError::ThreadPool(e.to_string()))?
                .install(run),
            None => run(),
        };

        let output = self.merge(results);
        let succeeded = output.report.succeeded();
        let failed = total - succeeded;
        if let Some(p) = progress {
            p.on_batch_complete(succeeded, failed, total);
        }
        info!(
            symbols = total,
            succeeded,
            failed,
            rows = output.report.rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset built"
        );
        Ok(output)
    }

    fn merge(&self, results: Vec<(String, Result<LabeledTable, SymbolError>)>) -> BuildOutput {
        let mut dataset = Dataset::new(self.engine.feature_names());
        let mut report = BuildReport::default();

        for (code, result) in results {
            let status = status_of(&result);
            match result {
                Ok(table) => {
                    report.stats += table.stats;
                    dataset.extend(table.rows);
                }
                Err(e) => warn!(symbol = %code, error = %e, "symbol omitted"),
            }
            report.symbols.push(SymbolReport { code, status });
        }

        dataset.sort_by_date();
        report.rows = dataset.len();
        BuildOutput { dataset, report }
    }
}

fn status_of(result: &Result<LabeledTable, SymbolError>) -> SymbolStatus {
    match result {
        Ok(table) => SymbolStatus::Labeled {
            rows: table.rows.len(),
            stats: table.stats,
        },
        Err(e) => SymbolStatus::Failed {
            error: e.to_string(),
        },
    }
}
