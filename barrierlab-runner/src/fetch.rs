//! Bounded-parallel acquisition of raw series from a [`SeriesSource`].

use barrierlab_core::data::{DataError, SeriesSource};
use barrierlab_core::PriceBar;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no symbols provided")]
    NoSymbols,

    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}

/// Bars per successfully fetched code, and the reason each other code failed.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub fetched: BTreeMap<String, Vec<PriceBar>>,
    pub failed: Vec<(String, String)>,
}

/// Fetch every code on a pool of `workers` threads.
///
/// A code that errors or returns no bars is recorded in `failed`; the others
/// still complete.
pub fn fetch_all(
    source: &dyn SeriesSource,
    codes: &[String],
    start: NaiveDate,
    workers: usize,
) -> Result<FetchSummary, FetchError> {
    if codes.is_empty() {
        return Err(FetchError::NoSymbols);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| FetchError::ThreadPool(e.to_string()))?;

    let results: Vec<(String, Result<Vec<PriceBar>, DataError>)> = pool.install(|| {
        codes
            .par_iter()
            .map(|code| {
                let result = source.fetch(code, start).and_then(|bars| {
                    if bars.is_empty() {
                        Err(DataError::SymbolNotFound {
                            symbol: code.clone(),
                        })
                    } else {
                        Ok(bars)
                    }
                });
                (code.clone(), result)
            })
            .collect()
    });

    let mut summary = FetchSummary::default();
    for (code, result) in results {
        match result {
            Ok(bars) => {
                summary.fetched.insert(code, bars);
            }
            Err(e) => {
                warn!(symbol = %code, source = source.name(), error = %e, "fetch failed");
                summary.failed.push((code, e.to_string()));
            }
        }
    }

    info!(
        source = source.name(),
        fetched = summary.fetched.len(),
        failed = summary.failed.len(),
        "fetch complete"
    );
    Ok(summary)
}
