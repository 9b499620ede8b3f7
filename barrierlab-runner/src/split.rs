//! Time-based train/validation/test partitioning of the merged dataset.
//!
//! Cutoffs are measured back from the latest date in the dataset:
//! - `train_test = max_date - train_period_years`
//! - `test_end   = max_date - test_period_years`
//!
//! Rows before `train_test` form the train+validation pool; rows in
//! `[train_test, test_end)` form the test set; later rows are discarded.
//!
//! The pool is split into train and validation at row level with a seeded
//! shuffle, so validation rows interleave in time with training rows from the
//! same symbol. Every partition is then ordered by (date, code).

use barrierlab_core::Dataset;
use chrono::{Months, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("val_ratio must be in [0, 1) (got {0})")]
    ValRatio(f64),

    /// Equal periods would leave `[train_test, test_end)` empty, so the
    /// build refuses them rather than writing an empty test partition.
    #[error(
        "train_period_years ({train}) must exceed test_period_years ({test}), \
         otherwise the test window is empty"
    )]
    PeriodOrder { train: u32, test: u32 },

    #[error("cannot split an empty dataset")]
    EmptyDataset,

    #[error("{years} years before {max_date} is not a representable date")]
    DateOutOfRange { max_date: NaiveDate, years: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_period_years: u32,
    pub test_period_years: u32,
    /// Fraction of the pool assigned to validation.
    pub val_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_period_years: 3,
            test_period_years: 1,
            val_ratio: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), SplitError> {
        if !(0.0..1.0).contains(&self.val_ratio) {
            return Err(SplitError::ValRatio(self.val_ratio));
        }
        if self.train_period_years <= self.test_period_years {
            return Err(SplitError::PeriodOrder {
                train: self.train_period_years,
                test: self.test_period_years,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCutoffs {
    pub max_date: NaiveDate,
    /// First date of the test window; the pool is strictly before it.
    pub train_test: NaiveDate,
    /// First discarded date.
    pub test_end: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: Dataset,
    pub validation: Dataset,
    pub test: Dataset,
    pub cutoffs: SplitCutoffs,
    /// Rows on or after `cutoffs.test_end`.
    pub discarded: usize,
}

impl DatasetSplits {
    /// Partitions in output order, with their names.
    pub fn partitions(&self) -> [(&'static str, &Dataset); 3] {
        [
            ("train", &self.train),
            ("validation", &self.validation),
            ("test", &self.test),
        ]
    }
}

fn years_before(date: NaiveDate, years: u32) -> Result<NaiveDate, SplitError> {
    date.checked_sub_months(Months::new(years.saturating_mul(12)))
        .ok_or(SplitError::DateOutOfRange {
            max_date: date,
            years,
        })
}

/// Compute the cutoffs for a dataset whose latest date is `max_date`.
pub fn compute_cutoffs(max_date: NaiveDate, config: &SplitConfig) -> Result<SplitCutoffs, SplitError> {
    Ok(SplitCutoffs {
        max_date,
        train_test: years_before(max_date, config.train_period_years)?,
        test_end: years_before(max_date, config.test_period_years)?,
    })
}

/// Split a merged dataset. Deterministic for a given dataset and seed.
pub fn split_dataset(mut dataset: Dataset, config: &SplitConfig) -> Result<DatasetSplits, SplitError> {
    config.validate()?;
    let max_date = dataset.max_date().ok_or(SplitError::EmptyDataset)?;
    let cutoffs = compute_cutoffs(max_date, config)?;

    dataset.sort_by_date();
    let feature_names = dataset.feature_names().to_vec();

    let mut pool = Vec::new();
    let mut test = Vec::new();
    let mut discarded = 0usize;
    for row in dataset.into_rows() {
        if row.date < cutoffs.train_test {
            pool.push(row);
        } else if row.date < cutoffs.test_end {
            test.push(row);
        } else {
            discarded += 1;
        }
    }

    let n_val = (config.val_ratio * pool.len() as f64).ceil() as usize;
    let mut order: Vec<usize> = (0..pool.len()).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    order.shuffle(&mut rng);
    let mut is_val = vec![false; pool.len()];
    for &idx in &order[..n_val] {
        is_val[idx] = true;
    }

    // Pool is already date-ordered, so both halves stay date-ordered.
    let (validation, train): (Vec<_>, Vec<_>) = pool
        .into_iter()
        .zip(is_val)
        .partition(|(_, val)| *val);
    let strip = |rows: Vec<(barrierlab_core::LabeledRow, bool)>| {
        Dataset::from_rows(
            feature_names.clone(),
            rows.into_iter().map(|(r, _)| r).collect(),
        )
    };

    let splits = DatasetSplits {
        train: strip(train),
        validation: strip(validation),
        test: Dataset::from_rows(feature_names.clone(), test),
        cutoffs,
        discarded,
    };

    info!(
        train = splits.train.len(),
        validation = splits.validation.len(),
        test = splits.test.len(),
        discarded,
        train_test_cutoff = %cutoffs.train_test,
        test_end_cutoff = %cutoffs.test_end,
        "dataset split"
    );
    Ok(splits)
}
