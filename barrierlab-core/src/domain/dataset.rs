//! Dataset: a table of labeled rows sharing one feature schema.

use super::row::LabeledRow;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// A collection of [`LabeledRow`]s with a shared, ordered feature schema.
///
/// Used both for the merged multi-symbol table and for each split partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    rows: Vec<LabeledRow>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(feature_names: Vec<String>, rows: Vec<LabeledRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.features.len() == feature_names.len()));
        Self {
            feature_names,
            rows,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    pub fn rows(&self) -> &[LabeledRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LabeledRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append rows. Every row must match this dataset's feature schema.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = LabeledRow>) {
        let width = self.feature_names.len();
        self.rows.extend(rows.into_iter().inspect(|r| {
            debug_assert_eq!(r.features.len(), width);
        }));
    }

    pub fn retain(&mut self, keep: impl FnMut(&LabeledRow) -> bool) {
        self.rows.retain(keep);
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).min()
    }

    /// Stable sort by (date, symbol). Each symbol's rows keep their relative order.
    pub fn sort_by_date(&mut self) {
        self.rows
            .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.symbol.cmp(&b.symbol)));
    }

    pub fn symbols(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|r| r.symbol.as_str()).collect()
    }

    /// Set a feature column from a per-row function, appending it to the schema
    /// if absent or overwriting the existing column of the same name.
    pub fn set_feature(&mut self, name: &str, mut value: impl FnMut(&LabeledRow) -> f64) {
        match self.feature_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row.features[idx] = value(row);
                }
            }
            None => {
                self.feature_names.push(name.to_string());
                for row in &mut self.rows {
                    let v = value(row);
                    row.features.push(v);
                }
            }
        }
    }
}
