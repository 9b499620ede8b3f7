//! Directory of per-symbol CSV files.
//!
//! Layout: `{dir}/{code}.csv`, one file per symbol, header
//! `Date,Open,High,Low,Close,Volume,Code`. Lower-case and upper-case header
//! spellings are accepted on read; the `Code` column is optional and defaults to
//! the file stem.
//!
//! Writes are atomic: write to .tmp then rename.

use super::provider::{DataError, SeriesSource};
use crate::domain::{PriceBar, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CsvBarRecord {
    #[serde(alias = "Date", alias = "DATE")]
    date: NaiveDate,
    #[serde(alias = "Open", alias = "OPEN")]
    open: f64,
    #[serde(alias = "High", alias = "HIGH")]
    high: f64,
    #[serde(alias = "Low", alias = "LOW")]
    low: f64,
    #[serde(alias = "Close", alias = "CLOSE")]
    close: f64,
    #[serde(alias = "Volume", alias = "VOLUME")]
    volume: f64,
    #[serde(default, alias = "Code", alias = "CODE", alias = "symbol")]
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct CsvBarRow<'a> {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
    #[serde(rename = "Code")]
    code: &'a str,
}

/// Per-symbol CSV files under one directory.
#[derive(Debug, Clone)]
pub struct CsvSeriesStore {
    dir: PathBuf,
}

impl CsvSeriesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.csv"))
    }

    /// Codes with a stored file, sorted.
    pub fn codes(&self) -> Result<Vec<String>, DataError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| DataError::io(&self.dir, e))?;

        let mut codes = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| DataError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                codes.push(stem.to_string());
            }
        }
        codes.sort();
        Ok(codes)
    }

    /// Load and validate the stored series for `code`.
    ///
    /// Rows are taken in file order; an out-of-order file is reported as a
    /// malformed series rather than silently re-sorted.
    pub fn load(&self, code: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(code);
        if !path.exists() {
            return Err(DataError::NoStoredData {
                symbol: code.to_string(),
            });
        }
        let bars = read_bars(&path, code)?;
        debug!(code, rows = bars.len(), path = %path.display(), "loaded series");
        Ok(PriceSeries::new(code, bars)?)
    }

    /// Write one symbol's bars, replacing any existing file.
    pub fn save(&self, code: &str, bars: &[PriceBar]) -> Result<(), DataError> {
        fs::create_dir_all(&self.dir).map_err(|e| DataError::io(&self.dir, e))?;

        let path = self.path_for(code);
        let tmp_path = path.with_extension("csv.tmp");
        write_bars(&tmp_path, code, bars)?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::io(&path, format!("atomic rename failed: {e}"))
        })?;
        Ok(())
    }

    /// Write every symbol in `tables`, one file each.
    pub fn save_all(&self, tables: &BTreeMap<String, Vec<PriceBar>>) -> Result<(), DataError> {
        for (code, bars) in tables {
            self.save(code, bars)?;
        }
        Ok(())
    }
}

impl SeriesSource for CsvSeriesStore {
    fn name(&self) -> &str {
        "csv_directory"
    }

    fn fetch(&self, code: &str, start: NaiveDate) -> Result<Vec<PriceBar>, DataError> {
        let mut bars = self.load(code)?.into_bars();
        bars.retain(|b| b.date >= start);
        Ok(bars)
    }
}

fn read_bars(path: &Path, code: &str) -> Result<Vec<PriceBar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DataError::io(path, e))?;

    let mut bars = Vec::new();
    for (line, record) in reader.deserialize::<CsvBarRecord>().enumerate() {
        let record = record.map_err(|e| {
            DataError::Csv(format!("{} row {}: {e}", path.display(), line + 1))
        })?;
        bars.push(PriceBar {
            symbol: record.code.unwrap_or_else(|| code.to_string()),
            date: record.date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(bars)
}

fn write_bars(path: &Path, code: &str, bars: &[PriceBar]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| DataError::io(path, e))?;
    for bar in bars {
        writer
            .serialize(CsvBarRow {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                code,
            })
            .map_err(|e| DataError::Csv(e.to_string()))?;
    }
    writer.flush().map_err(|e| DataError::io(path, e))?;
    Ok(())
}
