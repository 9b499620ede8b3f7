//! Labeled dataset persistence: Parquet and CSV.
//!
//! Column layout: `date, code, open, high, low, close, volume, <features…>, target`.
//! Feature columns are every column outside that fixed set, in file order.
//!
//! Writes are atomic: write to .tmp then rename.

use super::provider::DataError;
use crate::domain::{Dataset, LabeledRow};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const BASE_COLUMNS: [&str; 7] = ["date", "code", "open", "high", "low", "close", "volume"];
const TARGET_COLUMN: &str = "target";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Parquet,
    Csv,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for TableFormat {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parquet" => Ok(TableFormat::Parquet),
            "csv" => Ok(TableFormat::Csv),
            other => Err(DataError::Other(format!("unknown table format '{other}'"))),
        }
    }
}

/// Reads and writes labeled tables under one output directory.
#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
    format: TableFormat,
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>, format: TableFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Path of the table named `name` (e.g. `train` → `{dir}/train.parquet`).
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{}", self.format.extension()))
    }

    pub fn write(&self, name: &str, dataset: &Dataset) -> Result<PathBuf, DataError> {
        fs::create_dir_all(&self.dir).map_err(|e| DataError::io(&self.dir, e))?;
        let path = self.path_for(name);
        let tmp_path = path.with_extension(format!("{}.tmp", self.format.extension()));

        match self.format {
            TableFormat::Parquet => write_parquet(dataset, &tmp_path)?,
            TableFormat::Csv => write_csv(dataset, &tmp_path)?,
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::io(&path, format!("atomic rename failed: {e}"))
        })?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> Result<Dataset, DataError> {
        let path = self.path_for(name);
        match self.format {
            TableFormat::Parquet => read_parquet(&path),
            TableFormat::Csv => read_csv(&path),
        }
    }
}

// ── Parquet ─────────────────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Convert a dataset to a Polars DataFrame.
pub fn dataset_to_dataframe(dataset: &Dataset) -> Result<DataFrame, DataError> {
    let rows = dataset.rows();
    let epoch = epoch();
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let codes: Vec<String> = rows.iter().map(|r| r.symbol.clone()).collect();
    let column = |name: &str, f: fn(&LabeledRow) -> f64| -> Column {
        Column::new(name.into(), rows.iter().map(f).collect::<Vec<f64>>())
    };

    let mut columns = vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("code".into(), codes),
        column("open", |r| r.open),
        column("high", |r| r.high),
        column("low", |r| r.low),
        column("close", |r| r.close),
        column("volume", |r| r.volume),
    ];
    for (j, name) in dataset.feature_names().iter().enumerate() {
        let values: Vec<f64> = rows.iter().map(|r| r.features[j]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }
    columns.push(column(TARGET_COLUMN, |r| r.target));

    DataFrame::new(columns).map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(dataset: &Dataset, path: &Path) -> Result<(), DataError> {
    let mut df = dataset_to_dataframe(dataset)?;
    let file = fs::File::create(path).map_err(|e| DataError::io(path, e))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn read_parquet(path: &Path) -> Result<Dataset, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;
    dataframe_to_dataset(&df)
}

/// Convert a DataFrame with the labeled-table layout back to a dataset.
pub fn dataframe_to_dataset(df: &DataFrame) -> Result<Dataset, DataError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.as_str().to_string())
        .collect();
    for required in BASE_COLUMNS.iter().chain([&TARGET_COLUMN]) {
        if !names.iter().any(|n| n == required) {
            return Err(DataError::ValidationError(format!(
                "missing column '{required}'"
            )));
        }
    }
    let feature_names: Vec<String> = names
        .into_iter()
        .filter(|n| !BASE_COLUMNS.contains(&n.as_str()) && n != TARGET_COLUMN)
        .collect();

    let col_err = |name: &str| {
        let name = name.to_string();
        move |e: PolarsError| DataError::ParquetError(format!("{name} column: {e}"))
    };
    let f64_col = |name: &str| -> Result<Float64Chunked, DataError> {
        Ok(df
            .column(name)
            .map_err(col_err(name))?
            .f64()
            .map_err(col_err(name))?
            .clone())
    };

    let date_col = df.column("date").map_err(col_err("date"))?;
    let date_ca = date_col.date().map_err(col_err("date"))?;
    let code_col = df.column("code").map_err(col_err("code"))?;
    let code_ca = code_col.str().map_err(col_err("code"))?;
    let open = f64_col("open")?;
    let high = f64_col("high")?;
    let low = f64_col("low")?;
    let close = f64_col("close")?;
    let volume = f64_col("volume")?;
    let target_ca = f64_col(TARGET_COLUMN)?;
    let features = feature_names
        .iter()
        .map(|n| f64_col(n.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let epoch = epoch();
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ValidationError(format!("null date at row {i}")))?;
        let code = code_ca
            .get(i)
            .ok_or_else(|| DataError::ValidationError(format!("null code at row {i}")))?;
        let target = target_ca
            .get(i)
            .ok_or_else(|| DataError::ValidationError(format!("null target at row {i}")))?;
        rows.push(LabeledRow {
            symbol: code.to_string(),
            date: epoch + chrono::Duration::days(days as i64),
            open: open.get(i).unwrap_or(f64::NAN),
            high: high.get(i).unwrap_or(f64::NAN),
            low: low.get(i).unwrap_or(f64::NAN),
            close: close.get(i).unwrap_or(f64::NAN),
            volume: volume.get(i).unwrap_or(f64::NAN),
            features: features
                .iter()
                .map(|c| c.get(i).unwrap_or(f64::NAN))
                .collect(),
            target,
        });
    }

    Ok(Dataset::from_rows(feature_names, rows))
}

// ── CSV ─────────────────────────────────────────────────────────────

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn write_csv(dataset: &Dataset, path: &Path) -> Result<(), DataError> {
    let csv_err = |e: csv::Error| DataError::Csv(e.to_string());
    let mut writer = csv::Writer::from_path(path).map_err(|e| DataError::io(path, e))?;

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    header.extend(dataset.feature_names().iter().map(String::as_str));
    header.push(TARGET_COLUMN);
    writer.write_record(&header).map_err(csv_err)?;

    for row in dataset.rows() {
        let mut record = vec![
            row.date.to_string(),
            row.symbol.clone(),
            fmt_value(row.open),
            fmt_value(row.high),
            fmt_value(row.low),
            fmt_value(row.close),
            fmt_value(row.volume),
        ];
        record.extend(row.features.iter().map(|&v| fmt_value(v)));
        record.push(fmt_value(row.target));
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| DataError::io(path, e))?;
    Ok(())
}

fn read_csv(path: &Path) -> Result<Dataset, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::io(path, e))?;
    let header: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let n_features = header.len().saturating_sub(BASE_COLUMNS.len() + 1);
    if header.len() < BASE_COLUMNS.len() + 1
        || header[..BASE_COLUMNS.len()] != BASE_COLUMNS
        || header.last().map(String::as_str) != Some(TARGET_COLUMN)
    {
        return Err(DataError::ValidationError(format!(
            "{}: unexpected header {header:?}",
            path.display()
        )));
    }
    let feature_names = header[BASE_COLUMNS.len()..BASE_COLUMNS.len() + n_features].to_vec();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::Csv(e.to_string()))?;
        let bad = |what: &str| {
            DataError::ValidationError(format!("{} row {}: bad {what}", path.display(), line + 1))
        };
        let num = |j: usize| -> Result<f64, DataError> {
            match record.get(j) {
                Some("") => Ok(f64::NAN),
                Some(s) => s.parse().map_err(|_| bad(&header[j])),
                None => Err(bad(&header[j])),
            }
        };
        let date = record
            .get(0)
            .and_then(|s| s.parse::<NaiveDate>().ok())
            .ok_or_else(|| bad("date"))?;
        let code = record.get(1).ok_or_else(|| bad("code"))?.to_string();
        let features = (0..n_features)
            .map(|k| num(BASE_COLUMNS.len() + k))
            .collect::<Result<Vec<_>, _>>()?;

        rows.push(LabeledRow {
            symbol: code,
            date,
            open: num(2)?,
            high: num(3)?,
            low: num(4)?,
            close: num(5)?,
            volume: num(6)?,
            features,
            target: num(header.len() - 1)?,
        });
    }

    Ok(Dataset::from_rows(feature_names, rows))
}
