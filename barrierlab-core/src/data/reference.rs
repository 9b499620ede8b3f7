//! Market-capitalization reference table keyed by symbol code.
//!
//! Loaded once and shared read-only (behind `Arc`) by every filter invocation.
//! Codes are kept as strings so leading zeros survive (`005930`).

use super::provider::DataError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub name: Option<String>,
    pub market_cap: f64,
}

#[derive(Debug, Deserialize)]
struct ReferenceRecord {
    #[serde(alias = "Code", alias = "Symbol", alias = "symbol")]
    code: String,
    #[serde(default, alias = "Name")]
    name: Option<String>,
    #[serde(alias = "MarketCap", alias = "Marcap", alias = "marcap")]
    market_cap: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, entry: ReferenceEntry) {
        self.entries.insert(code.into(), entry);
    }

    /// Read a CSV with a `Code` column and a `MarketCap` column (`Marcap` and
    /// `market_cap` accepted). Rows with an empty or non-finite market cap are
    /// skipped; a repeated code keeps the last row.
    pub fn from_csv(path: &Path) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::io(path, e))?;

        let mut table = Self::new();
        let mut skipped = 0usize;
        for (line, record) in reader.deserialize::<ReferenceRecord>().enumerate() {
            let record = record.map_err(|e| {
                DataError::Csv(format!("{} row {}: {e}", path.display(), line + 1))
            })?;
            let Some(market_cap) = record.market_cap.filter(|cap| cap.is_finite()) else {
                skipped += 1;
                continue;
            };
            table.insert(
                record.code,
                ReferenceEntry {
                    name: record.name.filter(|n| !n.is_empty()),
                    market_cap,
                },
            );
        }

        if skipped > 0 {
            warn!(skipped, path = %path.display(), "reference rows without a usable market cap");
        }
        debug!(codes = table.len(), "loaded reference table");
        Ok(table)
    }

    pub fn get(&self, code: &str) -> Option<&ReferenceEntry> {
        self.entries.get(code)
    }

    pub fn market_cap(&self, code: &str) -> Option<f64> {
        self.get(code).map(|e| e.market_cap)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_codes_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.csv");
        fs::write(
            &path,
            "Code,Name,Marcap\n005930,Samsung,400000000000000\n000660,,90000000000000\n",
        )
        .unwrap();

        let table = ReferenceTable::from_csv(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.market_cap("005930"), Some(4.0e14));
        assert_eq!(table.get("005930").unwrap().name.as_deref(), Some("Samsung"));
        assert_eq!(table.get("000660").unwrap().name, None);
        assert_eq!(table.market_cap("5930"), None);
    }

    #[test]
    fn skips_rows_without_market_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.csv");
        fs::write(&path, "code,market_cap\nA,10\nB,\n").unwrap();

        let table = ReferenceTable::from_csv(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("B").is_none());
    }

    #[test]
    fn skips_non_finite_market_caps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.csv");
        fs::write(&path, "Code,MarketCap\nA,NaN\nB,inf\nC,5e10\n").unwrap();

        let table = ReferenceTable::from_csv(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.market_cap("A"), None);
        assert_eq!(table.market_cap("B"), None);
        assert_eq!(table.market_cap("C"), Some(5e10));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ReferenceTable::from_csv(Path::new("/nonexistent/ref.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
