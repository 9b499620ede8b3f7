//! End-to-end: CSV series directory → parallel build → split → filter →
//! persisted partitions and manifest.

use barrierlab_core::data::{CsvSeriesStore, TableFormat, TableStore};
use barrierlab_core::PriceBar;
use barrierlab_runner::{
    dataset_hash, split_dataset, BuildConfig, BuildManifest, DatasetBuilder, LiquidityFilter,
    SymbolStatus, MARKET_CAP_COLUMN,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

const DAYS: usize = 6 * 365;

fn make_bars(code: &str, phase: f64, volume: f64) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    (0..DAYS)
        .map(|i| {
            let close = 100.0 + ((i as f64) * 0.05 + phase).sin() * 12.0;
            PriceBar {
                symbol: code.into(),
                date: base + chrono::Duration::days(i as i64),
                open: close - 0.4,
                high: close + 1.2,
                low: close - 1.2,
                close,
                volume,
            }
        })
        .collect()
}

fn write_reference(path: &Path) {
    std::fs::write(
        path,
        "Code,Name,MarketCap\nBIG,Big Corp,500000000000\nMID,Mid Corp,200000000000\nSMALL,Small Corp,300000000000\n",
    )
    .unwrap();
}

fn config_toml(reference: &Path) -> String {
    format!(
        r#"
        [indicators]
        ma_periods = [5, 20]

        [barrier]
        horizon = 10

        [filter]
        min_trading_volume = 1e7
        min_market_cap = 1e11
        reference_path = "{}"
        "#,
        reference.display()
    )
}

struct Fixture {
    _dir: TempDir,
    store: CsvSeriesStore,
    out: std::path::PathBuf,
    config: BuildConfig,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = CsvSeriesStore::new(dir.path().join("raw"));

    let mut series = BTreeMap::new();
    series.insert("BIG".to_string(), make_bars("BIG", 0.0, 1_000_000.0));
    series.insert("MID".to_string(), make_bars("MID", 1.0, 500_000.0));
    series.insert("SMALL".to_string(), make_bars("SMALL", 2.0, 10.0));
    series.insert("ORPHAN".to_string(), make_bars("ORPHAN", 3.0, 1_000_000.0));
    let mut broken = make_bars("BROKEN", 0.5, 1_000_000.0);
    broken.swap(10, 11);
    series.insert("BROKEN".to_string(), broken);
    store.save_all(&series).unwrap();

    let reference = dir.path().join("market_cap.csv");
    write_reference(&reference);
    let config = BuildConfig::from_toml(&config_toml(&reference)).unwrap();
    config.validate().unwrap();

    Fixture {
        out: dir.path().join("dataset"),
        store,
        config,
        _dir: dir,
    }
}

#[test]
fn full_build_writes_consistent_partitions_and_manifest() {
    let fx = fixture();
    let codes = fx.store.codes().unwrap();
    assert_eq!(codes.len(), 5);

    let output = DatasetBuilder::from_config(&fx.config)
        .unwrap()
        .with_threads(3)
        .build_from_source(&fx.store, &codes, NaiveDate::MIN, None)
        .unwrap();

    // One malformed symbol omitted, the rest labeled in full.
    let horizon = fx.config.barrier.horizon;
    assert_eq!(output.report.succeeded(), 4);
    assert_eq!(output.dataset.len(), 4 * (DAYS - horizon));
    let broken = output
        .report
        .symbols
        .iter()
        .find(|s| s.code == "BROKEN")
        .unwrap();
    assert!(matches!(broken.status, SymbolStatus::Failed { .. }));

    let total = output.dataset.len();
    let report = output.report;
    let mut splits = split_dataset(output.dataset, &fx.config.split).unwrap();
    assert_eq!(
        splits.train.len() + splits.validation.len() + splits.test.len() + splits.discarded,
        total
    );

    let filter = LiquidityFilter::from_config(fx.config.filter.clone().unwrap()).unwrap();
    for part in [&mut splits.train, &mut splits.validation, &mut splits.test] {
        *part = filter.apply(std::mem::take(part));
    }
    for (name, part) in splits.partitions() {
        assert!(!part.is_empty(), "{name} is empty");
        let symbols: Vec<&str> = part.symbols().into_iter().collect();
        assert_eq!(symbols, vec!["BIG", "MID"], "{name}");
        let cap = part.feature_index(MARKET_CAP_COLUMN).unwrap();
        assert!(part.rows().iter().all(|r| r.features[cap] >= 1e11));
    }

    let store = TableStore::new(&fx.out, TableFormat::Parquet);
    let config_id = fx.config.config_id().unwrap();
    let mut manifest = BuildManifest::new(config_id.clone(), &report, &splits);
    for (name, part) in splits.partitions() {
        let path = store.write(name, part).unwrap();
        manifest.partition_mut(name).unwrap().path = Some(path);
    }
    let manifest_path = fx.out.join("manifest.json");
    manifest.write(&manifest_path).unwrap();

    let manifest = BuildManifest::read(&manifest_path).unwrap();
    assert_eq!(manifest.config_id, config_id);
    assert_eq!(manifest.symbols.len(), 5);
    for entry in &manifest.partitions {
        let back = store.read(&entry.name).unwrap();
        assert_eq!(back.len(), entry.rows);
        assert_eq!(dataset_hash(&back), entry.hash, "{}", entry.name);
    }
}

#[test]
fn rebuild_is_deterministic() {
    let fx = fixture();
    let codes = fx.store.codes().unwrap();
    let run = |threads: usize| {
        let output = DatasetBuilder::from_config(&fx.config)
            .unwrap()
            .with_threads(threads)
            .build_from_source(&fx.store, &codes, NaiveDate::MIN, None)
            .unwrap();
        split_dataset(output.dataset, &fx.config.split).unwrap()
    };

    let a = run(1);
    let b = run(4);
    for ((name, x), (_, y)) in a.partitions().into_iter().zip(b.partitions()) {
        assert_eq!(dataset_hash(x), dataset_hash(y), "{name}");
    }
}
