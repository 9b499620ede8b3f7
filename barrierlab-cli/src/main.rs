//! BarrierLab CLI: fetch, build, and label commands.
//!
//! Commands:
//! - `fetch`: download daily bars from Yahoo Finance into a CSV directory
//! - `build`: label every stored series, split by time, filter, and write
//!   the partitions plus `manifest.json`
//! - `label`: label a single CSV series and print a summary

use anyhow::{anyhow, bail, Result};
use barrierlab_core::data::{CsvSeriesStore, TableFormat, TableStore, YahooSource};
use barrierlab_core::{
    BarrierConfig, BarrierLabeler, Dataset, IndicatorConfig, IndicatorEngine, LabeledTable,
};
use barrierlab_runner::{
    fetch_all, split_dataset, BuildConfig, BuildManifest, DatasetBuilder, FilterStats,
    LiquidityFilter, StderrProgress,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "barrierlab",
    about = "BarrierLab CLI: first-touch barrier labeled datasets from daily bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily bars from Yahoo Finance and store one CSV per code.
    Fetch {
        /// Codes to download (e.g., 005930 000660).
        #[arg(required = true)]
        codes: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Output directory for the per-code CSV files.
        #[arg(long, default_value = "data/raw")]
        out: PathBuf,

        /// Concurrent downloads.
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Yahoo ticker suffix appended to each code (e.g., .KS).
        #[arg(long, default_value = "")]
        suffix: String,
    },
    /// Build train/validation/test partitions from a directory of CSV series.
    Build {
        /// Path to a TOML build config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of per-code CSV series.
        #[arg(long, default_value = "data/raw")]
        data: PathBuf,

        /// Output directory for partitions and manifest.json.
        #[arg(long, default_value = "data/dataset")]
        out: PathBuf,

        /// Output format (parquet or csv); overrides the config.
        #[arg(long)]
        format: Option<TableFormat>,

        /// Worker threads. Defaults to the number of CPUs.
        #[arg(long)]
        threads: Option<usize>,

        /// Codes to build. Defaults to every *.csv in the data directory.
        codes: Vec<String>,
    },
    /// Label one CSV series and print a summary.
    Label {
        /// Path to a CSV series (Date,Open,High,Low,Close,Volume[,Code]).
        csv: PathBuf,

        #[arg(long, default_value_t = 1.05)]
        profit: f64,

        #[arg(long, default_value_t = 0.95)]
        loss: f64,

        #[arg(long, default_value_t = 20)]
        horizon: usize,

        /// Also write the labeled table as CSV into this directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            codes,
            start,
            out,
            workers,
            suffix,
        } => run_fetch(codes, start, out, workers, suffix),
        Commands::Build {
            config,
            data,
            out,
            format,
            threads,
            codes,
        } => run_build(config, data, out, format, threads, codes),
        Commands::Label {
            csv,
            profit,
            loss,
            horizon,
            out,
        } => run_label(&csv, profit, loss, horizon, out),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
}

fn run_fetch(
    codes: Vec<String>,
    start: Option<NaiveDate>,
    out: PathBuf,
    workers: usize,
    suffix: String,
) -> Result<()> {
    let start = start
        .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365 * 10));

    let source = YahooSource::new()?.with_suffix(suffix);
    let summary = fetch_all(&source, &codes, start, workers)?;

    let store = CsvSeriesStore::new(&out);
    store.save_all(&summary.fetched)?;
    println!(
        "Fetched {}/{} codes into {}",
        summary.fetched.len(),
        codes.len(),
        out.display()
    );

    if !summary.failed.is_empty() {
        for (code, err) in &summary.failed {
            eprintln!("Error for {code}: {err}");
        }
        if summary.fetched.is_empty() {
            bail!("no code could be fetched");
        }
    }
    Ok(())
}

fn run_build(
    config_path: Option<PathBuf>,
    data_dir: PathBuf,
    out_dir: PathBuf,
    format: Option<TableFormat>,
    threads: Option<usize>,
    codes: Vec<String>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::default(),
    };
    if let Some(format) = format {
        config.output.format = format;
    }
    config.validate()?;
    let config_id = config.config_id()?;
    info!(config_id = %config_id, "build config validated");

    // Load the reference table before any labeling.
    let filter = config
        .filter
        .clone()
        .map(LiquidityFilter::from_config)
        .transpose()?;

    let store = CsvSeriesStore::new(&data_dir);
    let codes = if codes.is_empty() {
        store.codes()?
    } else {
        codes
    };
    if codes.is_empty() {
        bail!("no CSV series found in {}", data_dir.display());
    }

    let mut builder = DatasetBuilder::from_config(&config)?;
    if let Some(n) = threads {
        builder = builder.with_threads(n);
    }
    let output = builder.build_from_source(&store, &codes, NaiveDate::MIN, Some(&StderrProgress))?;
    if output.report.succeeded() == 0 {
        bail!("every symbol failed; nothing to split");
    }

    let report = output.report;
    let mut splits = split_dataset(output.dataset, &config.split)?;

    let mut filter_stats: BTreeMap<&str, FilterStats> = BTreeMap::new();
    if let Some(filter) = &filter {
        let parts = [
            ("train", &mut splits.train),
            ("validation", &mut splits.validation),
            ("test", &mut splits.test),
        ];
        for (name, part) in parts {
            let (kept, stats) = filter.apply_with_stats(std::mem::take(part));
            *part = kept;
            filter_stats.insert(name, stats);
        }
    }

    let store = TableStore::new(&out_dir, config.output.format);
    let mut manifest = BuildManifest::new(config_id, &report, &splits);
    for (name, dataset) in splits.partitions() {
        let path = store.write(name, dataset)?;
        if let Some(entry) = manifest.partition_mut(name) {
            entry.path = Some(path);
            entry.filter = filter_stats.get(name).copied();
        }
    }
    let manifest_path = out_dir.join("manifest.json");
    manifest.write(&manifest_path)?;

    print_build_summary(&manifest, &report.failed());
    println!("Manifest written to: {}", manifest_path.display());
    Ok(())
}

fn run_label(
    csv: &Path,
    profit: f64,
    loss: f64,
    horizon: usize,
    out: Option<PathBuf>,
) -> Result<()> {
    let code = csv
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("cannot derive a code from {}", csv.display()))?;
    let dir = csv.parent().unwrap_or_else(|| Path::new("."));
    let series = CsvSeriesStore::new(dir).load(code)?;

    let engine = IndicatorEngine::new(IndicatorConfig::default())?;
    let labeler = BarrierLabeler::new(BarrierConfig {
        profit_threshold: profit,
        loss_threshold: loss,
        horizon,
    })?;
    let bars = series.len();
    let table = labeler.label(engine.compute(series));
    print_label_summary(&table, bars, engine.lookback());

    if let Some(dir) = out {
        let dataset = Dataset::from_rows(table.feature_names, table.rows);
        let path = TableStore::new(dir, TableFormat::Csv).write(code, &dataset)?;
        println!("Labeled table written to: {}", path.display());
    }
    Ok(())
}

fn print_build_summary(manifest: &BuildManifest, failed: &[(&str, &str)]) {
    println!();
    println!("=== Dataset Build ===");
    println!("Config:         {}", manifest.config_id);
    println!(
        "Symbols:        {} ({} failed)",
        manifest.symbols.len(),
        failed.len()
    );
    println!("Labeled rows:   {}", manifest.rows);
    println!(
        "Cutoffs:        train < {} <= test < {} (max {})",
        manifest.cutoffs.train_test, manifest.cutoffs.test_end, manifest.cutoffs.max_date
    );
    println!("Discarded rows: {}", manifest.discarded);
    println!();
    println!("--- Partitions ---");
    for p in &manifest.partitions {
        let dropped = p
            .filter
            .map(|f| format!(" (filter dropped {})", f.input - f.kept()))
            .unwrap_or_default();
        println!("{:<11} {:>9} rows {:>5} symbols{dropped}", p.name, p.rows, p.symbols);
    }
    for (code, err) in failed {
        println!("WARNING: {code} omitted: {err}");
    }
    println!();
}

fn print_label_summary(table: &LabeledTable, bars: usize, lookback: usize) {
    let stats = &table.stats;
    let n = table.rows.len();
    println!();
    println!("=== Barrier Labels ===");
    println!("Symbol:         {}", table.symbol);
    println!("Bars:           {bars} ({lookback} warmup)");
    println!("Labeled rows:   {n}");
    if let (Some(first), Some(last)) = (table.rows.first(), table.rows.last()) {
        println!("Period:         {} to {}", first.date, last.date);
    }
    println!();
    println!("--- Outcomes ---");
    println!("Profit:         {}", stats.profit);
    println!("Loss:           {}", stats.loss);
    println!("Ambiguous:      {}", stats.ambiguous);
    println!("Auto-close:     {}", stats.auto_close);
    if n > 0 {
        let mean = table.rows.iter().map(|r| r.target).sum::<f64>() / n as f64;
        println!("Mean target:    {mean:.3}%");
    }
    println!();
}
