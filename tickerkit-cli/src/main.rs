//! Tickerkit CLI: fetch, analyze and resample commands.
//!
//! Commands:
//! - `fetch`: retrieve tables for one or more symbols and write them as CSV
//! - `analyze`: derive close, returns, moving averages and volatility for a symbol
//! - `resample`: bucket a CSV or Parquet table by calendar frequency
//!
//! A TOML config (`--config`) supplies defaults; command-line flags win.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tickerkit_core::chart::{price_chart, returns_chart, ChartRenderer, JsonChartWriter};
use tickerkit_core::config::ToolkitConfig;
use tickerkit_core::data::{
    fetch_multiple, fetch_single, read_csv_table, read_parquet_table, CsvDirectoryProvider,
    PriceProvider, YahooProvider,
};
use tickerkit_core::domain::{PriceSeries, Window};
use tickerkit_core::indicators::{compute_returns, moving_average, rolling_volatility, ReturnMethod};
use tickerkit_core::preprocess::{extract_close_series, resample, Aggregation, Frequency};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tickerkit", about = "Tickerkit CLI: price retrieval and series analysis")]
struct Cli {
    /// TOML config file supplying defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch price tables and write one CSV per symbol.
    Fetch {
        /// Symbols to fetch (e.g., SPY QQQ AAPL). Defaults to the config's symbols.
        symbols: Vec<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Directory for `{SYMBOL}.csv` output. Without it, prints a summary.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Derive close, returns, moving averages and volatility for one symbol.
    Analyze {
        /// Symbol to analyze. Defaults to the config's first symbol.
        symbol: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Return method: simple or log.
        #[arg(long)]
        method: Option<String>,

        /// Moving-average window (repeatable).
        #[arg(long = "ma")]
        ma_windows: Vec<String>,

        /// Rolling volatility window over the returns.
        #[arg(long)]
        vol_window: Option<String>,

        /// Use the raw close even when an adjusted close exists.
        #[arg(long, default_value_t = false)]
        no_adjusted: bool,

        /// CSV output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write price and returns chart payloads as JSON to this file.
        #[arg(long)]
        chart_out: Option<PathBuf>,

        /// Chart title. Defaults to the symbol.
        #[arg(long)]
        title: Option<String>,
    },
    /// Resample a CSV or Parquet table by calendar frequency.
    Resample {
        /// Input file (.csv or .parquet).
        input: PathBuf,

        /// Frequency code: D, W, W-MON..W-SUN, M, MS, Q, Y.
        #[arg(long)]
        freq: Option<String>,

        /// Aggregation: last, first or mean.
        #[arg(long)]
        how: Option<String>,

        /// Name of the timestamp column.
        #[arg(long, default_value = "Date")]
        index_column: String,

        /// CSV output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Date range, interval and data source shared by `fetch` and `analyze`.
#[derive(clap::Args)]
struct RangeArgs {
    /// Start date (YYYY-MM-DD). Defaults to the config, then one year ago.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD), exclusive. Defaults to the config, then today.
    #[arg(long)]
    end: Option<String>,

    /// Provider interval (e.g., 1d, 1wk, 1mo).
    #[arg(long)]
    interval: Option<String>,

    /// Read `{SYMBOL}.csv` files from this directory instead of Yahoo Finance.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

/// Range with config fallbacks applied. Dates stay as text; the core validates them.
struct ResolvedRange {
    start: String,
    end: String,
    interval: String,
}

impl RangeArgs {
    fn resolve(&self, config: &ToolkitConfig) -> ResolvedRange {
        let today = chrono::Local::now().date_naive();
        let start = self
            .start
            .clone()
            .or_else(|| config.fetch.start.clone())
            .unwrap_or_else(|| (today - chrono::Duration::days(365)).to_string());
        let end = self
            .end
            .clone()
            .or_else(|| config.fetch.end.clone())
            .unwrap_or_else(|| today.to_string());
        let interval = self
            .interval
            .clone()
            .unwrap_or_else(|| config.fetch.interval.clone());
        ResolvedRange { start, end, interval }
    }

    fn provider(&self, config: &ToolkitConfig) -> Result<Box<dyn PriceProvider>> {
        match &self.data_dir {
            Some(dir) => Ok(Box::new(CsvDirectoryProvider::new(dir))),
            None => Ok(Box::new(YahooProvider::new(&config.provider)?)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ToolkitConfig::from_file(path)?,
        None => ToolkitConfig::default(),
    };

    match cli.command {
        Commands::Fetch {
            symbols,
            range,
            out_dir,
        } => run_fetch(&config, symbols, &range, out_dir.as_deref()),
        Commands::Analyze {
            symbol,
            range,
            method,
            ma_windows,
            vol_window,
            no_adjusted,
            out,
            chart_out,
            title,
        } => {
            let options = AnalyzeOptions::resolve(
                &config,
                method.as_deref(),
                &ma_windows,
                vol_window.as_deref(),
                no_adjusted,
            )?;
            run_analyze(
                &config,
                symbol,
                &range,
                &options,
                out.as_deref(),
                chart_out.as_deref(),
                title,
            )
        }
        Commands::Resample {
            input,
            freq,
            how,
            index_column,
            out,
        } => run_resample(&config, &input, freq.as_deref(), how.as_deref(), &index_column, out.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open `path` for writing, or stdout when absent.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdout().lock())),
    }
}

fn run_fetch(config: &ToolkitConfig, symbols: Vec<String>, range: &RangeArgs, out_dir: Option<&Path>) -> Result<()> {
    let resolved = range.resolve(config);
    let provider = range.provider(config)?;

    let tables = if symbols.is_empty() {
        fetch_multiple(provider.as_ref(), &config.fetch.symbols, &resolved.start, &resolved.end, &resolved.interval)?
    } else {
        fetch_multiple(provider.as_ref(), symbols, &resolved.start, &resolved.end, &resolved.interval)?
    };

    match out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
            for (symbol, table) in &tables {
                let path = dir.join(format!("{symbol}.csv"));
                output::write_table(File::create(&path)?, table)?;
                tracing::info!(symbol = symbol.as_str(), path = %path.display(), "wrote table");
            }
        }
        None => {
            println!("{:<8} {:>6}  {:<20} {:<20}", "Symbol", "Rows", "First", "Last");
            println!("{}", "-".repeat(58));
            for (symbol, table) in &tables {
                let index = table.index();
                println!(
                    "{:<8} {:>6}  {:<20} {:<20}",
                    symbol,
                    table.height(),
                    output::format_timestamp(&index[0]),
                    output::format_timestamp(&index[index.len() - 1]),
                );
            }
        }
    }
    Ok(())
}

/// Analysis settings after merging flags over the config.
#[derive(Debug)]
struct AnalyzeOptions {
    method: ReturnMethod,
    ma_windows: Vec<Window>,
    vol_window: Option<Window>,
    prefer_adjusted: bool,
}

impl AnalyzeOptions {
    fn resolve(
        config: &ToolkitConfig,
        method: Option<&str>,
        ma_windows: &[String],
        vol_window: Option<&str>,
        no_adjusted: bool,
    ) -> Result<Self> {
        let analysis = &config.analysis;
        let method = match method {
            Some(m) => m.parse::<ReturnMethod>()?,
            None => analysis.return_method,
        };
        let ma_windows = if ma_windows.is_empty() {
            analysis.ma_windows.clone()
        } else {
            ma_windows
                .iter()
                .map(|w| w.parse::<Window>())
                .collect::<Result<_, _>>()?
        };
        let vol_window = match vol_window {
            Some(w) => Some(w.parse::<Window>()?),
            None => analysis.volatility_window,
        };
        Ok(Self {
            method,
            ma_windows,
            vol_window,
            prefer_adjusted: analysis.prefer_adjusted && !no_adjusted,
        })
    }
}

fn run_analyze(
    config: &ToolkitConfig,
    symbol: Option<String>,
    range: &RangeArgs,
    options: &AnalyzeOptions,
    out: Option<&Path>,
    chart_out: Option<&Path>,
    title: Option<String>,
) -> Result<()> {
    let symbol = match symbol {
        Some(s) => s,
        None => config
            .fetch
            .symbol_set()
            .context("no symbol given and none configured")?
            .first()
            .to_string(),
    };
    let resolved = range.resolve(config);
    let provider = range.provider(config)?;

    let table = fetch_single(provider.as_ref(), &symbol, &resolved.start, &resolved.end, &resolved.interval)?;
    let close = extract_close_series(&table, options.prefer_adjusted)?;
    let returns = compute_returns(&close, options.method)?;

    let mut columns: Vec<(String, PriceSeries)> = vec![
        ("Close".into(), close.clone()),
        ("Return".into(), returns.clone()),
    ];
    for &window in &options.ma_windows {
        columns.push((format!("MA {window}"), moving_average(&close, window)?));
    }
    if let Some(window) = options.vol_window {
        columns.push((format!("Volatility {window}"), rolling_volatility(&returns, window)?));
    }
    output::write_aligned(open_output(out)?, &columns)?;

    if let Some(path) = chart_out {
        let title = title.unwrap_or_else(|| symbol.trim().to_uppercase());
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut writer = JsonChartWriter::new(file);
        writer.render(&price_chart(&close, &options.ma_windows, Some(&title))?)?;
        writer.render(&returns_chart(&returns, Some(&title))?)?;
        tracing::info!(path = %path.display(), "wrote charts");
    }
    Ok(())
}

fn run_resample(
    config: &ToolkitConfig,
    input: &Path,
    freq: Option<&str>,
    how: Option<&str>,
    index_column: &str,
    out: Option<&Path>,
) -> Result<()> {
    let frequency = match freq {
        Some(code) => code.parse::<Frequency>()?,
        None => config.resample.frequency,
    };
    let aggregation = match how {
        Some(name) => Aggregation::parse_loose(name)?,
        None => config.resample.aggregation,
    };

    let table = match input.extension().and_then(|e| e.to_str()) {
        Some("parquet") => read_parquet_table(input, index_column)?,
        _ => read_csv_table(input, index_column)?,
    };
    let resampled = resample(&table, frequency, aggregation)?;
    output::write_table(open_output(out)?, &resampled)
}
