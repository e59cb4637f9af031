//! quotefeed CLI: request URLs, cleaned tables and multi-symbol panels.
//!
//! Commands:
//! - `url`: print the feed URL for a symbol and date range
//! - `table`: fetch one symbol and print its cleaned table as CSV
//! - `load`: fetch several symbols and print one CSV block per variable
//!
//! Data goes to stdout; progress and logs go to stderr (`RUST_LOG` controls
//! log verbosity). With `load --output FILE` the CSV goes to the file and
//! progress moves to stdout.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use quotefeed_core::config::FeedConfig;
use quotefeed_core::data::{
    get_table, load, make_url, parse_date, FailurePolicy, FeedSource, FileFeed, Frequency,
    LoadError, LoadOptions, LoadProgress, PanelTable, PriceTable, QuoteRequest, StderrProgress,
    StdoutProgress, Variable, YahooFeed,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "quotefeed",
    about = "Historical quotes with split and dividend adjustment"
)]
struct Cli {
    /// TOML file overriding feed settings (endpoint, footer rows, timeout).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Date range and sampling shared by every command.
#[derive(Args)]
struct RangeArgs {
    /// Start date (most common formats). Defaults to 2000-01-01.
    #[arg(long)]
    start: Option<String>,

    /// Stop date (most common formats). Defaults to today.
    #[arg(long)]
    stop: Option<String>,

    /// Sampling frequency: d, w or m.
    #[arg(long, default_value = "d")]
    freq: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the request URL without fetching anything.
    Url {
        symbol: String,

        #[command(flatten)]
        range: RangeArgs,
    },
    /// Fetch one symbol and print its cleaned table as CSV.
    Table {
        symbol: String,

        #[command(flatten)]
        range: RangeArgs,

        /// Read saved feed documents from DIR/{SYMBOL}.csv instead of the network.
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },
    /// Fetch several symbols and print one CSV block per variable.
    Load {
        /// Symbols to load (e.g., SPY AAPL ^GSPC).
        #[arg(required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Variables to print (e.g., Close TotalValue). Defaults to all.
        #[arg(long = "variable")]
        variables: Vec<String>,

        /// Keep loading after a symbol fails instead of aborting.
        #[arg(long, default_value_t = false)]
        isolate: bool,

        /// Suppress per-symbol progress lines.
        #[arg(long, default_value_t = false)]
        quiet: bool,

        /// Read saved feed documents from DIR/{SYMBOL}.csv instead of the network.
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Write the CSV blocks to FILE; progress is then printed to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "feed config");

    match cli.command {
        Commands::Url { symbol, range } => run_url(&symbol, &range, &config),
        Commands::Table {
            symbol,
            range,
            source_dir,
        } => run_table(&symbol, &range, source_dir, config),
        Commands::Load {
            symbols,
            range,
            variables,
            isolate,
            quiet,
            source_dir,
            output,
        } => run_load(
            &symbols, &range, &variables, isolate, quiet, source_dir, output, config,
        ),
    }
}

fn load_config(path: Option<&Path>) -> Result<FeedConfig> {
    match path {
        Some(path) => FeedConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(FeedConfig::default()),
    }
}

fn resolve_range(range: &RangeArgs) -> Result<(NaiveDate, NaiveDate, Frequency)> {
    let start = range
        .start
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(quotefeed_core::data::request::default_start);
    let stop = range
        .stop
        .as_deref()
        .map(parse_date)
        .transpose()?
        .unwrap_or_else(quotefeed_core::data::request::default_stop);
    let freq = range.freq.parse()?;
    Ok((start, stop, freq))
}

fn make_source(source_dir: Option<PathBuf>, config: &FeedConfig) -> Result<Box<dyn FeedSource>> {
    let source: Box<dyn FeedSource> = match source_dir {
        Some(dir) => Box::new(FileFeed::new(dir)),
        None => Box::new(YahooFeed::new(config)?),
    };
    Ok(source)
}

fn run_url(symbol: &str, range: &RangeArgs, config: &FeedConfig) -> Result<()> {
    let (start, stop, freq) = resolve_range(range)?;
    let request = QuoteRequest::new(symbol, start, stop, freq)?;
    println!("{}", make_url(&request, config));
    Ok(())
}

fn run_table(
    symbol: &str,
    range: &RangeArgs,
    source_dir: Option<PathBuf>,
    config: FeedConfig,
) -> Result<()> {
    let (start, stop, freq) = resolve_range(range)?;
    let request = QuoteRequest::new(symbol, start, stop, freq)?;
    let source = make_source(source_dir, &config)?;

    let table = get_table(source.as_ref(), &request, &config)
        .with_context(|| format!("loading {}", request.symbol()))?;

    write_table(io::stdout().lock(), &table)
}

#[allow(clippy::too_many_arguments)]
fn run_load(
    symbols: &[String],
    range: &RangeArgs,
    variables: &[String],
    isolate: bool,
    quiet: bool,
    source_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    config: FeedConfig,
) -> Result<()> {
    let (start, stop, frequency) = resolve_range(range)?;
    let wanted: Vec<Variable> = if variables.is_empty() {
        Variable::ALL.to_vec()
    } else {
        variables
            .iter()
            .map(|v| v.parse())
            .collect::<Result<_, _>>()?
    };

    let source = make_source(source_dir, &config)?;
    let opts = LoadOptions {
        start,
        stop,
        frequency,
        config,
        policy: if isolate {
            FailurePolicy::Isolate
        } else {
            FailurePolicy::Abort
        },
    };
    let progress = progress_reporter(quiet, output.is_some());
    let summary = load(source.as_ref(), symbols, &opts, progress)?;

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    for variable in wanted {
        if let Some(table) = summary.panel.get(variable) {
            writeln!(out, "# {variable}")?;
            write_panel(&mut out, table)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    drop(out);

    report_failures(&summary.errors, symbols.len())
}

/// Progress goes wherever the data does not.
fn progress_reporter(quiet: bool, data_to_file: bool) -> Option<&'static dyn LoadProgress> {
    match (quiet, data_to_file) {
        (true, _) => None,
        (false, true) => Some(&StdoutProgress),
        (false, false) => Some(&StderrProgress),
    }
}

fn report_failures(errors: &[LoadError], total: usize) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    for err in errors {
        eprintln!("Error: {err}");
    }
    bail!("{} of {total} symbol(s) failed to load", errors.len());
}

fn write_table<W: Write>(out: W, table: &PriceTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Date".to_string()];
    header.extend(Variable::ALL.iter().map(|v| v.to_string()));
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.date.to_string()];
        record.extend(Variable::ALL.iter().map(|v| row.value(*v).to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_panel<W: Write>(out: W, table: &PanelTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Date".to_string()];
    header.extend(table.symbols().iter().cloned());
    writer.write_record(&header)?;

    for date in table.dates() {
        let mut record = vec![date.to_string()];
        let values = table.row(*date).unwrap_or_default();
        record.extend(
            values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
