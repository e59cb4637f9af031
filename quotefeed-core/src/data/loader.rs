//! Table loading: one symbol at a time, then the multi-symbol batch.
//!
//! `get_table` is the per-symbol pipeline: fetch → parse feed → rebuild
//! dividend and split columns → total value. `load` runs it over a symbol
//! list in order and pivots the results into per-variable tables.

use super::adjust::{dividend_column, share_multiplier_column, total_value_column};
use super::feed::parse_feed;
use super::pivot::{pivot_tables, Panel};
use super::provider::{FeedError, FeedSource, LoadError, LoadProgress};
use super::request::{default_start, default_stop, Frequency, QuoteRequest};
use super::table::{DailyRecord, PriceTable};
use crate::config::FeedConfig;
use chrono::NaiveDate;

/// Fetch and clean one symbol's history.
pub fn get_table(
    source: &dyn FeedSource,
    request: &QuoteRequest,
    config: &FeedConfig,
) -> Result<PriceTable, FeedError> {
    tracing::debug!(symbol = request.symbol(), source = source.name(), "fetching");
    let body = source.fetch_csv(request, config)?;
    clean_table(request.symbol(), &body, config)
}

/// Turn a raw feed document into a cleaned table. No I/O.
pub fn clean_table(symbol: &str, body: &str, config: &FeedConfig) -> Result<PriceTable, FeedError> {
    let feed = parse_feed(body, config.footer_rows)?;

    let dates: Vec<NaiveDate> = feed.prices.iter().map(|p| p.date).collect();
    let close: Vec<f64> = feed.prices.iter().map(|p| p.close).collect();
    let dividend = dividend_column(&dates, &feed.events)?;
    let multiplier = share_multiplier_column(&dates, &feed.events)?;
    let total_value = total_value_column(&close, &multiplier, &dividend);

    let rows = feed
        .prices
        .iter()
        .enumerate()
        .map(|(i, p)| DailyRecord {
            date: p.date,
            open: p.open,
            high: p.high,
            low: p.low,
            close: p.close,
            volume: p.volume,
            adj_close: p.adj_close,
            dividend: dividend[i],
            share_multiplier: multiplier[i],
            total_value: total_value[i],
        })
        .collect();

    Ok(PriceTable::new(symbol, rows))
}

/// What to do when one symbol of a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Keep going; failures are reported in [`LoadSummary::errors`].
    Isolate,
}

/// Options shared by every symbol of a batch.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub stop: NaiveDate,
    pub frequency: Frequency,
    pub config: FeedConfig,
    pub policy: FailurePolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            start: default_start(),
            stop: default_stop(),
            frequency: Frequency::Daily,
            config: FeedConfig::default(),
            policy: FailurePolicy::Abort,
        }
    }
}

/// Result of a batch load.
#[derive(Debug)]
pub struct LoadSummary {
    /// Per-variable tables over every successfully loaded symbol.
    pub panel: Panel,
    /// Failed symbols; always empty under [`FailurePolicy::Abort`].
    pub errors: Vec<LoadError>,
}

impl LoadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

fn load_one(
    source: &dyn FeedSource,
    symbol: &str,
    opts: &LoadOptions,
) -> Result<PriceTable, FeedError> {
    let request = QuoteRequest::new(symbol, opts.start, opts.stop, opts.frequency)?;
    get_table(source, &request, &opts.config)
}

/// Load several symbols in list order and pivot them into per-variable tables.
///
/// Under [`FailurePolicy::Abort`] the first failure ends the batch and is
/// returned; under [`FailurePolicy::Isolate`] every symbol is attempted.
pub fn load<S: AsRef<str>>(
    source: &dyn FeedSource,
    symbols: &[S],
    opts: &LoadOptions,
    progress: Option<&dyn LoadProgress>,
) -> Result<LoadSummary, LoadError> {
    let total = symbols.len();
    let mut tables = Vec::with_capacity(total);
    let mut errors = Vec::new();

    if let Some(p) = progress {
        p.on_batch_start(total);
    }

    for (i, symbol) in symbols.iter().enumerate() {
        let symbol = symbol.as_ref();
        if let Some(p) = progress {
            p.on_start(symbol, i, total);
        }

        match load_one(source, symbol, opts) {
            Ok(table) => {
                tracing::info!(symbol = table.symbol(), rows = table.len(), "loaded");
                if let Some(p) = progress {
                    p.on_complete(symbol, Ok(()));
                }
                tables.push(table);
            }
            Err(err) => {
                if let Some(p) = progress {
                    p.on_complete(symbol, Err(&err));
                }
                match opts.policy {
                    FailurePolicy::Abort => return Err(LoadError::new(symbol, err)),
                    FailurePolicy::Isolate => {
                        tracing::warn!(symbol, error = %err, "symbol failed, continuing");
                        errors.push(LoadError::new(symbol, err));
                    }
                }
            }
        }
    }

    if let Some(p) = progress {
        p.on_batch_complete(tables.len(), errors.len(), total);
    }

    Ok(LoadSummary {
        panel: pivot_tables(tables),
        errors,
    })
}
