//! Raw feed document parsing.
//!
//! The feed interleaves two kinds of rows in one CSV document:
//!
//! ```text
//! Date,Open,High,Low,Close,Volume,Adj Close
//! 20150102,111.39,111.44,107.35,109.33,53204600,103.86
//! DIVIDEND, 20150205,0.470000
//! SPLIT, 20140609,7:1
//! STARTDATE, 19800101
//! ...
//! ```
//!
//! A row whose Date field parses as compact `YYYYMMDD` is a price row; any
//! other row is an event row. The trailing footer rows are dropped before
//! classification.

use super::provider::FeedError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Header names the price columns are located by.
const DATE_HEADER: &str = "Date";
const PRICE_HEADERS: [&str; 5] = ["Open", "High", "Low", "Close", "Volume"];
const ADJ_CLOSE_HEADERS: [&str; 2] = ["Adj Close", "AdjClose"];

/// One dated price/volume observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: f64,
}

/// Corporate-action kind carried by an event row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Dividend,
    Split,
    /// Any other marker (e.g. STARTDATE left in by a short footer). Ignored
    /// by the adjustment step.
    Other(String),
}

impl EventKind {
    fn from_field(s: &str) -> Self {
        match s {
            "DIVIDEND" => EventKind::Dividend,
            "SPLIT" => EventKind::Split,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// One corporate-action row. `value` is kept verbatim: a decimal for
/// dividends, an `N:D` ratio for splits.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub kind: EventKind,
    pub date: NaiveDate,
    pub value: String,
}

/// A feed document split into its two row kinds.
///
/// `prices` is sorted ascending with unique dates; `events` is sorted by date
/// (stable, so same-day events keep feed order).
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub prices: Vec<PriceRecord>,
    pub events: Vec<EventRecord>,
}

/// Parse the feed's compact `YYYYMMDD` date. Exactly eight ASCII digits.
pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Parse the date field of an event row.
///
/// The field arrives as a number (possibly rendered as a float, e.g.
/// `20150205.0`); it is truncated to an integer and re-read as `YYYYMMDD`.
pub fn parse_event_date(field: &str) -> Result<NaiveDate, FeedError> {
    let number: f64 = field
        .trim()
        .parse()
        .map_err(|_| FeedError::Format(format!("event date '{field}' is not numeric")))?;
    if !number.is_finite() {
        return Err(FeedError::Format(format!("event date '{field}' is not finite")));
    }
    let digits = (number.trunc() as i64).to_string();
    parse_compact_date(&digits)
        .ok_or_else(|| FeedError::Format(format!("event date '{field}' is not YYYYMMDD")))
}

/// Column positions of the price fields in the header.
struct Layout {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    adj_close: usize,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, FeedError> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| FeedError::Format(format!("missing column '{name}'")))
        };

        let adj_close = ADJ_CLOSE_HEADERS
            .iter()
            .find_map(|name| find(*name))
            .ok_or_else(|| FeedError::Format("missing column 'Adj Close'".into()))?;
        let [open, high, low, close, volume] = PRICE_HEADERS;

        Ok(Self {
            date: require(DATE_HEADER)?,
            open: require(open)?,
            high: require(high)?,
            low: require(low)?,
            close: require(close)?,
            volume: require(volume)?,
            adj_close,
        })
    }
}

fn record_line(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Cell spellings that mean "no value" rather than malformed data.
const MISSING_TOKENS: [&str; 4] = ["null", "NA", "N/A", "NaN"];

/// Parse a numeric cell. Empty and missing-value cells become NaN.
fn number_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, FeedError> {
    let raw = record.get(index).unwrap_or("");
    if raw.is_empty() || MISSING_TOKENS.contains(&raw) {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| {
        FeedError::Format(format!(
            "line {}: {name} value '{raw}' is not a number",
            record_line(record)
        ))
    })
}

fn price_record(
    record: &csv::StringRecord,
    layout: &Layout,
    date: NaiveDate,
) -> Result<PriceRecord, FeedError> {
    Ok(PriceRecord {
        date,
        open: number_field(record, layout.open, "Open")?,
        high: number_field(record, layout.high, "High")?,
        low: number_field(record, layout.low, "Low")?,
        close: number_field(record, layout.close, "Close")?,
        volume: number_field(record, layout.volume, "Volume")?,
        adj_close: number_field(record, layout.adj_close, "AdjClose")?,
    })
}

/// Event rows only carry meaningful data in their first three fields.
fn event_record(record: &csv::StringRecord) -> Result<EventRecord, FeedError> {
    let kind = record.get(0).unwrap_or("");
    let date_field = record.get(1).ok_or_else(|| {
        FeedError::Format(format!(
            "line {}: event row '{kind}' has no date",
            record_line(record)
        ))
    })?;

    Ok(EventRecord {
        kind: EventKind::from_field(kind),
        date: parse_event_date(date_field)?,
        value: record.get(2).unwrap_or("").to_string(),
    })
}

/// Parse a complete feed document.
///
/// The last `footer_rows` records are discarded unconditionally. Price rows
/// are deduplicated by date with the last occurrence winning.
pub fn parse_feed(body: &str, footer_rows: usize) -> Result<RawFeed, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| FeedError::Format(format!("unreadable header: {e}")))?
        .clone();
    let layout = Layout::from_headers(&headers)?;

    let mut records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FeedError::Format(format!("malformed CSV: {e}")))?;
    let kept = records.len().saturating_sub(footer_rows);
    records.truncate(kept);

    let mut prices: BTreeMap<NaiveDate, PriceRecord> = BTreeMap::new();
    let mut events = Vec::new();

    for record in &records {
        match parse_compact_date(record.get(layout.date).unwrap_or("")) {
            Some(date) => {
                prices.insert(date, price_record(record, &layout, date)?);
            }
            None => events.push(event_record(record)?),
        }
    }

    events.sort_by_key(|e: &EventRecord| e.date);

    tracing::debug!(
        records = records.len(),
        prices = prices.len(),
        events = events.len(),
        "parsed feed document"
    );

    Ok(RawFeed {
        prices: prices.into_values().collect(),
        events,
    })
}
