//! Request parameters and the URL builder.
//!
//! A [`QuoteRequest`] is a validated (symbol, start, stop, frequency) tuple.
//! [`make_url`] turns it into the feed URL without any network I/O.

use super::feed::parse_compact_date;
use super::provider::FeedError;
use crate::config::FeedConfig;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default first date of a request when the caller does not supply one.
pub const DEFAULT_START: (i32, u32, u32) = (2000, 1, 1);

/// Sampling frequency of the quote series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// One-character code used in the feed query.
    pub fn code(self) -> char {
        match self {
            Frequency::Daily => 'd',
            Frequency::Weekly => 'w',
            Frequency::Monthly => 'm',
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Frequency {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "daily" => Ok(Frequency::Daily),
            "w" | "weekly" => Ok(Frequency::Weekly),
            "m" | "monthly" => Ok(Frequency::Monthly),
            other => Err(FeedError::Parse(format!(
                "frequency '{other}' (expected one of d, w, m)"
            ))),
        }
    }
}

/// Validated request for one symbol's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteRequest {
    symbol: String,
    start: NaiveDate,
    stop: NaiveDate,
    frequency: Frequency,
}

impl QuoteRequest {
    /// Build a request. The symbol is trimmed and uppercased.
    ///
    /// Fails with [`FeedError::InvalidRequest`] for an empty symbol or when
    /// `start` is after `stop`.
    pub fn new(
        symbol: &str,
        start: NaiveDate,
        stop: NaiveDate,
        frequency: Frequency,
    ) -> Result<Self, FeedError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(FeedError::InvalidRequest("symbol is empty".into()));
        }
        if start > stop {
            return Err(FeedError::InvalidRequest(format!(
                "start date {start} is after stop date {stop}"
            )));
        }
        Ok(Self {
            symbol,
            start,
            stop,
            frequency,
        })
    }

    /// Build a request from textual dates and frequency code.
    pub fn parse(symbol: &str, start: &str, stop: &str, frequency: &str) -> Result<Self, FeedError> {
        Self::new(symbol, parse_date(start)?, parse_date(stop)?, frequency.parse()?)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn stop(&self) -> NaiveDate {
        self.stop
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Feed URL for this request.
    pub fn url(&self, config: &FeedConfig) -> String {
        make_url(self, config)
    }
}

/// Default start date: 2000-01-01.
pub fn default_start() -> NaiveDate {
    let (y, m, d) = DEFAULT_START;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Default stop date: today, local time.
pub fn default_stop() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Build the feed URL for a request.
///
/// Query parameters are emitted sorted by key so identical requests always
/// produce identical URLs. Months are zero-based, as the feed expects.
pub fn make_url(request: &QuoteRequest, config: &FeedConfig) -> String {
    let mut params: BTreeMap<&str, String> = BTreeMap::new();
    params.insert("s", request.symbol.clone());
    params.insert("a", request.start.month0().to_string());
    params.insert("b", request.start.day().to_string());
    params.insert("c", request.start.year().to_string());
    params.insert("d", request.stop.month0().to_string());
    params.insert("e", request.stop.day().to_string());
    params.insert("f", request.stop.year().to_string());
    params.insert("g", request.frequency.code().to_string());
    params.insert("y", config.event_offset.to_string());
    params.insert("z", config.event_limit.to_string());

    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{query}", config.base_url)
}

/// Date-only formats tried in order. `%m`/`%d` also accept unpadded values.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Normalize a user-supplied date in any common representation.
///
/// Accepts ISO dates (padded or not), slash and dot separators, compact
/// `YYYYMMDD`, US `MM/DD/YYYY`, month names, and timestamps (the time part is
/// dropped).
pub fn parse_date(input: &str) -> Result<NaiveDate, FeedError> {
    let s = input.trim();

    if let Some(date) = parse_compact_date(s) {
        return Ok(date);
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    Err(FeedError::Parse(format!("date '{input}'")))
}
