//! Integration tests for the per-symbol table loader.

mod common;

use common::{days, ymd, FeedBuilder};
use quotefeed_core::config::FeedConfig;
use quotefeed_core::data::{
    clean_table, get_table, make_url, FeedError, FeedSource, MemoryFeed, QuoteRequest, Variable,
};
use std::cell::RefCell;

const AAPL_FIXTURE: &str = include_str!("fixtures/aapl_2014_06.csv");

fn request(symbol: &str) -> QuoteRequest {
    QuoteRequest::parse(symbol, "2014-06-01", "2014-06-30", "d").unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn fixture_is_sorted_ascending() {
    let feed = MemoryFeed::new().with("AAPL", AAPL_FIXTURE);
    let table = get_table(&feed, &request("aapl"), &FeedConfig::default()).unwrap();

    assert_eq!(table.symbol(), "AAPL");
    assert_eq!(table.len(), 10);
    assert_eq!(table.rows()[0].date, ymd(2014, 6, 2));
    assert_eq!(table.rows()[9].date, ymd(2014, 6, 13));
    for window in table.rows().windows(2) {
        assert!(window[0].date < window[1].date);
    }
}

#[test]
fn fixture_split_and_dividend_columns() {
    let feed = MemoryFeed::new().with("AAPL", AAPL_FIXTURE);
    let table = get_table(&feed, &request("AAPL"), &FeedConfig::default()).unwrap();

    let multiplier = table.column(Variable::ShareMultiplier);
    assert_eq!(&multiplier[..5], &[1.0; 5]);
    assert_eq!(&multiplier[5..], &[7.0; 5]);

    // The May dividend predates the price range and is dropped.
    let dividend = table.column(Variable::Dividend);
    assert_eq!(dividend.iter().filter(|d| **d != 0.0).count(), 1);
    assert_eq!(table.get(ymd(2014, 6, 11)).unwrap().dividend, 0.47);
}

#[test]
fn fixture_total_value() {
    let feed = MemoryFeed::new().with("AAPL", AAPL_FIXTURE);
    let table = get_table(&feed, &request("AAPL"), &FeedConfig::default()).unwrap();

    let tv = |d| table.get(ymd(2014, 6, d)).unwrap().total_value;
    assert_close(tv(2), 628.65);
    assert_close(tv(6), 645.57);
    assert_close(tv(9), 7.0 * 93.70);
    assert_close(tv(10), 7.0 * 94.25);
    assert_close(tv(11), 7.0 * 93.86 + 7.0 * 0.47);
    assert_close(tv(13), 7.0 * 91.28 + 7.0 * 0.47);
}

#[test]
fn fixture_keeps_raw_prices() {
    let table = clean_table("AAPL", AAPL_FIXTURE, &FeedConfig::default()).unwrap();
    let first = table.rows()[0];
    assert_eq!(first.open, 633.96);
    assert_eq!(first.volume, 13_149_200.0);
    assert_eq!(first.adj_close, 83.60);
}

#[test]
fn no_events_gives_neutral_columns() {
    let mut builder = FeedBuilder::new();
    for (i, date) in days(5).into_iter().enumerate() {
        builder = builder.price(date, 100.0 + i as f64);
    }
    let table = clean_table("SPY", &builder.build(), &FeedConfig::default()).unwrap();

    assert_eq!(table.len(), 5);
    assert!(table.column(Variable::Dividend).iter().all(|d| *d == 0.0));
    assert!(table.column(Variable::ShareMultiplier).iter().all(|m| *m == 1.0));
    assert_eq!(table.column(Variable::TotalValue), table.column(Variable::Close));
}

#[test]
fn single_split_steps_to_two() {
    let d = days(4);
    let body = FeedBuilder::new()
        .price(d[0], 10.0)
        .price(d[1], 10.0)
        .price(d[2], 5.0)
        .price(d[3], 5.0)
        .split(d[2], "2:1")
        .build();
    let table = clean_table("X", &body, &FeedConfig::default()).unwrap();

    assert_eq!(table.column(Variable::ShareMultiplier), vec![1.0, 1.0, 2.0, 2.0]);
    assert_eq!(table.column(Variable::Dividend), vec![0.0; 4]);
    assert_eq!(table.column(Variable::TotalValue), vec![10.0; 4]);
}

#[test]
fn two_splits_compound_to_six() {
    let d = days(5);
    let mut builder = FeedBuilder::new();
    for date in &d {
        builder = builder.price(*date, 1.0);
    }
    let body = builder.split(d[1], "2:1").split(d[3], "3:1").build();
    let table = clean_table("X", &body, &FeedConfig::default()).unwrap();

    assert_eq!(
        table.column(Variable::ShareMultiplier),
        vec![1.0, 2.0, 2.0, 6.0, 6.0]
    );
}

#[test]
fn single_dividend_adds_after_payment() {
    let d = days(4);
    let body = FeedBuilder::new()
        .dividend(d[2], 0.5)
        .price(d[3], 13.0)
        .price(d[0], 10.0)
        .price(d[2], 12.0)
        .price(d[1], 11.0)
        .build();
    let table = clean_table("X", &body, &FeedConfig::default()).unwrap();

    assert_eq!(table.column(Variable::ShareMultiplier), vec![1.0; 4]);
    assert_eq!(
        table.column(Variable::TotalValue),
        vec![10.0, 11.0, 12.5, 13.5]
    );
}

#[test]
fn malformed_split_ratio_is_format_error() {
    let d = days(2);
    let body = FeedBuilder::new()
        .price(d[0], 1.0)
        .price(d[1], 1.0)
        .split(d[1], "abc")
        .build();
    let feed = MemoryFeed::new().with("BAD", body);

    let err = get_table(&feed, &request("BAD"), &FeedConfig::default()).unwrap_err();
    assert!(matches!(err, FeedError::Format(_)), "got {err:?}");
}

#[test]
fn unreachable_symbol_is_fetch_error() {
    let feed = MemoryFeed::new();
    let err = get_table(&feed, &request("NOPE"), &FeedConfig::default()).unwrap_err();
    assert!(matches!(err, FeedError::Fetch(_)));
}

#[test]
fn html_error_page_is_format_error() {
    let feed = MemoryFeed::new().with("SPY", "<html><body>Not Found</body></html>\n");
    let err = get_table(&feed, &request("SPY"), &FeedConfig::default()).unwrap_err();
    assert!(matches!(err, FeedError::Format(_)));
}

#[test]
fn footer_length_is_configurable() {
    let d = days(2);
    let body = format!(
        "Date,Open,High,Low,Close,Volume,Adj Close\n{},1,1,1,1,1,1\n{},2,2,2,2,2,2\nSTATUS, 0\n",
        common::compact(d[0]),
        common::compact(d[1]),
    );
    let config = FeedConfig {
        footer_rows: 1,
        ..FeedConfig::default()
    };
    let table = clean_table("X", &body, &config).unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn table_converts_to_dataframe() {
    let table = clean_table("AAPL", AAPL_FIXTURE, &FeedConfig::default()).unwrap();
    let df = table.to_dataframe().unwrap();
    assert_eq!(df.height(), 10);
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        names,
        [
            "Date",
            "Open",
            "High",
            "Low",
            "Close",
            "Volume",
            "AdjClose",
            "Dividend",
            "ShareMultiplier",
            "TotalValue"
        ]
    );
}

#[test]
fn gap_in_one_row_keeps_the_rest_of_the_table() {
    let body = format!(
        "Date,Open,High,Low,Close,Volume,Adj Close\n\
         20150106,3,,3,3,3,3\n\
         20150105,null,2,2,2,2,2\n\
         20150102,1,1,1,1,1,1\n\
         {}",
        common::FOOTER
    );
    let table = clean_table("GAP", &body, &FeedConfig::default()).unwrap();

    assert_eq!(table.len(), 3);
    assert!(table.rows()[1].open.is_nan());
    assert!(table.rows()[2].high.is_nan());
    assert_eq!(
        table.column(Variable::TotalValue),
        table.column(Variable::Close)
    );
}

/// Serves one fixed document and remembers the URL each fetch would hit.
struct UrlRecordingFeed {
    body: String,
    urls: RefCell<Vec<String>>,
}

impl FeedSource for UrlRecordingFeed {
    fn name(&self) -> &str {
        "recording"
    }

    fn fetch_csv(
        &self,
        request: &QuoteRequest,
        config: &FeedConfig,
    ) -> Result<String, FeedError> {
        self.urls.borrow_mut().push(make_url(request, config));
        Ok(self.body.clone())
    }
}

#[test]
fn one_config_drives_both_url_and_parsing() {
    let d = days(3);
    let source = UrlRecordingFeed {
        body: FeedBuilder::new()
            .price(d[0], 1.0)
            .price(d[1], 2.0)
            .price(d[2], 3.0)
            .build(),
        urls: RefCell::new(Vec::new()),
    };
    let config = FeedConfig {
        base_url: "http://mirror.test/table".into(),
        ..FeedConfig::default()
    };

    let table = get_table(&source, &request("SPY"), &config).unwrap();

    assert_eq!(table.len(), 3);
    let urls = source.urls.into_inner();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("http://mirror.test/table?"));
}
