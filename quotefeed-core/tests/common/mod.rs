//! Shared helpers for building feed documents in tests.

#![allow(dead_code)]

use chrono::NaiveDate;

pub const FOOTER: &str = "STARTDATE, 20000101\nENDDATE, 20301231\nTOTALSIZE, 0\nSTATUS, 0\n";

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn compact(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Builds a feed document row by row, in whatever order rows are added.
#[derive(Default)]
pub struct FeedBuilder {
    rows: Vec<String>,
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn price(mut self, date: NaiveDate, close: f64) -> Self {
        self.rows.push(format!(
            "{},{},{},{},{close},1000,{close}",
            compact(date),
            close,
            close + 1.0,
            close - 1.0,
        ));
        self
    }

    pub fn dividend(mut self, date: NaiveDate, value: f64) -> Self {
        self.rows.push(format!("DIVIDEND, {},{value}", compact(date)));
        self
    }

    pub fn split(mut self, date: NaiveDate, ratio: &str) -> Self {
        self.rows.push(format!("SPLIT, {},{ratio}", compact(date)));
        self
    }

    pub fn build(self) -> String {
        let mut body = String::from("Date,Open,High,Low,Close,Volume,Adj Close\n");
        for row in self.rows {
            body.push_str(&row);
            body.push('\n');
        }
        body.push_str(FOOTER);
        body
    }
}

/// Consecutive calendar days starting 2024-01-01.
pub fn days(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| ymd(2024, 1, 1) + chrono::Duration::days(i as i64))
        .collect()
}
