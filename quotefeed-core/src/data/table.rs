//! Cleaned per-symbol price table.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::provider::FeedError;

/// Days from 0001-01-01 (CE) to the Unix epoch; polars dates count from the epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A column of the cleaned table, and a key of the multi-symbol panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    Open,
    High,
    Low,
    Close,
    Volume,
    AdjClose,
    Dividend,
    ShareMultiplier,
    TotalValue,
}

impl Variable {
    /// All columns in table order.
    pub const ALL: [Variable; 9] = [
        Variable::Open,
        Variable::High,
        Variable::Low,
        Variable::Close,
        Variable::Volume,
        Variable::AdjClose,
        Variable::Dividend,
        Variable::ShareMultiplier,
        Variable::TotalValue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variable::Open => "Open",
            Variable::High => "High",
            Variable::Low => "Low",
            Variable::Close => "Close",
            Variable::Volume => "Volume",
            Variable::AdjClose => "AdjClose",
            Variable::Dividend => "Dividend",
            Variable::ShareMultiplier => "ShareMultiplier",
            Variable::TotalValue => "TotalValue",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Variable::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FeedError::Parse(format!("variable '{wanted}'")))
    }
}

/// One row of the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adj_close: f64,
    pub dividend: f64,
    pub share_multiplier: f64,
    pub total_value: f64,
}

impl DailyRecord {
    pub fn value(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Open => self.open,
            Variable::High => self.high,
            Variable::Low => self.low,
            Variable::Close => self.close,
            Variable::Volume => self.volume,
            Variable::AdjClose => self.adj_close,
            Variable::Dividend => self.dividend,
            Variable::ShareMultiplier => self.share_multiplier,
            Variable::TotalValue => self.total_value,
        }
    }
}

/// Cleaned history for one symbol: trading dates only, strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    symbol: String,
    rows: Vec<DailyRecord>,
}

impl PriceTable {
    /// Wrap rows that are already sorted ascending with unique dates.
    pub(crate) fn new(symbol: impl Into<String>, rows: Vec<DailyRecord>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            symbol: symbol.into(),
            rows,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[DailyRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Values of one column in date order.
    pub fn column(&self, variable: Variable) -> Vec<f64> {
        self.rows.iter().map(|r| r.value(variable)).collect()
    }

    /// Row for a date, if the exchange traded that day.
    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Convert to a DataFrame with a `Date` column followed by every variable.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(Variable::ALL.len() + 1);
        columns.push(date_column(&self.dates())?);
        for variable in Variable::ALL {
            columns.push(Column::new(variable.name().into(), self.column(variable)));
        }
        DataFrame::new(columns)
    }
}

/// Polars `Date` column named `Date`.
pub(crate) fn date_column(dates: &[NaiveDate]) -> PolarsResult<Column> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    Column::new("Date".into(), days).cast(&DataType::Date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: NaiveDate, close: f64) -> DailyRecord {
        DailyRecord {
            date,
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
            adj_close: close,
            dividend: 0.0,
            share_multiplier: 1.0,
            total_value: close,
        }
    }

    fn sample() -> PriceTable {
        PriceTable::new(
            "SPY",
            vec![
                record(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 100.0),
                record(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), 101.0),
            ],
        )
    }

    #[test]
    fn variable_names_round_trip() {
        for v in Variable::ALL {
            assert_eq!(v.name().parse::<Variable>().unwrap(), v);
        }
        assert_eq!("totalvalue".parse::<Variable>().unwrap(), Variable::TotalValue);
        assert!("Adj Close".parse::<Variable>().is_err());
    }

    #[test]
    fn column_and_lookup() {
        let table = sample();
        assert_eq!(table.column(Variable::Close), vec![100.0, 101.0]);
        assert_eq!(
            table
                .get(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
                .map(|r| r.close),
            Some(101.0)
        );
        assert!(table
            .get(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap())
            .is_none());
    }

    #[test]
    fn dataframe_has_date_and_all_variables() {
        let df = sample().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 10);
        assert_eq!(df.column("Date").unwrap().dtype(), &DataType::Date);
        let close = df.column("Close").unwrap().f64().unwrap();
        assert_eq!(close.get(1), Some(101.0));
    }

    #[test]
    fn epoch_offset_matches_polars() {
        let col = date_column(&[NaiveDate::from_ymd_opt(1970, 1, 2).unwrap()]).unwrap();
        assert_eq!(col.date().unwrap().get(0), Some(1));
    }
}
