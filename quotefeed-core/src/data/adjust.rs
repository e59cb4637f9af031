//! Split and dividend reconstruction.
//!
//! Every column here is aligned to the price dates passed in (ascending).
//! Events on dates that are not in that index do not appear in the output.

use super::feed::{EventKind, EventRecord};
use super::provider::FeedError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Parse an `N:D` split ratio into `N / D`.
///
/// Anything other than exactly two numeric parts with a non-zero
/// denominator is a format error.
pub fn split_ratio(value: &str) -> Result<f64, FeedError> {
    let malformed = || FeedError::Format(format!("split ratio '{value}' is not N:D"));

    let mut parts = value.split(':');
    let (Some(numerator), Some(denominator), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let numerator: f64 = numerator.trim().parse().map_err(|_| malformed())?;
    let denominator: f64 = denominator.trim().parse().map_err(|_| malformed())?;
    if denominator == 0.0 {
        return Err(FeedError::Format(format!(
            "split ratio '{value}' has a zero denominator"
        )));
    }

    Ok(numerator / denominator)
}

fn dividend_amount(value: &str) -> Result<f64, FeedError> {
    value
        .trim()
        .parse()
        .map_err(|_| FeedError::Format(format!("dividend value '{value}' is not a number")))
}

/// Cash dividend per date, 0.0 where nothing was paid.
///
/// Several dividends on one date add up.
pub fn dividend_column(dates: &[NaiveDate], events: &[EventRecord]) -> Result<Vec<f64>, FeedError> {
    let mut by_date: HashMap<NaiveDate, f64> = HashMap::new();
    for event in events.iter().filter(|e| e.kind == EventKind::Dividend) {
        *by_date.entry(event.date).or_insert(0.0) += dividend_amount(&event.value)?;
    }

    Ok(dates
        .iter()
        .map(|date| by_date.get(date).copied().unwrap_or(0.0))
        .collect())
}

/// Cumulative split multiplier per date.
///
/// Dates without a split contribute a neutral 1.0 to the running product.
/// Several splits on one date multiply.
pub fn share_multiplier_column(
    dates: &[NaiveDate],
    events: &[EventRecord],
) -> Result<Vec<f64>, FeedError> {
    let splits: Vec<&EventRecord> = events.iter().filter(|e| e.kind == EventKind::Split).collect();
    if splits.is_empty() {
        return Ok(vec![1.0; dates.len()]);
    }

    let mut factors: HashMap<NaiveDate, f64> = HashMap::new();
    for split in splits {
        *factors.entry(split.date).or_insert(1.0) *= split_ratio(&split.value)?;
    }

    let mut multiplier = 1.0;
    Ok(dates
        .iter()
        .map(|date| {
            multiplier *= factors.get(date).copied().unwrap_or(1.0);
            multiplier
        })
        .collect())
}

/// Liquidation value of one original share with hoarded dividends:
/// `multiplier * close + running_sum(multiplier * dividend)`.
///
/// Inputs must be in ascending date order and of equal length.
pub fn total_value_column(close: &[f64], multiplier: &[f64], dividend: &[f64]) -> Vec<f64> {
    debug_assert_eq!(close.len(), multiplier.len());
    debug_assert_eq!(close.len(), dividend.len());

    let mut hoarded = 0.0;
    close
        .iter()
        .zip(multiplier)
        .zip(dividend)
        .map(|((&close, &shares), &dividend)| {
            hoarded += shares * dividend;
            shares * close + hoarded
        })
        .collect()
}
