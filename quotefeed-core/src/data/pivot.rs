//! Multi-symbol reshape.
//!
//! Turns one table per symbol into one table per variable whose columns are
//! symbols. All variable tables share the union of the symbols' dates; a
//! symbol without a row on some date has an absent (`None`) cell there.

use super::table::{date_column, DailyRecord, PriceTable, Variable};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One variable across symbols: rows are dates, columns are symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelTable {
    variable: Variable,
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    /// One column per symbol, each as long as `dates`.
    columns: Vec<Vec<Option<f64>>>,
}

impl PanelTable {
    pub fn variable(&self) -> Variable {
        self.variable
    }

    /// Common date axis, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Column names, in load order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn column(&self, symbol: &str) -> Option<&[Option<f64>]> {
        let i = self.symbols.iter().position(|s| s == symbol)?;
        Some(&self.columns[i])
    }

    /// Cell for a date and symbol; `None` if either is unknown or the
    /// symbol has no row on that date.
    pub fn value(&self, date: NaiveDate, symbol: &str) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.column(symbol)?[row]
    }

    /// Values of one date across symbols, in column order.
    pub fn row(&self, date: NaiveDate) -> Option<Vec<Option<f64>>> {
        let row = self.dates.binary_search(&date).ok()?;
        Some(self.columns.iter().map(|c| c[row]).collect())
    }

    /// Convert to a DataFrame with a `Date` column followed by one nullable
    /// Float64 column per symbol.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.symbols.len() + 1);
        columns.push(date_column(&self.dates)?);
        for (symbol, values) in self.symbols.iter().zip(&self.columns) {
            columns.push(Column::new(symbol.as_str().into(), values.clone()));
        }
        DataFrame::new(columns)
    }
}

/// Per-variable tables for a batch of symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    tables: BTreeMap<Variable, PanelTable>,
}

impl Panel {
    pub fn get(&self, variable: Variable) -> Option<&PanelTable> {
        self.tables.get(&variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.tables.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &PanelTable)> {
        self.tables.iter().map(|(v, t)| (*v, t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Symbols present in the panel, in load order.
    pub fn symbols(&self) -> &[String] {
        self.tables
            .values()
            .next()
            .map(|t| t.symbols())
            .unwrap_or(&[])
    }

    pub fn into_map(self) -> BTreeMap<Variable, PanelTable> {
        self.tables
    }
}

/// Regroup per-symbol tables by variable.
///
/// Column order follows the input order. A symbol that appears twice keeps
/// its first position and the later table's data.
pub fn pivot_tables(tables: Vec<PriceTable>) -> Panel {
    if tables.is_empty() {
        return Panel::default();
    }

    let mut symbols: Vec<String> = Vec::new();
    let mut by_symbol: HashMap<String, PriceTable> = HashMap::new();
    for table in tables {
        if !by_symbol.contains_key(table.symbol()) {
            symbols.push(table.symbol().to_string());
        }
        by_symbol.insert(table.symbol().to_string(), table);
    }

    // Union of all dates
    let mut all_dates = BTreeSet::new();
    for table in by_symbol.values() {
        all_dates.extend(table.rows().iter().map(|r| r.date));
    }
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

    // Per symbol: each common date → that symbol's row, if any
    let aligned: Vec<Vec<Option<&DailyRecord>>> = symbols
        .iter()
        .map(|symbol| {
            let rows: HashMap<NaiveDate, &DailyRecord> = by_symbol[symbol]
                .rows()
                .iter()
                .map(|r| (r.date, r))
                .collect();
            dates.iter().map(|d| rows.get(d).copied()).collect()
        })
        .collect();

    let tables = Variable::ALL
        .into_iter()
        .map(|variable| {
            let columns = aligned
                .iter()
                .map(|rows| rows.iter().map(|r| r.map(|r| r.value(variable))).collect())
                .collect();
            let table = PanelTable {
                variable,
                dates: dates.clone(),
                symbols: symbols.clone(),
                columns,
            };
            (variable, table)
        })
        .collect();

    Panel { tables }
}
