//! Feed access, cleaning and reshaping.

pub mod adjust;
pub mod feed;
pub mod loader;
pub mod pivot;
pub mod provider;
pub mod request;
pub mod table;
pub mod yahoo;

pub use feed::{parse_feed, EventKind, EventRecord, PriceRecord, RawFeed};
pub use loader::{clean_table, get_table, load, FailurePolicy, LoadOptions, LoadSummary};
pub use pivot::{pivot_tables, Panel, PanelTable};
pub use provider::{
    FeedError, FeedSource, FileFeed, LoadError, LoadProgress, MemoryFeed, StderrProgress,
    StdoutProgress,
};
pub use request::{make_url, parse_date, Frequency, QuoteRequest};
pub use table::{DailyRecord, PriceTable, Variable};
pub use yahoo::YahooFeed;
