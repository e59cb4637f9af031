//! quotefeed core: historical quote ingestion with split and dividend adjustment.
//!
//! This crate contains:
//! - The request URL builder for the CSV quote feed
//! - Feed sources (Yahoo over HTTP, in-memory, saved files)
//! - The per-symbol cleaning routine: row classification, event extraction,
//!   Dividend / ShareMultiplier / TotalValue reconstruction
//! - The multi-symbol loader and its per-variable reshape

pub mod config;
pub mod data;

pub use config::FeedConfig;
pub use data::{
    get_table, load, make_url, FeedError, FeedSource, LoadError, LoadOptions, Panel, PriceTable,
    QuoteRequest, Variable,
};
