//! Feed source trait and structured error types.
//!
//! The FeedSource trait abstracts over where the raw quote CSV comes from
//! (Yahoo over HTTP, in-memory bodies, a directory of saved CSV files) so the
//! table loader can be driven offline and mocked in tests.

use super::request::QuoteRequest;
use crate::config::FeedConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for feed operations.
///
/// These are designed to be displayable in both library and CLI contexts.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("unexpected feed format: {0}")]
    Format(String),

    #[error("cannot parse {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// A feed error tagged with the symbol whose load failed.
#[derive(Debug, Error)]
#[error("failed to load {symbol}: {source}")]
pub struct LoadError {
    pub symbol: String,
    #[source]
    pub source: FeedError,
}

impl LoadError {
    pub fn new(symbol: impl Into<String>, source: FeedError) -> Self {
        Self {
            symbol: symbol.into(),
            source,
        }
    }
}

/// Trait for raw feed sources.
///
/// Implementations return the undecoded CSV document for a request. Cleaning
/// and adjustment happen above this trait; sources don't know about them.
pub trait FeedSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the raw CSV document for one symbol and date range. `config`
    /// is the same one the caller parses the document with.
    fn fetch_csv(
        &self,
        request: &QuoteRequest,
        config: &FeedConfig,
    ) -> Result<String, FeedError>;
}

/// Feed source backed by CSV bodies held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    bodies: HashMap<String, String>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body for a symbol. Symbols are matched case-insensitively.
    pub fn with(mut self, symbol: &str, body: impl Into<String>) -> Self {
        self.insert(symbol, body);
        self
    }

    pub fn insert(&mut self, symbol: &str, body: impl Into<String>) {
        self.bodies.insert(symbol.to_uppercase(), body.into());
    }
}

impl FeedSource for MemoryFeed {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_csv(
        &self,
        request: &QuoteRequest,
        _config: &FeedConfig,
    ) -> Result<String, FeedError> {
        self.bodies
            .get(request.symbol())
            .cloned()
            .ok_or_else(|| FeedError::Fetch(format!("no body registered for {}", request.symbol())))
    }
}

/// Feed source reading previously saved feed documents from `{dir}/{SYMBOL}.csv`.
///
/// The whole file is returned regardless of the requested date range, exactly
/// as the remote feed document was saved.
#[derive(Debug, Clone)]
pub struct FileFeed {
    dir: PathBuf,
}

impl FileFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the saved document for a symbol.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol.to_uppercase()))
    }
}

impl FeedSource for FileFeed {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch_csv(
        &self,
        request: &QuoteRequest,
        _config: &FeedConfig,
    ) -> Result<String, FeedError> {
        let path = self.path_for(request.symbol());
        std::fs::read_to_string(&path)
            .map_err(|e| FeedError::Fetch(format!("read {}: {e}", path.display())))
    }
}

/// Progress callback for multi-symbol loads.
pub trait LoadProgress {
    /// Called once before the first symbol.
    fn on_batch_start(&self, total: usize);

    /// Called when starting to load a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol load completes.
    fn on_complete(&self, symbol: &str, result: Result<(), &FeedError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl LoadProgress for StdoutProgress {
    fn on_batch_start(&self, _total: usize) {
        println!("Loading symbols");
    }

    fn on_start(&self, symbol: &str, _index: usize, _total: usize) {
        println!("{symbol}");
    }

    fn on_complete(&self, symbol: &str, result: Result<(), &FeedError>) {
        if let Err(e) = result {
            println!("  FAIL: {symbol}: {e}");
        }
    }

    fn on_batch_complete(&self, _succeeded: usize, failed: usize, _total: usize) {
        if failed == 0 {
            println!("All symbols loaded.\n");
        } else {
            println!("Loading finished with {failed} failed symbol(s).\n");
        }
    }
}

/// Progress reporter that prints to stderr, keeping stdout free for data.
pub struct StderrProgress;

impl LoadProgress for StderrProgress {
    fn on_batch_start(&self, total: usize) {
        eprintln!("Loading {total} symbol(s)");
    }

    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        eprintln!("[{}/{}] {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, result: Result<(), &FeedError>) {
        if let Err(e) = result {
            eprintln!("  FAIL: {symbol}: {e}");
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        eprintln!("All symbols loaded: {succeeded}/{total} succeeded, {failed} failed");
    }
}
