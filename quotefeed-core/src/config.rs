//! Feed configuration.
//!
//! The footer length and the two event-log query constants are assumptions
//! about the remote feed, not documented protocol facts, so they live here as
//! named defaults that a TOML file can override:
//!
//! ```toml
//! base_url = "http://real-chart.finance.yahoo.com/x"
//! footer_rows = 4
//! event_offset = 0
//! event_limit = 30000
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Historical-quotes CSV endpoint.
pub const DEFAULT_BASE_URL: &str = "http://real-chart.finance.yahoo.com/x";

/// Trailing metadata rows in every feed document (STARTDATE, ENDDATE,
/// TOTALSIZE, STATUS).
pub const FOOTER_ROWS: usize = 4;

/// First event-log entry requested (`y` query parameter).
pub const EVENT_LOG_OFFSET: u32 = 0;

/// Number of event-log entries requested (`z` query parameter).
pub const EVENT_LOG_LIMIT: u32 = 30_000;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str = concat!("quotefeed/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for reaching and decoding the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub base_url: String,
    pub footer_rows: usize,
    pub event_offset: u32,
    pub event_limit: u32,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            footer_rows: FOOTER_ROWS,
            event_offset: EVENT_LOG_OFFSET,
            event_limit: EVENT_LOG_LIMIT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FeedConfig {
    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
