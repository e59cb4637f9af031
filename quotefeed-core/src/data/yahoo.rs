//! Yahoo Finance historical-quotes CSV source.
//!
//! One blocking GET per request against the endpoint named by the
//! [`FeedConfig`] handed to each fetch. Timeout and user agent are fixed when
//! the client is built. There are no
//! retries and no rate limiting; any transport or HTTP failure surfaces as
//! [`FeedError::Fetch`].

use super::provider::{FeedError, FeedSource};
use super::request::{make_url, QuoteRequest};
use crate::config::FeedConfig;
use std::time::Duration;

/// Yahoo Finance feed source.
pub struct YahooFeed {
    client: reqwest::blocking::Client,
}

impl YahooFeed {
    /// Build the HTTP client from the transport settings of `config`.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FeedError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl FeedSource for YahooFeed {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_csv(
        &self,
        request: &QuoteRequest,
        config: &FeedConfig,
    ) -> Result<String, FeedError> {
        let url = make_url(request, config);
        tracing::debug!(%url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FeedError::Fetch(format!("{}: {e}", request.symbol())))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Fetch(format!(
                "HTTP {status} for {}",
                request.symbol()
            )));
        }

        resp.text()
            .map_err(|e| FeedError::Fetch(format!("reading body for {}: {e}", request.symbol())))
    }
}
