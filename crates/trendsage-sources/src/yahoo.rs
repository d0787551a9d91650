//! Stock quotes from the Yahoo Finance chart endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use trendsage_core::{Competitor, SourceKind};

use crate::client::{build_http_client, normalize_base_url, send_json, SourceClient};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Quote source keyed on the competitor's ticker symbol. Needs no credential.
pub struct YahooQuoteClient {
    client: Client,
    base_url: String,
}

impl YahooQuoteClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        Self::with_base_url(timeout, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        timeout: Duration,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(SourceKind::Quote, timeout, user_agent)?,
            base_url: normalize_base_url(base_url),
        })
    }
}

#[async_trait]
impl SourceClient for YahooQuoteClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Quote
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, competitor: &Competitor) -> Result<Value, SourceError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, competitor.symbol);
        send_json(SourceKind::Quote, self.client.get(url)).await
    }
}
