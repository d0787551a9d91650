//! Recent posts from the Twitter/X v2 search API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use trendsage_core::{Competitor, SourceKind};

use crate::client::{build_http_client, normalize_base_url, send_json, SourceClient};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// The v2 recent-search endpoint rejects `max_results` below 10.
const MAX_RESULTS: &str = "10";
const TWEET_FIELDS: &str = "created_at,public_metrics";

/// Social source keyed on the competitor's handle.
pub struct TwitterClient {
    client: Client,
    bearer_token: Option<String>,
    base_url: String,
}

impl TwitterClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        bearer_token: Option<&str>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(bearer_token, timeout, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        bearer_token: Option<&str>,
        timeout: Duration,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(SourceKind::Social, timeout, user_agent)?,
            bearer_token: bearer_token.map(str::to_owned),
            base_url: normalize_base_url(base_url),
        })
    }
}

#[async_trait]
impl SourceClient for TwitterClient {
    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    fn is_configured(&self) -> bool {
        self.bearer_token.is_some()
    }

    async fn fetch(&self, competitor: &Competitor) -> Result<Value, SourceError> {
        let Some(token) = self.bearer_token.as_deref() else {
            return Err(SourceError::Unavailable {
                kind: SourceKind::Social,
                reason: "TWITTER_BEARER_TOKEN not configured",
            });
        };

        let url = format!("{}/2/tweets/search/recent", self.base_url);
        let query = format!("from:{}", competitor.handle);
        let request = self.client.get(url).bearer_auth(token).query(&[
            ("query", query.as_str()),
            ("max_results", MAX_RESULTS),
            ("tweet.fields", TWEET_FIELDS),
        ]);

        send_json(SourceKind::Social, request).await
    }
}
