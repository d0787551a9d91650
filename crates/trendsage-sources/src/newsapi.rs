//! Recent articles from the NewsAPI `everything` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use trendsage_core::{Competitor, SourceKind};

use crate::client::{build_http_client, normalize_base_url, send_json, SourceClient};
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const PAGE_SIZE: &str = "5";

/// News source keyed on the competitor's display name.
///
/// The key goes in the `X-Api-Key` header so it never shows up in logged URLs.
pub struct NewsApiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl NewsApiClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<&str>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, timeout, user_agent, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: Option<&str>,
        timeout: Duration,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_http_client(SourceKind::News, timeout, user_agent)?,
            api_key: api_key.map(str::to_owned),
            base_url: normalize_base_url(base_url),
        })
    }
}

#[async_trait]
impl SourceClient for NewsApiClient {
    fn kind(&self) -> SourceKind {
        SourceKind::News
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, competitor: &Competitor) -> Result<Value, SourceError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(SourceError::Unavailable {
                kind: SourceKind::News,
                reason: "NEWS_API_KEY not configured",
            });
        };

        let url = format!("{}/v2/everything", self.base_url);
        let request = self
            .client
            .get(url)
            .header("X-Api-Key", key)
            .query(&[
                ("q", competitor.name.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", PAGE_SIZE),
            ]);

        send_json(SourceKind::News, request).await
    }
}
