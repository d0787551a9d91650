//! The [`SourceClient`] seam and the HTTP plumbing its variants share.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use trendsage_core::{AppConfig, Competitor, SourceKind};

use crate::error::SourceError;
use crate::newsapi::NewsApiClient;
use crate::twitter::TwitterClient;
use crate::yahoo::YahooQuoteClient;

/// Longest error-body excerpt kept in [`SourceError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Fetches one source's raw payload for one competitor.
///
/// Implementations make exactly one request per call. Retrying is the
/// orchestrator's job.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// `false` when a required credential is missing. `fetch` then fails
    /// with [`SourceError::Unavailable`] without touching the network.
    fn is_configured(&self) -> bool;

    /// # Errors
    ///
    /// See [`SourceError`] for the full taxonomy.
    async fn fetch(&self, competitor: &Competitor) -> Result<Value, SourceError>;
}

/// Builds the three production clients from application config, in
/// collection order.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if a `reqwest::Client` cannot be built.
pub fn build_source_clients(config: &AppConfig) -> Result<Vec<Box<dyn SourceClient>>, SourceError> {
    let timeout = config.source_timeout();
    let user_agent = config.user_agent.as_str();

    let quote = YahooQuoteClient::new(timeout, user_agent)?;
    let news = NewsApiClient::new(config.news_api_key.as_deref(), timeout, user_agent)?;
    let social = TwitterClient::new(config.twitter_bearer_token.as_deref(), timeout, user_agent)?;

    Ok(vec![Box::new(quote), Box::new(news), Box::new(social)])
}

pub(crate) fn build_http_client(
    kind: SourceKind,
    timeout: Duration,
    user_agent: &str,
) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(user_agent)
        .build()
        .map_err(|source| SourceError::Http { kind, source })
}

/// Strips trailing slashes so endpoint paths can be appended with `format!`.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Sends `request` and maps the response onto the [`SourceError`] taxonomy.
///
/// - 2xx: body parsed as JSON and returned verbatim
/// - 429: [`SourceError::RateLimited`], with `Retry-After` seconds if given
/// - other non-2xx: [`SourceError::Status`] with a short message
pub(crate) async fn send_json(
    kind: SourceKind,
    request: RequestBuilder,
) -> Result<Value, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|source| SourceError::Http { kind, source })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        return Err(SourceError::RateLimited {
            kind,
            retry_after_secs,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| SourceError::Http { kind, source })?;

    if !status.is_success() {
        return Err(SourceError::Status {
            kind,
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| SourceError::Deserialize { kind, source })
}

/// Picks a human-readable message out of an error body.
///
/// Providers disagree on the field: NewsAPI uses `message`, the Twitter v2
/// API uses `detail` and `title`.
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for field in ["message", "detail", "title"] {
            if let Some(msg) = json.get(field).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
