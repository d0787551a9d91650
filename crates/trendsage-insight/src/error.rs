use thiserror::Error;

/// Errors raised while obtaining or validating a model analysis.
///
/// None of these escape [`InsightEngine::analyze`](crate::InsightEngine::analyze);
/// they are logged and replaced by the fallback record.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("chat completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat completion returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("chat completion returned no content")]
    EmptyResponse,

    #[error("analysis is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("analysis failed validation: {0}")]
    Validation(String),
}

impl InsightError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        InsightError::Validation(msg.into())
    }
}
