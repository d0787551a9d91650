use thiserror::Error;
use trendsage_core::SourceKind;

/// Errors returned by a single [`SourceClient`](crate::SourceClient) call.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A required credential is absent. Detected before any network call.
    #[error("{kind} source unavailable: {reason}")]
    Unavailable {
        kind: SourceKind,
        reason: &'static str,
    },

    /// HTTP 429 from the provider.
    #[error("{kind} source rate limited")]
    RateLimited {
        kind: SourceKind,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-2xx response.
    #[error("{kind} source returned HTTP {status}: {message}")]
    Status {
        kind: SourceKind,
        status: u16,
        message: String,
    },

    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("{kind} request failed: {source}")]
    Http {
        kind: SourceKind,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not valid JSON.
    #[error("{kind} response is not valid JSON: {source}")]
    Deserialize {
        kind: SourceKind,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse failure class used to decide between skipping, retrying, and failing fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ConfigurationMissing,
    Transient,
    Permanent,
}

impl SourceError {
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceError::Unavailable { kind, .. }
            | SourceError::RateLimited { kind, .. }
            | SourceError::Status { kind, .. }
            | SourceError::Http { kind, .. }
            | SourceError::Deserialize { kind, .. } => *kind,
        }
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }

    /// Classify the error.
    ///
    /// - `Unavailable` is a configuration condition.
    /// - 429, 408, 5xx, timeouts and connect failures are transient.
    /// - Other 4xx and undecodable bodies are permanent.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            SourceError::Unavailable { .. } => ErrorClass::ConfigurationMissing,
            SourceError::RateLimited { .. } => ErrorClass::Transient,
            SourceError::Status { status, .. } => {
                if *status >= 500 || *status == 408 {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Permanent
                }
            }
            SourceError::Http { source, .. } => {
                if source.is_decode() || source.is_builder() {
                    ErrorClass::Permanent
                } else {
                    ErrorClass::Transient
                }
            }
            SourceError::Deserialize { .. } => ErrorClass::Permanent,
        }
    }
}

/// Errors produced while collecting one (competitor, source) pair, or a whole run.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("competitor roster is empty")]
    EmptyRoster,

    #[error("invalid competitor at position {index}: {reason}")]
    InvalidCompetitor { index: usize, reason: String },

    #[error("no client registered for the {0} source")]
    NoClient(SourceKind),

    #[error("{kind} source still rate limited after {attempts} attempts")]
    RetriesExhausted {
        kind: SourceKind,
        attempts: u32,
        #[source]
        last: SourceError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl CollectionError {
    /// Short status label for the collection-run ledger.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CollectionError::EmptyRoster | CollectionError::InvalidCompetitor { .. } => "invalid",
            CollectionError::NoClient(_) => "no_client",
            CollectionError::RetriesExhausted { .. } => "rate_limited",
            CollectionError::Source(e) => match e.class() {
                ErrorClass::ConfigurationMissing => "unconfigured",
                ErrorClass::Transient => "transient",
                ErrorClass::Permanent => "permanent",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> SourceError {
        SourceError::Status {
            kind: SourceKind::News,
            status: code,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn unavailable_is_configuration_missing() {
        let err = SourceError::Unavailable {
            kind: SourceKind::Social,
            reason: "TWITTER_BEARER_TOKEN not configured",
        };
        assert_eq!(err.class(), ErrorClass::ConfigurationMissing);
        assert_eq!(err.kind(), SourceKind::Social);
    }

    #[test]
    fn rate_limited_is_transient() {
        let err = SourceError::RateLimited {
            kind: SourceKind::Social,
            retry_after_secs: Some(30),
        };
        assert_eq!(err.class(), ErrorClass::Transient);
        assert!(err.is_rate_limited());
    }

    #[test]
    fn server_errors_are_transient() {
        assert_eq!(status(500).class(), ErrorClass::Transient);
        assert_eq!(status(503).class(), ErrorClass::Transient);
        assert_eq!(status(408).class(), ErrorClass::Transient);
    }

    #[test]
    fn client_errors_are_permanent() {
        assert_eq!(status(400).class(), ErrorClass::Permanent);
        assert_eq!(status(401).class(), ErrorClass::Permanent);
        assert_eq!(status(404).class(), ErrorClass::Permanent);
        assert!(!status(403).is_rate_limited());
    }

    #[test]
    fn deserialize_is_permanent() {
        let src = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = SourceError::Deserialize {
            kind: SourceKind::Quote,
            source: src,
        };
        assert_eq!(err.class(), ErrorClass::Permanent);
    }

    #[test]
    fn collection_error_labels() {
        assert_eq!(CollectionError::NoClient(SourceKind::News).label(), "no_client");
        assert_eq!(CollectionError::from(status(500)).label(), "transient");
        assert_eq!(CollectionError::from(status(401)).label(), "permanent");
        let exhausted = CollectionError::RetriesExhausted {
            kind: SourceKind::Social,
            attempts: 3,
            last: SourceError::RateLimited {
                kind: SourceKind::Social,
                retry_after_secs: None,
            },
        };
        assert_eq!(exhausted.label(), "rate_limited");
        assert!(exhausted.to_string().contains("after 3 attempts"));
    }
}
