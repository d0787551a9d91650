//! Market-signal sources and the collection orchestrator.
//!
//! Each [`SourceClient`] fetches one source's raw JSON for one competitor and
//! never retries. [`CollectionOrchestrator`] walks competitors × sources in a
//! fixed order, retries rate-limited calls, isolates per-pair failures, and
//! substitutes sample social data when the social source is unusable.

pub mod client;
pub mod collector;
pub mod error;
pub mod newsapi;
pub mod retry;
pub mod sample;
pub mod twitter;
pub mod yahoo;

pub use client::{build_source_clients, SourceClient};
pub use collector::{
    CollectionFailure, CollectionOrchestrator, CollectionReport, OutcomeStatus, SourceOutcome,
};
pub use error::{CollectionError, ErrorClass, SourceError};
pub use newsapi::NewsApiClient;
pub use retry::{retry_on_rate_limit, RetryPolicy};
pub use sample::{sample_social_payload, SAMPLE_SOCIAL_NOTE};
pub use twitter::TwitterClient;
pub use yahoo::YahooQuoteClient;
