//! Turns collected observations into a validated [`InsightRecord`].
//!
//! [`InsightEngine::analyze`] sends the observation set to an
//! OpenAI-compatible chat endpoint and normalizes whatever comes back. It
//! never fails: any provider or validation problem yields the canned
//! fallback record instead.
//!
//! [`InsightRecord`]: trendsage_core::InsightRecord

pub mod engine;
pub mod error;
pub mod fallback;
pub mod openai;
pub mod prompt;
pub mod report;
pub mod validate;

pub use engine::{InsightEngine, InsightEngineConfig};
pub use error::InsightError;
pub use fallback::{fallback_record, FALLBACK_OVERALL_SENTIMENT};
pub use openai::ChatClient;
pub use prompt::{build_prompt, token_budget, SYSTEM_PROMPT};
pub use report::render_report;
pub use validate::normalize_response;
