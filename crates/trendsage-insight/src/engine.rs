use chrono::Utc;
use trendsage_core::{AppConfig, Competitor, InsightProvenance, InsightRecord, ObservationSet};

use crate::error::InsightError;
use crate::fallback::fallback_record;
use crate::openai::{ChatClient, ChatMessage, ChatRequest};
use crate::prompt::{build_prompt, token_budget, SYSTEM_PROMPT};
use crate::validate::normalize_response;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct InsightEngineConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for InsightEngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl InsightEngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model: config.openai_model.clone(),
            ..Self::default()
        }
    }
}

pub struct InsightEngine {
    client: Option<ChatClient>,
    config: InsightEngineConfig,
}

impl InsightEngine {
    #[must_use]
    pub fn new(client: Option<ChatClient>, config: InsightEngineConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn has_model(&self) -> bool {
        self.client.is_some()
    }

    /// Produces the day's analysis. Never fails; see the crate docs.
    pub async fn analyze(
        &self,
        competitors: &[Competitor],
        observations: &ObservationSet,
    ) -> InsightRecord {
        let Some(client) = self.client.as_ref() else {
            tracing::info!("no analysis provider configured, using fallback analysis");
            return fallback_record(competitors, observations, Utc::now());
        };

        match self.request_analysis(client, competitors, observations).await {
            Ok(mut record) => {
                record.generated_at = Utc::now();
                record.source = InsightProvenance::Model;
                tracing::info!(
                    overall_sentiment = record.overall_sentiment,
                    competitors = record.competitor_analysis.len(),
                    "model analysis accepted"
                );
                record
            }
            Err(e) => {
                tracing::warn!(error = %e, "model analysis unusable, using fallback analysis");
                fallback_record(competitors, observations, Utc::now())
            }
        }
    }

    async fn request_analysis(
        &self,
        client: &ChatClient,
        competitors: &[Competitor],
        observations: &ObservationSet,
    ) -> Result<InsightRecord, InsightError> {
        let prompt = build_prompt(competitors, observations)?;
        let request = ChatRequest {
            model: self.config.model.clone(),
            max_tokens: token_budget(prompt.len()),
            temperature: self.config.temperature,
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
        };

        let text = client.complete(&request).await?;
        normalize_response(&text, competitors, observations, Utc::now())
    }
}
