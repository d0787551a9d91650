use std::fmt::Write as _;

use trendsage_core::{Competitor, ObservationSet};

pub const SYSTEM_PROMPT: &str = "You are a market analyst. Return only valid JSON.";

const MIN_TOKENS: u32 = 800;
const MAX_TOKENS: u32 = 4000;

/// Completion budget that grows with the prompt: `800 + len / 16`, capped at 4000.
#[must_use]
pub fn token_budget(prompt_len: usize) -> u32 {
    let scaled = u32::try_from(prompt_len / 16).unwrap_or(u32::MAX);
    MIN_TOKENS.saturating_add(scaled).clamp(MIN_TOKENS, MAX_TOKENS)
}

/// User prompt asking for the five-field analysis object.
///
/// # Errors
///
/// Returns the `serde_json` error if the observation set cannot be serialized.
pub fn build_prompt(
    competitors: &[Competitor],
    observations: &ObservationSet,
) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(observations)?;
    let names: Vec<&str> = competitors.iter().map(|c| c.name.as_str()).collect();

    let mut prompt = String::with_capacity(data.len() + 640);
    prompt.push_str("Analyze this market data and provide insights in JSON format.\n\n");
    let _ = writeln!(prompt, "Tracked competitors: {}", names.join(", "));
    prompt.push_str(
        "Observations marked \"degraded\": true are sample data, not live results; weigh them accordingly.\n\n",
    );
    prompt.push_str(&data);
    prompt.push_str(
        "\n\nReturn a single JSON object with exactly these fields:\n\
         - overall_sentiment: number between -1 and 1\n\
         - key_insights: array of strings\n\
         - competitor_analysis: object keyed by competitor name, each value {\"sentiment\": number between -1 and 1, \"trend\": string}\n\
         - recommendations: array of strings\n\
         - data_sources_used: array of strings\n\n\
         Respond with the JSON object only. No prose, no Markdown.",
    );
    Ok(prompt)
}
