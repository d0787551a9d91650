//! Normalization of untrusted model output into an [`InsightRecord`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use trendsage_core::{
    Competitor, CompetitorInsight, InsightProvenance, InsightRecord, ObservationSet, Trend,
};

use crate::error::InsightError;

/// Sentiments within this distance of `[-1, 1]` are clamped rather than rejected.
const SENTIMENT_TOLERANCE: f64 = 1.05;

/// Parses and validates a model response.
///
/// The response may be wrapped in a Markdown code fence or surrounded by
/// prose; only the outermost JSON object is parsed. Missing list fields
/// become empty lists, roster competitors the model skipped get a neutral
/// entry, and a missing `data_sources_used` is derived from `observations`.
///
/// # Errors
///
/// - [`InsightError::Parse`] if the text is not JSON
/// - [`InsightError::Validation`] if the JSON is not an object, lacks a usable
///   `overall_sentiment`, or has a field of the wrong shape
pub fn normalize_response(
    text: &str,
    competitors: &[Competitor],
    observations: &ObservationSet,
    now: DateTime<Utc>,
) -> Result<InsightRecord, InsightError> {
    let value: Value = serde_json::from_str(json_body(text))?;
    let Value::Object(obj) = value else {
        return Err(InsightError::validation("response is not a JSON object"));
    };

    let overall_sentiment = match obj.get("overall_sentiment") {
        None | Some(Value::Null) => {
            return Err(InsightError::validation("overall_sentiment is missing"));
        }
        Some(v) => coerce_sentiment(v).map_err(|reason| {
            InsightError::validation(format!("overall_sentiment {reason}"))
        })?,
    };

    let key_insights = string_list(&obj, "key_insights")?;
    let recommendations = string_list(&obj, "recommendations")?;
    let competitor_analysis = competitor_map(&obj)?;

    let data_sources_used = match obj.get("data_sources_used") {
        None | Some(Value::Null) => observations.sources_present(),
        Some(_) => string_list(&obj, "data_sources_used")?
            .into_iter()
            .collect::<BTreeSet<_>>(),
    };

    let mut record = InsightRecord {
        overall_sentiment,
        key_insights,
        competitor_analysis,
        recommendations,
        data_sources_used,
        generated_at: now,
        source: InsightProvenance::Model,
    };
    record.fill_missing_competitors(competitors.iter().map(|c| c.name.as_str()));
    Ok(record)
}

/// The JSON part of a reply: fence stripped, then narrowed to the outermost
/// `{...}` when the model wrapped it in prose.
fn json_body(text: &str) -> &str {
    let body = strip_code_fence(text);
    if body.starts_with('{') {
        return body;
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Accepts a finite number or numeric string in `[-1.05, 1.05]` and clamps it.
fn coerce_sentiment(value: &Value) -> Result<f64, String> {
    let raw = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| "is not representable".to_string())?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not numeric"))?,
        other => return Err(format!("has unexpected type {}", type_name(other))),
    };
    if !raw.is_finite() {
        return Err("is not finite".to_string());
    }
    if raw.abs() > SENTIMENT_TOLERANCE {
        return Err(format!("{raw} is out of range"));
    }
    Ok(raw.clamp(-1.0, 1.0))
}

fn string_list(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>, InsightError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(InsightError::validation(format!(
                    "{field}[{i}] is {} rather than a string",
                    type_name(other)
                ))),
            })
            .collect(),
        Some(other) => Err(InsightError::validation(format!(
            "{field} is {} rather than an array",
            type_name(other)
        ))),
    }
}

fn competitor_map(
    obj: &Map<String, Value>,
) -> Result<BTreeMap<String, CompetitorInsight>, InsightError> {
    let entries = match obj.get("competitor_analysis") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries,
        Some(other) => {
            return Err(InsightError::validation(format!(
                "competitor_analysis is {} rather than an object",
                type_name(other)
            )));
        }
    };

    let mut out = BTreeMap::new();
    for (name, entry) in entries {
        out.insert(name.clone(), competitor_entry(name, entry));
    }
    Ok(out)
}

fn competitor_entry(name: &str, entry: &Value) -> CompetitorInsight {
    let sentiment = entry.get("sentiment").map(coerce_sentiment);
    let sentiment = match sentiment {
        Some(Ok(s)) => s,
        Some(Err(reason)) => {
            tracing::warn!(
                competitor = name,
                reason = %reason,
                "unusable competitor sentiment, using neutral"
            );
            return CompetitorInsight::neutral();
        }
        None => {
            tracing::warn!(competitor = name, "competitor entry has no sentiment, using neutral");
            return CompetitorInsight::neutral();
        }
    };

    let trend = match entry.get("trend") {
        Some(Value::String(label)) => Trend::from(label.clone()),
        _ => Trend::Stable,
    };

    CompetitorInsight { sentiment, trend }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
