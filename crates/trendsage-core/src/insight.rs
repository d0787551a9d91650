//! The normalized analysis result persisted once per calendar day.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction a competitor is moving in, as reported by the analysis.
///
/// Labels outside the known set are kept verbatim in [`Trend::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Trend {
    Positive,
    Stable,
    Growing,
    Negative,
    Declining,
    Other(String),
}

impl Trend {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Trend::Positive => "positive",
            Trend::Stable => "stable",
            Trend::Growing => "growing",
            Trend::Negative => "negative",
            Trend::Declining => "declining",
            Trend::Other(label) => label,
        }
    }
}

impl From<String> for Trend {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Trend::Positive,
            "stable" | "neutral" => Trend::Stable,
            "growing" => Trend::Growing,
            "negative" => Trend::Negative,
            "declining" => Trend::Declining,
            "" => Trend::Stable,
            _ => Trend::Other(label.trim().to_string()),
        }
    }
}

impl From<Trend> for String {
    fn from(trend: Trend) -> Self {
        trend.as_str().to_string()
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorInsight {
    pub sentiment: f64,
    pub trend: Trend,
}

impl CompetitorInsight {
    /// Placeholder for a competitor the analysis said nothing about.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            sentiment: 0.0,
            trend: Trend::Stable,
        }
    }
}

/// Where an [`InsightRecord`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightProvenance {
    Model,
    Fallback,
}

impl InsightProvenance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            InsightProvenance::Model => "model",
            InsightProvenance::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for InsightProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InsightProvenance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model" => Ok(InsightProvenance::Model),
            "fallback" => Ok(InsightProvenance::Fallback),
            other => Err(format!("unknown insight provenance '{other}'")),
        }
    }
}

/// Validated analysis output for one run.
///
/// `overall_sentiment` is always within `[-1.0, 1.0]`, whatever the provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub overall_sentiment: f64,
    pub key_insights: Vec<String>,
    pub competitor_analysis: BTreeMap<String, CompetitorInsight>,
    pub recommendations: Vec<String>,
    pub data_sources_used: BTreeSet<String>,
    pub generated_at: DateTime<Utc>,
    pub source: InsightProvenance,
}

impl InsightRecord {
    /// Add a neutral entry for every name in `names` missing from `competitor_analysis`.
    pub fn fill_missing_competitors<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in names {
            self.competitor_analysis
                .entry(name.to_string())
                .or_insert_with(CompetitorInsight::neutral);
        }
    }
}
