//! Collected source observations.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One external data-provider category.
///
/// The serialized names (`stock`, `news`, `twitter`) are what appears in
/// prompts, persisted `data_sources_used`, and the collection-run ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "stock")]
    Quote,
    #[serde(rename = "news")]
    News,
    #[serde(rename = "twitter")]
    Social,
}

impl SourceKind {
    /// Fixed collection order: cheapest and most reliable first.
    pub const COLLECTION_ORDER: [SourceKind; 3] =
        [SourceKind::Quote, SourceKind::News, SourceKind::Social];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Quote => "stock",
            SourceKind::News => "news",
            SourceKind::Social => "twitter",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source's result for one competitor in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub competitor: String,
    pub source: SourceKind,
    #[serde(rename = "data")]
    pub payload: Value,
    #[serde(rename = "timestamp")]
    pub collected_at: DateTime<Utc>,
    /// `true` when `payload` is a locally synthesized stand-in.
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Observation {
    #[must_use]
    pub fn fetched(
        competitor: &str,
        source: SourceKind,
        payload: Value,
        collected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            competitor: competitor.to_string(),
            source,
            payload,
            collected_at,
            degraded: false,
            note: None,
        }
    }

    #[must_use]
    pub fn degraded(
        competitor: &str,
        source: SourceKind,
        payload: Value,
        collected_at: DateTime<Utc>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            competitor: competitor.to_string(),
            source,
            payload,
            collected_at,
            degraded: true,
            note: Some(note.into()),
        }
    }
}

/// Ordered observations for one run, competitor-major and source-minor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationSet(Vec<Observation>);

impl ObservationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observation: Observation) {
        self.0.push(observation);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Observation] {
        &self.0
    }

    #[must_use]
    pub fn degraded_count(&self) -> usize {
        self.0.iter().filter(|o| o.degraded).count()
    }

    /// Wire names of every source that contributed at least one observation.
    #[must_use]
    pub fn sources_present(&self) -> BTreeSet<String> {
        self.0
            .iter()
            .map(|o| o.source.as_str().to_string())
            .collect()
    }
}

impl From<Vec<Observation>> for ObservationSet {
    fn from(observations: Vec<Observation>) -> Self {
        Self(observations)
    }
}

impl IntoIterator for ObservationSet {
    type Item = Observation;
    type IntoIter = std::vec::IntoIter<Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ObservationSet {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
