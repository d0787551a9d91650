//! Sequential competitor × source collection with per-pair failure isolation.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use trendsage_core::{Competitor, Observation, ObservationSet, SourceKind};

use crate::client::SourceClient;
use crate::error::{CollectionError, SourceError};
use crate::retry::{retry_on_rate_limit, RetryPolicy};
use crate::sample::{sample_social_payload, SAMPLE_SOCIAL_NOTE};

const DEFAULT_INTER_COMPETITOR_DELAY: Duration = Duration::from_secs(2);

/// One (competitor, source) pair that produced no real payload.
#[derive(Debug)]
pub struct CollectionFailure {
    pub competitor: String,
    pub source: SourceKind,
    pub error: CollectionError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Ok,
    Degraded,
    Failed,
}

impl OutcomeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::Ok => "ok",
            OutcomeStatus::Degraded => "degraded",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Resolution of a single pair, in collection order. Feeds the run ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub competitor: String,
    pub source: SourceKind,
    pub status: OutcomeStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Default)]
pub struct CollectionReport {
    pub observations: ObservationSet,
    pub failures: Vec<CollectionFailure>,
    pub outcomes: Vec<SourceOutcome>,
    /// `true` when the run's token fired before every competitor was visited.
    pub cancelled: bool,
}

/// Walks the roster in order, and for each competitor every source in
/// [`SourceKind::COLLECTION_ORDER`].
///
/// Only an empty roster or a competitor with a blank name fails the whole
/// call. Everything else is recorded as a [`CollectionFailure`] and collection
/// moves on. A failed social pair is replaced by a degraded sample observation.
pub struct CollectionOrchestrator {
    clients: Vec<Box<dyn SourceClient>>,
    policy: RetryPolicy,
    inter_competitor_delay: Duration,
}

impl CollectionOrchestrator {
    #[must_use]
    pub fn new(clients: Vec<Box<dyn SourceClient>>) -> Self {
        Self {
            clients,
            policy: RetryPolicy::default(),
            inter_competitor_delay: DEFAULT_INTER_COMPETITOR_DELAY,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_inter_competitor_delay(mut self, delay: Duration) -> Self {
        self.inter_competitor_delay = delay;
        self
    }

    fn client_for(&self, kind: SourceKind) -> Option<&dyn SourceClient> {
        self.clients
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| c.as_ref())
    }

    /// # Errors
    ///
    /// Returns [`CollectionError::EmptyRoster`] or
    /// [`CollectionError::InvalidCompetitor`] before any request is made.
    pub async fn collect(
        &self,
        competitors: &[Competitor],
        cancel: &CancellationToken,
    ) -> Result<CollectionReport, CollectionError> {
        check_roster(competitors)?;

        let mut report = CollectionReport::default();

        for (index, competitor) in competitors.iter().enumerate() {
            if index > 0 && !self.inter_competitor_delay.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(self.inter_competitor_delay) => {}
                }
            }

            if cancel.is_cancelled() {
                tracing::warn!(
                    visited = index,
                    total = competitors.len(),
                    "collection cancelled, returning partial observations"
                );
                report.cancelled = true;
                break;
            }

            for kind in SourceKind::COLLECTION_ORDER {
                self.collect_pair(competitor, kind, &mut report).await;
            }
        }

        tracing::info!(
            observations = report.observations.len(),
            degraded = report.observations.degraded_count(),
            failures = report.failures.len(),
            cancelled = report.cancelled,
            "collection finished"
        );

        Ok(report)
    }

    async fn collect_pair(
        &self,
        competitor: &Competitor,
        kind: SourceKind,
        report: &mut CollectionReport,
    ) {
        let result = match self.client_for(kind) {
            Some(client) if !client.is_configured() => {
                Err(CollectionError::Source(SourceError::Unavailable {
                    kind,
                    reason: "credential not configured",
                }))
            }
            Some(client) => retry_on_rate_limit(&self.policy, kind, || client.fetch(competitor))
                .await
                .map_err(|e| self.classify_failure(e)),
            None => Err(CollectionError::NoClient(kind)),
        };

        let now = Utc::now();
        match result {
            Ok(payload) => {
                tracing::info!(
                    competitor = %competitor.name,
                    source = %kind,
                    "source collected"
                );
                report
                    .observations
                    .push(Observation::fetched(&competitor.name, kind, payload, now));
                report.outcomes.push(SourceOutcome {
                    competitor: competitor.name.clone(),
                    source: kind,
                    status: OutcomeStatus::Ok,
                    detail: None,
                });
            }
            Err(error) => {
                tracing::warn!(
                    competitor = %competitor.name,
                    source = %kind,
                    class = error.label(),
                    error = %error,
                    "source failed"
                );

                let status = if kind == SourceKind::Social {
                    report.observations.push(Observation::degraded(
                        &competitor.name,
                        kind,
                        sample_social_payload(&competitor.name, now),
                        now,
                        SAMPLE_SOCIAL_NOTE,
                    ));
                    OutcomeStatus::Degraded
                } else {
                    OutcomeStatus::Failed
                };

                report.outcomes.push(SourceOutcome {
                    competitor: competitor.name.clone(),
                    source: kind,
                    status,
                    detail: Some(error.to_string()),
                });
                report.failures.push(CollectionFailure {
                    competitor: competitor.name.clone(),
                    source: kind,
                    error,
                });
            }
        }
    }

    fn classify_failure(&self, error: SourceError) -> CollectionError {
        if error.is_rate_limited() {
            CollectionError::RetriesExhausted {
                kind: error.kind(),
                attempts: self.policy.attempts(),
                last: error,
            }
        } else {
            CollectionError::Source(error)
        }
    }
}

fn check_roster(competitors: &[Competitor]) -> Result<(), CollectionError> {
    if competitors.is_empty() {
        return Err(CollectionError::EmptyRoster);
    }
    if let Some(index) = competitors.iter().position(|c| c.name.trim().is_empty()) {
        return Err(CollectionError::InvalidCompetitor {
            index,
            reason: "name must not be blank".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod tests;
