//! One full pass: collect, analyze, persist, render.
//!
//! Only a persistence failure aborts a pass. Source failures degrade inside
//! the orchestrator and analysis always produces a record. Writes to the run
//! ledger are best-effort and logged when they fail.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use trendsage_core::{load_roster, AppConfig, Competitor, InsightRecord};
use trendsage_db::InsightStore;
use trendsage_insight::{render_report, ChatClient, InsightEngine, InsightEngineConfig};
use trendsage_sources::{
    build_source_clients, CollectionOrchestrator, CollectionReport, RetryPolicy,
};

const RUN_TYPE: &str = "insights";

/// What started the pass. Stored as the ledger's `trigger_source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Cli,
    Scheduler,
}

impl Trigger {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Trigger::Cli => "cli",
            Trigger::Scheduler => "scheduler",
        }
    }
}

/// Everything a pass needs apart from the insight store.
pub(crate) struct PipelineDeps {
    pub(crate) competitors: Vec<Competitor>,
    pub(crate) orchestrator: CollectionOrchestrator,
    pub(crate) engine: InsightEngine,
    /// Postgres pool for the run ledger. `None` skips ledger writes.
    pub(crate) ledger: Option<PgPool>,
    pub(crate) run_timeout: Duration,
}

impl PipelineDeps {
    /// Loads the roster and builds the production clients from `config`.
    pub(crate) fn from_config(config: &AppConfig, ledger: Option<PgPool>) -> anyhow::Result<Self> {
        let competitors = load_roster(&config.competitors_path)?;
        let clients = build_source_clients(config)?;
        let orchestrator = CollectionOrchestrator::new(clients)
            .with_retry_policy(RetryPolicy::new(config.max_attempts, config.backoff_step()))
            .with_inter_competitor_delay(config.inter_competitor_delay());
        let engine = InsightEngine::new(
            ChatClient::from_app_config(config)?,
            InsightEngineConfig::from_app_config(config),
        );

        tracing::info!(
            competitors = competitors.len(),
            model = engine.has_model(),
            ledger = ledger.is_some(),
            "pipeline ready"
        );

        Ok(Self {
            competitors,
            orchestrator,
            engine,
            ledger,
            run_timeout: config.run_timeout(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct PipelineOutcome {
    pub(crate) date: NaiveDate,
    pub(crate) record_id: i64,
    pub(crate) record: InsightRecord,
    pub(crate) report: String,
    pub(crate) observation_count: usize,
    pub(crate) failure_count: usize,
    pub(crate) cancelled: bool,
}

/// Runs one pass and returns its outcome. The rendered report is also logged.
///
/// Cancelling `cancel`, or reaching `deps.run_timeout`, stops collection
/// between competitors. Analysis then runs on whatever was collected.
///
/// # Errors
///
/// Returns an error if the roster is rejected by the collector or the
/// insight cannot be persisted.
pub(crate) async fn run_pipeline(
    deps: &PipelineDeps,
    store: &dyn InsightStore,
    trigger: Trigger,
    cancel: &CancellationToken,
) -> anyhow::Result<PipelineOutcome> {
    let date = Utc::now().date_naive();
    let run_id = ledger_start(deps.ledger.as_ref(), trigger).await;

    tracing::info!(%date, trigger = trigger.as_str(), "pipeline run started");

    let run_token = cancel.child_token();
    let timer = spawn_run_timer(run_token.clone(), deps.run_timeout);
    let collected = deps
        .orchestrator
        .collect(&deps.competitors, &run_token)
        .await;
    timer.abort();

    let collection = match collected {
        Ok(collection) => collection,
        Err(e) => {
            ledger_fail(deps.ledger.as_ref(), run_id, &e.to_string()).await;
            return Err(e.into());
        }
    };
    ledger_record_outcomes(deps.ledger.as_ref(), run_id, &collection).await;

    let record = deps
        .engine
        .analyze(&deps.competitors, &collection.observations)
        .await;

    let record_id = match store.upsert(date, &record).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "failed to persist insight");
            ledger_fail(deps.ledger.as_ref(), run_id, &e.to_string()).await;
            return Err(e.into());
        }
    };

    let observation_count = collection.observations.len();
    ledger_complete(deps.ledger.as_ref(), run_id, observation_count).await;

    let report = render_report(&record, date);
    tracing::info!(
        record_id,
        observations = observation_count,
        failures = collection.failures.len(),
        provenance = record.source.as_str(),
        "pipeline run complete\n{report}"
    );

    Ok(PipelineOutcome {
        date,
        record_id,
        record,
        report,
        observation_count,
        failure_count: collection.failures.len(),
        cancelled: collection.cancelled,
    })
}

fn spawn_run_timer(token: CancellationToken, timeout: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "run timeout reached, cancelling collection");
                token.cancel();
            }
        }
    })
}

async fn ledger_start(pool: Option<&PgPool>, trigger: Trigger) -> Option<i64> {
    let pool = pool?;
    let run = match trendsage_db::create_collection_run(pool, RUN_TYPE, trigger.as_str()).await {
        Ok(run) => run,
        Err(e) => {
            tracing::warn!(error = %e, "failed to create collection run; continuing without ledger");
            return None;
        }
    };
    if let Err(e) = trendsage_db::start_collection_run(pool, run.id).await {
        tracing::warn!(run_id = run.id, error = %e, "failed to start collection run");
        return None;
    }
    Some(run.id)
}

async fn ledger_record_outcomes(
    pool: Option<&PgPool>,
    run_id: Option<i64>,
    collection: &CollectionReport,
) {
    let (Some(pool), Some(run_id)) = (pool, run_id) else {
        return;
    };
    for outcome in &collection.outcomes {
        if let Err(e) = trendsage_db::record_source_outcome(
            pool,
            run_id,
            &outcome.competitor,
            outcome.source.as_str(),
            outcome.status.as_str(),
            outcome.detail.as_deref(),
        )
        .await
        {
            tracing::warn!(
                run_id,
                competitor = %outcome.competitor,
                source = %outcome.source,
                error = %e,
                "failed to record source outcome"
            );
        }
    }
}

async fn ledger_complete(pool: Option<&PgPool>, run_id: Option<i64>, observations: usize) {
    let (Some(pool), Some(run_id)) = (pool, run_id) else {
        return;
    };
    let processed = i32::try_from(observations).unwrap_or(i32::MAX);
    if let Err(e) = trendsage_db::complete_collection_run(pool, run_id, processed).await {
        tracing::warn!(run_id, error = %e, "failed to complete collection run");
    }
}

async fn ledger_fail(pool: Option<&PgPool>, run_id: Option<i64>, message: &str) {
    let (Some(pool), Some(run_id)) = (pool, run_id) else {
        return;
    };
    if let Err(e) = trendsage_db::fail_collection_run(pool, run_id, message).await {
        tracing::warn!(run_id, error = %e, "failed to mark collection run as failed");
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
