//! Daily scheduled runs.
//!
//! Registers one cron job that runs a full pipeline pass. A failed pass is
//! logged and the scheduler keeps running until Ctrl-C.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tokio_util::sync::CancellationToken;
use trendsage_db::InsightStore;

use crate::pipeline::{run_pipeline, PipelineDeps, Trigger};

/// Runs `run_pipeline` and logs the result. Never propagates an error.
async fn run_logged(deps: &PipelineDeps, store: &dyn InsightStore, cancel: &CancellationToken) {
    tracing::info!("scheduler: starting insights run");
    match run_pipeline(deps, store, Trigger::Scheduler, cancel).await {
        Ok(outcome) => tracing::info!(
            record_id = outcome.record_id,
            observations = outcome.observation_count,
            failures = outcome.failure_count,
            cancelled = outcome.cancelled,
            "scheduler: insights run complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: insights run failed"),
    }
}

async fn register_insights_job(
    scheduler: &JobScheduler,
    cron: &str,
    deps: Arc<PipelineDeps>,
    store: Arc<dyn InsightStore>,
    cancel: CancellationToken,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let deps = Arc::clone(&deps);
        let store = Arc::clone(&store);
        let cancel = cancel.clone();

        Box::pin(async move {
            run_logged(&deps, store.as_ref(), &cancel).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered insights job");
    Ok(())
}

/// Blocks until Ctrl-C, running a pass on every tick of `cron`.
///
/// With `run_now`, one pass runs before the scheduler starts.
///
/// # Errors
///
/// Returns an error if the cron expression is invalid, the scheduler cannot
/// start, or the Ctrl-C handler cannot be installed.
pub(crate) async fn run_scheduler(
    deps: PipelineDeps,
    store: Arc<dyn InsightStore>,
    cron: &str,
    run_now: bool,
) -> anyhow::Result<()> {
    let deps = Arc::new(deps);
    let cancel = CancellationToken::new();

    if run_now {
        run_logged(&deps, store.as_ref(), &cancel).await;
    }

    let mut scheduler = JobScheduler::new().await?;
    register_insights_job(
        &scheduler,
        cron,
        Arc::clone(&deps),
        Arc::clone(&store),
        cancel.clone(),
    )
    .await?;
    scheduler.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("received shutdown signal, stopping scheduler");
    cancel.cancel();
    scheduler.shutdown().await?;
    Ok(())
}
