mod pipeline;
mod scheduler;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use trendsage_core::AppConfig;
use trendsage_db::{InsightStore, JsonFileInsightStore, MemoryInsightStore, PgInsightStore};

use crate::pipeline::{run_pipeline, PipelineDeps, Trigger};

#[derive(Debug, Parser)]
#[command(name = "trendsage")]
#[command(about = "Daily competitor market insights")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect, analyze, persist and print today's report (the default)
    Run {
        /// Collect and analyze without persisting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the pipeline daily on the configured cron schedule
    Schedule {
        /// Run one pass immediately before waiting for the first tick
        #[arg(long)]
        run_now: bool,
    },
    /// Print the stored report for a date
    Report {
        /// Date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Print the competitor roster
    Competitors,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check the database connection
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = trendsage_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        None => run_once(&config, false).await,
        Some(Commands::Run { dry_run }) => run_once(&config, dry_run).await,
        Some(Commands::Schedule { run_now }) => {
            let (store, ledger) = open_store(&config).await?;
            let deps = PipelineDeps::from_config(&config, ledger)?;
            scheduler::run_scheduler(deps, store, &config.schedule_cron, run_now).await
        }
        Some(Commands::Report { date }) => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let (store, _) = open_store(&config).await?;
            let record = store
                .get_by_date(date)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no insight stored for {date}"))?;
            println!("{}", trendsage_insight::render_report(&record, date));
            Ok(())
        }
        Some(Commands::Db { command }) => run_db_command(&config, command).await,
        Some(Commands::Competitors) => {
            let roster = trendsage_core::load_roster(&config.competitors_path)?;
            for competitor in &roster {
                println!(
                    "{:<12} @{:<12} {:<6} {}",
                    competitor.name,
                    competitor.handle,
                    competitor.symbol,
                    competitor.website.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}

async fn run_once(config: &AppConfig, dry_run: bool) -> anyhow::Result<()> {
    let (store, ledger) = if dry_run {
        tracing::info!("dry-run: results will not be persisted");
        let store: Arc<dyn InsightStore> = Arc::new(MemoryInsightStore::new());
        (store, None)
    } else {
        open_store(config).await?
    };
    let deps = PipelineDeps::from_config(config, ledger)?;

    let outcome =
        run_pipeline(&deps, store.as_ref(), Trigger::Cli, &CancellationToken::new()).await?;
    println!("{}", outcome.report);
    tracing::info!(
        date = %outcome.date,
        record_id = outcome.record_id,
        provenance = outcome.record.source.as_str(),
        dry_run,
        "insight stored"
    );
    if outcome.cancelled {
        tracing::warn!("collection was cut short; report reflects partial data");
    }
    Ok(())
}

/// Postgres when `DATABASE_URL` is set (migrated on open), otherwise one JSON
/// file per day under the output directory. The pool is returned for the
/// run ledger.
async fn open_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn InsightStore>, Option<PgPool>)> {
    if config.database_url.is_none() {
        tracing::info!(dir = %config.output_dir.display(), "DATABASE_URL not set, using file store");
        let store: Arc<dyn InsightStore> =
            Arc::new(JsonFileInsightStore::new(config.output_dir.clone()));
        return Ok((store, None));
    }

    let pool = trendsage_db::connect_pool_from_config(config).await?;
    let applied = trendsage_db::run_migrations(&pool).await?;
    tracing::debug!(applied, "migrations checked");
    let store: Arc<dyn InsightStore> = Arc::new(PgInsightStore::new(pool.clone()));
    Ok((store, Some(pool)))
}

async fn run_db_command(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = trendsage_db::connect_pool_from_config(config).await?;
    match command {
        DbCommands::Ping => {
            trendsage_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = trendsage_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}
