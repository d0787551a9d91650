//! The run ledger: `collection_runs` and per-pair `collection_run_sources`.
//!
//! Lifecycle: `queued` → `running` → `succeeded` | `failed`. Each transition
//! is guarded on the expected prior status.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, run_type, trigger_source, status, \
                           started_at, completed_at, records_processed, error_message, created_at";

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub run_type: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Observations collected by the run.
    pub records_processed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One (competitor, source) outcome recorded against a run.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunSourceRow {
    pub id: i64,
    pub collection_run_id: i64,
    pub competitor: String,
    pub source: String,
    pub status: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates a new run in `queued` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a
/// `trigger_source` other than `cli` or `scheduler`.
pub async fn create_collection_run(
    pool: &PgPool,
    run_type: &str,
    trigger_source: &str,
) -> Result<CollectionRunRow, DbError> {
    let sql = format!(
        "INSERT INTO collection_runs (public_id, run_type, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {RUN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CollectionRunRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(run_type)
        .bind(trigger_source)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

fn guard_transition(rows_affected: u64, id: i64, expected_status: &'static str) -> Result<(), DbError> {
    if rows_affected == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status,
        });
    }
    Ok(())
}

/// `queued` → `running`, stamping `started_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// queued, or [`DbError::Sqlx`] if the update fails.
pub async fn start_collection_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    guard_transition(result.rows_affected(), id, "queued")
}

/// `running` → `succeeded`, recording how many observations were collected.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// running, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: i64,
    records_processed: i32,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'succeeded', completed_at = NOW(), records_processed = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(records_processed)
    .bind(id)
    .execute(pool)
    .await?;

    guard_transition(result.rows_affected(), id, "running")
}

/// `running` → `failed`, recording the error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// running, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_collection_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    guard_transition(result.rows_affected(), id, "running")
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has this `id`, or [`DbError::Sqlx`]
/// if the query fails.
pub async fn get_collection_run(pool: &PgPool, id: i64) -> Result<CollectionRunRow, DbError> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM collection_runs WHERE id = $1");
    sqlx::query_as::<_, CollectionRunRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, CollectionRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Records the outcome of one (competitor, source) pair for a run.
///
/// Re-recording the same pair overwrites `status` and `detail`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including an unknown
/// `source` or `status` value.
pub async fn record_source_outcome(
    pool: &PgPool,
    run_id: i64,
    competitor: &str,
    source: &str,
    status: &str,
    detail: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO collection_run_sources \
             (collection_run_id, competitor, source, status, detail) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (collection_run_id, competitor, source) DO UPDATE SET \
             status = EXCLUDED.status, \
             detail = EXCLUDED.detail",
    )
    .bind(run_id)
    .bind(competitor)
    .bind(source)
    .bind(status)
    .bind(detail)
    .execute(pool)
    .await?;

    Ok(())
}

/// Every recorded pair outcome for a run, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_run_sources(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<CollectionRunSourceRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunSourceRow>(
        "SELECT id, collection_run_id, competitor, source, status, detail, created_at \
         FROM collection_run_sources \
         WHERE collection_run_id = $1 \
         ORDER BY id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
