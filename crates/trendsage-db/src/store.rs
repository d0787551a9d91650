//! Day-keyed persistence of [`InsightRecord`]s.
//!
//! Three backends: Postgres (`daily_insights`), one JSON file per day when no
//! database is configured, and an in-memory map for tests and dry runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::Mutex;
use trendsage_core::InsightRecord;

use crate::insights::{get_daily_insight_by_date, upsert_daily_insight};
use crate::DbError;

const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[async_trait]
pub trait InsightStore: Send + Sync {
    /// Writes the record for `date`, replacing any earlier one.
    /// The returned id is stable across writes for the same date.
    async fn upsert(&self, date: NaiveDate, record: &InsightRecord) -> Result<i64, DbError>;

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<InsightRecord>, DbError>;
}

pub struct PgInsightStore {
    pool: PgPool,
}

impl PgInsightStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InsightStore for PgInsightStore {
    async fn upsert(&self, date: NaiveDate, record: &InsightRecord) -> Result<i64, DbError> {
        upsert_daily_insight(&self.pool, date, record).await
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<InsightRecord>, DbError> {
        get_daily_insight_by_date(&self.pool, date)
            .await?
            .map(crate::insights::DailyInsightRow::into_record)
            .transpose()
    }
}

/// On-disk layout of `market_insights_{date}.json`.
#[derive(Debug, Serialize, Deserialize)]
struct InsightFile {
    timestamp: DateTime<Utc>,
    analysis: InsightRecord,
    pipeline_version: String,
    data_collection_time: DateTime<Utc>,
}

/// Writes `{dir}/market_insights_{YYYY-MM-DD}.json`, one file per date.
pub struct JsonFileInsightStore {
    dir: PathBuf,
}

impl JsonFileInsightStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("market_insights_{}.json", date.format("%Y-%m-%d")))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DbError {
    DbError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl InsightStore for JsonFileInsightStore {
    async fn upsert(&self, date: NaiveDate, record: &InsightRecord) -> Result<i64, DbError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let envelope = InsightFile {
            timestamp: Utc::now(),
            analysis: record.clone(),
            pipeline_version: PIPELINE_VERSION.to_string(),
            data_collection_time: record.generated_at,
        };
        let body = serde_json::to_vec_pretty(&envelope)?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let path = self.path_for(date);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        tracing::info!(path = %path.display(), "insight file written");
        Ok(i64::from(date.num_days_from_ce()))
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<InsightRecord>, DbError> {
        let path = self.path_for(date);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        let envelope: InsightFile = serde_json::from_slice(&bytes)?;
        Ok(Some(envelope.analysis))
    }
}

/// Map-backed store. Ids follow the same day-number scheme as the file store.
#[derive(Default)]
pub struct MemoryInsightStore {
    records: Mutex<BTreeMap<NaiveDate, InsightRecord>>,
    writes: Mutex<usize>,
}

impl MemoryInsightStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total `upsert` calls so far, including overwrites.
    pub async fn write_count(&self) -> usize {
        *self.writes.lock().await
    }

    pub async fn record_count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl InsightStore for MemoryInsightStore {
    async fn upsert(&self, date: NaiveDate, record: &InsightRecord) -> Result<i64, DbError> {
        self.records.lock().await.insert(date, record.clone());
        *self.writes.lock().await += 1;
        Ok(i64::from(date.num_days_from_ce()))
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<InsightRecord>, DbError> {
        Ok(self.records.lock().await.get(&date).cloned())
    }
}
