//! Offline tests for trendsage-db: pool configuration and the non-Postgres
//! insight stores. These tests do not require a live database connection.

use std::collections::{BTreeMap, BTreeSet};
use std::env::VarError;

use chrono::{Datelike, NaiveDate, Utc};
use trendsage_core::{
    build_app_config, CompetitorInsight, InsightProvenance, InsightRecord, Trend,
};
use trendsage_db::{InsightStore, JsonFileInsightStore, MemoryInsightStore, PoolConfig};

fn record(sentiment: f64) -> InsightRecord {
    InsightRecord {
        overall_sentiment: sentiment,
        key_insights: vec!["Cloud revenue up".to_string()],
        competitor_analysis: BTreeMap::from([(
            "Microsoft".to_string(),
            CompetitorInsight {
                sentiment: 0.6,
                trend: Trend::Growing,
            },
        )]),
        recommendations: vec![],
        data_sources_used: BTreeSet::from(["stock".to_string()]),
        generated_at: Utc::now(),
        source: InsightProvenance::Model,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = build_app_config(|key| match key {
        "TRENDSAGE_DB_MAX_CONNECTIONS" => Ok("42".to_string()),
        "TRENDSAGE_DB_MIN_CONNECTIONS" => Ok("7".to_string()),
        "TRENDSAGE_DB_ACQUIRE_TIMEOUT_SECS" => Ok("9".to_string()),
        _ => Err(VarError::NotPresent),
    })
    .expect("config should build");

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn file_store_round_trips_and_uses_dated_filename() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileInsightStore::new(dir.path());

    let id = store.upsert(date(), &record(0.4)).await.unwrap();
    assert_eq!(id, i64::from(date().num_days_from_ce()));

    let path = dir.path().join("market_insights_2026-03-02.json");
    assert!(path.exists());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    for key in ["timestamp", "analysis", "pipeline_version", "data_collection_time"] {
        assert!(raw.get(key).is_some(), "missing {key}");
    }
    assert_eq!(raw["analysis"]["source"], "model");

    let loaded = store.get_by_date(date()).await.unwrap().unwrap();
    assert!((loaded.overall_sentiment - 0.4).abs() < 1e-9);
    assert_eq!(loaded.competitor_analysis["Microsoft"].trend, Trend::Growing);
}

#[tokio::test]
async fn file_store_double_upsert_keeps_one_file_with_second_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileInsightStore::new(dir.path());

    let first = store.upsert(date(), &record(0.1)).await.unwrap();
    let second = store.upsert(date(), &record(-0.5)).await.unwrap();
    assert_eq!(first, second, "id is stable per date");

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(files.len(), 1, "unexpected files: {files:?}");

    let loaded = store.get_by_date(date()).await.unwrap().unwrap();
    assert!((loaded.overall_sentiment + 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn file_store_missing_date_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileInsightStore::new(dir.path().join("not-created-yet"));
    assert!(store.get_by_date(date()).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_store_counts_writes() {
    let store = MemoryInsightStore::new();
    store.upsert(date(), &record(0.1)).await.unwrap();
    store.upsert(date(), &record(0.2)).await.unwrap();

    assert_eq!(store.write_count().await, 2);
    assert_eq!(store.record_count().await, 1);
    let loaded = store.get_by_date(date()).await.unwrap().unwrap();
    assert!((loaded.overall_sentiment - 0.2).abs() < 1e-9);
}
