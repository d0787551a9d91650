//! Database operations for the `daily_insights` table.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use trendsage_core::{InsightProvenance, InsightRecord};

use crate::DbError;

const INSIGHT_COLUMNS: &str = "id, insight_date, overall_sentiment, key_insights, \
                               competitor_analysis, recommendations, data_sources_used, \
                               provenance, generated_at, created_at, updated_at";

/// A row from the `daily_insights` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyInsightRow {
    pub id: i64,
    pub insight_date: NaiveDate,
    /// `NUMERIC(6,3)`, constrained to `[-1, 1]` by the schema.
    pub overall_sentiment: Decimal,
    pub key_insights: Value,
    pub competitor_analysis: Value,
    pub recommendations: Value,
    pub data_sources_used: Value,
    pub provenance: String,
    pub generated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyInsightRow {
    /// # Errors
    ///
    /// Returns [`DbError::Json`] if a JSONB column does not match the record
    /// shape, or [`DbError::InvalidRow`] for an unknown provenance.
    pub fn into_record(self) -> Result<InsightRecord, DbError> {
        let overall_sentiment = self.overall_sentiment.to_f64().ok_or_else(|| {
            DbError::InvalidRow(format!("sentiment {} is not representable", self.overall_sentiment))
        })?;
        let source = self
            .provenance
            .parse::<InsightProvenance>()
            .map_err(DbError::InvalidRow)?;

        Ok(InsightRecord {
            overall_sentiment,
            key_insights: serde_json::from_value(self.key_insights)?,
            competitor_analysis: serde_json::from_value(self.competitor_analysis)?,
            recommendations: serde_json::from_value(self.recommendations)?,
            data_sources_used: serde_json::from_value(self.data_sources_used)?,
            generated_at: self.generated_at,
            source,
        })
    }
}

fn sentiment_decimal(value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(3))
        .ok_or_else(|| DbError::InvalidRow(format!("sentiment {value} cannot be stored")))
}

/// Insert or replace the record for `date` and return the row id.
///
/// A second write on the same date updates the row in place and bumps
/// `updated_at`; the id stays the same.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, or [`DbError::Json`] if the
/// record cannot be encoded.
pub async fn upsert_daily_insight(
    pool: &PgPool,
    date: NaiveDate,
    record: &InsightRecord,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO daily_insights \
             (insight_date, overall_sentiment, key_insights, competitor_analysis, \
              recommendations, data_sources_used, provenance, generated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (insight_date) DO UPDATE SET \
             overall_sentiment   = EXCLUDED.overall_sentiment, \
             key_insights        = EXCLUDED.key_insights, \
             competitor_analysis = EXCLUDED.competitor_analysis, \
             recommendations     = EXCLUDED.recommendations, \
             data_sources_used   = EXCLUDED.data_sources_used, \
             provenance          = EXCLUDED.provenance, \
             generated_at        = EXCLUDED.generated_at, \
             updated_at          = NOW() \
         RETURNING id",
    )
    .bind(date)
    .bind(sentiment_decimal(record.overall_sentiment)?)
    .bind(serde_json::to_value(&record.key_insights)?)
    .bind(serde_json::to_value(&record.competitor_analysis)?)
    .bind(serde_json::to_value(&record.recommendations)?)
    .bind(serde_json::to_value(&record.data_sources_used)?)
    .bind(record.source.as_str())
    .bind(record.generated_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_daily_insight_by_date(
    pool: &PgPool,
    date: NaiveDate,
) -> Result<Option<DailyInsightRow>, DbError> {
    let sql = format!("SELECT {INSIGHT_COLUMNS} FROM daily_insights WHERE insight_date = $1");
    let row = sqlx::query_as::<_, DailyInsightRow>(&sql)
        .bind(date)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Most recent `limit` days, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_daily_insights(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<DailyInsightRow>, DbError> {
    let sql = format!(
        "SELECT {INSIGHT_COLUMNS} FROM daily_insights \
         ORDER BY insight_date DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, DailyInsightRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use trendsage_core::{CompetitorInsight, Trend};

    fn row() -> DailyInsightRow {
        DailyInsightRow {
            id: 7,
            insight_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            overall_sentiment: Decimal::new(425, 3),
            key_insights: serde_json::json!(["a", "b"]),
            competitor_analysis: serde_json::json!({
                "Apple": { "sentiment": 0.8, "trend": "positive" }
            }),
            recommendations: serde_json::json!([]),
            data_sources_used: serde_json::json!(["stock"]),
            provenance: "model".to_string(),
            generated_at: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = row().into_record().unwrap();
        assert!((record.overall_sentiment - 0.425).abs() < 1e-9);
        assert_eq!(record.key_insights, ["a", "b"]);
        assert_eq!(
            record.competitor_analysis,
            BTreeMap::from([(
                "Apple".to_string(),
                CompetitorInsight {
                    sentiment: 0.8,
                    trend: Trend::Positive
                }
            )])
        );
        assert_eq!(record.data_sources_used, BTreeSet::from(["stock".to_string()]));
        assert_eq!(record.source, InsightProvenance::Model);
    }

    #[test]
    fn unknown_provenance_is_invalid_row() {
        let mut bad = row();
        bad.provenance = "ai".to_string();
        assert!(matches!(bad.into_record(), Err(DbError::InvalidRow(_))));
    }

    #[test]
    fn mistyped_jsonb_is_json_error() {
        let mut bad = row();
        bad.key_insights = serde_json::json!({"not": "a list"});
        assert!(matches!(bad.into_record(), Err(DbError::Json(_))));
    }

    #[test]
    fn sentiment_is_rounded_to_three_places() {
        assert_eq!(sentiment_decimal(0.123_456).unwrap(), Decimal::new(123, 3));
        assert_eq!(sentiment_decimal(-1.0).unwrap(), Decimal::new(-1000, 3));
        assert!(sentiment_decimal(f64::NAN).is_err());
    }
}
