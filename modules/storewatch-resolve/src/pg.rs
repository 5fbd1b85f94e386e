use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use storewatch_common::{ClosureResult, VerdictRow};

use crate::sink::{ResultSink, UpsertOutcome};

/// Postgres-backed verdict store, one row per `place_id`.
#[derive(Clone)]
pub struct PgResultSink {
    pool: PgPool,
}

impl PgResultSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(PgPool::connect(url).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the verdict table if it does not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS store_closure_results (
                place_id      TEXT             PRIMARY KEY,
                name          TEXT             NOT NULL,
                address       TEXT             NOT NULL,
                district      TEXT             NOT NULL,
                latitude      DOUBLE PRECISION,
                longitude     DOUBLE PRECISION,
                status        TEXT             NOT NULL,
                match_reason  TEXT             NOT NULL,
                created_at    TIMESTAMPTZ      NOT NULL DEFAULT now(),
                updated_at    TIMESTAMPTZ      NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS store_closure_results_district_idx
             ON store_closure_results (district)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Outbound rows for one district, ordered by id.
    pub async fn rows_for_district(&self, district: &str) -> Result<Vec<VerdictRow>> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<f64>, Option<f64>, String, String)>(
            "SELECT place_id, name, address, latitude, longitude, status, match_reason
             FROM store_closure_results
             WHERE district = $1
             ORDER BY place_id",
        )
        .bind(district)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, name, address, latitude, longitude, status, match_reason)| VerdictRow {
                    id,
                    name,
                    address,
                    latitude,
                    longitude,
                    status,
                    match_reason,
                },
            )
            .collect())
    }
}

#[async_trait]
impl ResultSink for PgResultSink {
    async fn upsert(&self, result: &ClosureResult) -> Result<UpsertOutcome> {
        let row = result.to_row();
        // xmax is zero only for a freshly inserted tuple.
        let (inserted,): (bool,) = sqlx::query_as(
            "INSERT INTO store_closure_results
                (place_id, name, address, district, latitude, longitude, status, match_reason)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (place_id)
             DO UPDATE SET name = EXCLUDED.name,
                           address = EXCLUDED.address,
                           district = EXCLUDED.district,
                           latitude = EXCLUDED.latitude,
                           longitude = EXCLUDED.longitude,
                           status = EXCLUDED.status,
                           match_reason = EXCLUDED.match_reason,
                           updated_at = now()
             RETURNING (xmax = 0)",
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.address)
        .bind(&result.district)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(&row.status)
        .bind(&row.match_reason)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn clear_district(&self, district: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM store_closure_results WHERE district = $1")
            .bind(district)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
