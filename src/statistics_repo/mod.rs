// SQLite statistics store. Imports are upserts keyed by (statistic_id, start), so
// re-importing the same hours on every cycle is harmless.

mod schema;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

use crate::models::{StatisticMetadata, StatisticRecord};

/// Destination for hourly statistics. One call per subscription per cycle.
#[async_trait]
pub trait StatisticsSink: Send + Sync {
    async fn import_statistics(
        &self,
        metadata: &StatisticMetadata,
        records: &[StatisticRecord],
    ) -> anyhow::Result<()>;
}

pub struct StatisticsRepo {
    pool: SqlitePool,
}

impl StatisticsRepo {
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        schema::init_tables(&self.pool).await
    }

    #[instrument(skip(self), fields(repo = "statistics", operation = "get_metadata"))]
    pub async fn get_metadata(
        &self,
        statistic_id: &str,
    ) -> anyhow::Result<Option<StatisticMetadata>> {
        let row = sqlx::query(
            "SELECT statistic_id, source, name, unit, has_mean, has_sum FROM statistics_meta WHERE statistic_id = $1",
        )
        .bind(statistic_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(StatisticMetadata {
            has_mean: row.try_get("has_mean")?,
            has_sum: row.try_get("has_sum")?,
            name: row.try_get("name")?,
            source: row.try_get("source")?,
            statistic_id: row.try_get("statistic_id")?,
            unit: row.try_get("unit")?,
        }))
    }

    /// Most recent `limit` rows for `statistic_id`. Order: ascending by start.
    #[instrument(skip(self), fields(repo = "statistics", operation = "get_statistics"))]
    pub async fn get_statistics(
        &self,
        statistic_id: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<StatisticRecord>> {
        let rows = sqlx::query(
            "SELECT start_ts, start_offset_secs, state, mean, sum
             FROM statistics WHERE statistic_id = $1 ORDER BY start_ts DESC LIMIT $2",
        )
        .bind(statistic_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_statistic_row(&row)?);
        }
        out.reverse();
        Ok(out)
    }

    fn parse_statistic_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<StatisticRecord> {
        let start_ts: i64 = row.try_get("start_ts")?;
        let offset_secs: i32 = row.try_get("start_offset_secs")?;
        let offset = FixedOffset::east_opt(offset_secs)
            .ok_or_else(|| anyhow::anyhow!("invalid stored offset {}", offset_secs))?;
        let start = DateTime::from_timestamp(start_ts, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid stored start {}", start_ts))?
            .with_timezone(&offset);
        Ok(StatisticRecord {
            start,
            state: row.try_get("state")?,
            mean: row.try_get("mean")?,
            sum: row.try_get("sum")?,
        })
    }
}

#[async_trait]
impl StatisticsSink for StatisticsRepo {
    #[instrument(
        skip(self, metadata, records),
        fields(repo = "statistics", operation = "import_statistics", statistic_id = %metadata.statistic_id, records_count = records.len())
    )]
    async fn import_statistics(
        &self,
        metadata: &StatisticMetadata,
        records: &[StatisticRecord],
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO statistics_meta (statistic_id, source, name, unit, has_mean, has_sum)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(statistic_id) DO UPDATE SET
                source = excluded.source,
                name = excluded.name,
                unit = excluded.unit,
                has_mean = excluded.has_mean,
                has_sum = excluded.has_sum
            "#,
        )
        .bind(&metadata.statistic_id)
        .bind(&metadata.source)
        .bind(&metadata.name)
        .bind(&metadata.unit)
        .bind(metadata.has_mean)
        .bind(metadata.has_sum)
        .execute(&mut *tx)
        .await?;

        for r in records {
            sqlx::query(
                r#"
                INSERT INTO statistics (statistic_id, start_ts, start_offset_secs, state, mean, sum)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT(statistic_id, start_ts) DO UPDATE SET
                    start_offset_secs = excluded.start_offset_secs,
                    state = excluded.state,
                    mean = excluded.mean,
                    sum = excluded.sum
                "#,
            )
            .bind(&metadata.statistic_id)
            .bind(r.start.timestamp())
            .bind(r.start.offset().local_minus_utc())
            .bind(r.state)
            .bind(r.mean)
            .bind(r.sum)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
