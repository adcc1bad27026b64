// Table definitions for hourly statistics. Row-level access lives in statistics_repo::mod.

use sqlx::SqlitePool;

/// Creates statistics_meta and statistics if not present.
pub(super) async fn init_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statistics_meta (
            statistic_id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            name TEXT,
            unit TEXT NOT NULL,
            has_mean INTEGER NOT NULL,
            has_sum INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // start_ts is the bucket start in unix seconds; the source offset is kept for display.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statistics (
            statistic_id TEXT NOT NULL,
            start_ts INTEGER NOT NULL,
            start_offset_secs INTEGER NOT NULL,
            state REAL NOT NULL,
            mean REAL NOT NULL,
            sum REAL,
            PRIMARY KEY (statistic_id, start_ts)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
