use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::config::SyncConfig;

/// Configure SQLite pragmas for every new connection.
async fn configure_sqlite_pragmas(conn: &mut sqlx::SqliteConnection) -> Result<(), sqlx::Error> {
    use sqlx::Executor;

    // WAL mode: readers of the source table are not blocked by our inserts
    conn.execute("PRAGMA journal_mode = WAL").await?;

    conn.execute("PRAGMA synchronous = NORMAL").await?;

    // 5 second timeout for busy connections (prevents "database locked" errors)
    conn.execute("PRAGMA busy_timeout = 5000").await?;

    conn.execute("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

/// Open the single storage connection a run works through.
///
/// The pool is capped at one connection; callers release it with
/// [`close`] once the run is over.
pub async fn connect(config: &SyncConfig) -> Result<SqlitePool> {
    log::info!("[DB] Connecting to {}", config.database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                configure_sqlite_pragmas(conn).await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))?;

    if config.skip_migrations {
        log::info!("[DB] Skipping embedded migrations");
    } else {
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("failed to run migrations")?;
    }

    log::info!("[DB] Database ready");
    Ok(pool)
}

/// Release the storage connection. Safe to call on every exit path.
pub async fn close(pool: SqlitePool) {
    pool.close().await;
    log::debug!("[DB] Connection released");
}
