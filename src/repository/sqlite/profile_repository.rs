//! Read side: which profiles still need syncing.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::domain::models::WorkItem;

pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every person without a single filmography row, ordered by id.
    ///
    /// Presence of any output row marks an entity done, so a profile that
    /// failed mid-insert on an earlier run is not revisited.
    pub async fn get_pending(&self) -> Result<Vec<WorkItem>> {
        let items = sqlx::query_as::<_, WorkItem>(
            r#"
            SELECT id, profile_url
            FROM people
            WHERE id NOT IN (SELECT DISTINCT entity_id FROM filmography)
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load pending profiles")?;

        log::debug!("[DB] {} pending profiles", items.len());
        Ok(items)
    }
}
