use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::domain::models::CreditRecord;

pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one credit row. No upsert; rows are never updated.
    pub async fn insert(&self, record: &CreditRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO filmography (entity_id, title, title_url, start_year, end_year, \
             episode_count, credit_type, role, production_stage, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.entity_id)
        .bind(&record.title)
        .bind(&record.title_url)
        .bind(&record.start_year)
        .bind(&record.end_year)
        .bind(record.episode_count)
        .bind(&record.credit_type)
        .bind(&record.role)
        .bind(&record.production_stage)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| {
            format!(
                "Failed to insert credit {:?} for entity {}",
                record.title, record.entity_id
            )
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Credits for one entity, in insertion order.
    pub async fn get_by_entity(&self, entity_id: i64) -> Result<Vec<CreditRecord>> {
        sqlx::query_as::<_, CreditRecord>(
            "SELECT entity_id, title, title_url, start_year, end_year, episode_count, \
             credit_type, role, production_stage \
             FROM filmography WHERE entity_id = ? ORDER BY id",
        )
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch credits")
    }

    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM filmography")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count credits")
    }
}
