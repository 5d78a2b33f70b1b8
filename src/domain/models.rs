use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ====== Source side ======

/// One pending synchronization unit, read once per run from `people`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct WorkItem {
    #[sqlx(rename = "id")]
    pub entity_id: i64,
    #[sqlx(rename = "profile_url")]
    pub source_url: Option<String>,
}

impl WorkItem {
    pub fn new(entity_id: i64, source_url: Option<&str>) -> Self {
        Self {
            entity_id,
            source_url: source_url.map(str::to_string),
        }
    }
}

// ====== Extraction side ======

/// One credit as it comes out of the payload normalizer, before it is
/// tied to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCredit {
    pub title: String,
    pub title_url: String,
    pub start_year: String,
    /// `None` for single-year or ongoing entries, never `Some("")`.
    pub end_year: Option<String>,
    pub episode_count: u32,
    pub credit_type: String,
    pub role: String,
    pub production_stage: String,
}

impl ExtractedCredit {
    pub fn into_record(self, entity_id: i64) -> CreditRecord {
        CreditRecord {
            entity_id,
            title: self.title,
            title_url: self.title_url,
            start_year: self.start_year,
            end_year: self.end_year,
            episode_count: self.episode_count,
            credit_type: self.credit_type,
            role: self.role,
            production_stage: self.production_stage,
        }
    }
}

// ====== Output side ======

/// One row of the `filmography` table. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CreditRecord {
    pub entity_id: i64,
    pub title: String,
    pub title_url: String,
    pub start_year: String,
    pub end_year: Option<String>,
    pub episode_count: u32,
    pub credit_type: String,
    pub role: String,
    pub production_stage: String,
}

// ====== Run accounting ======

/// How a single work item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Synced { records: usize },
    /// Dry run: normalized but not written.
    Previewed { records: usize },
    Skipped,
    Failed { message: String },
}

/// Totals for one run of the sync driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub pending: usize,
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
    pub records_written: usize,
    /// Records a dry run would have written.
    pub records_previewed: usize,
}

impl SyncReport {
    pub fn new(run_id: Uuid, pending: usize) -> Self {
        Self {
            run_id,
            pending,
            synced: 0,
            skipped: 0,
            failed: 0,
            records_written: 0,
            records_previewed: 0,
        }
    }

    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Synced { records } => {
                self.synced += 1;
                self.records_written += records;
            }
            ItemOutcome::Previewed { records } => {
                self.synced += 1;
                self.records_previewed += records;
            }
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}
