//! Incremental sync orchestration.
//!
//! One run loads the pending set once, then walks it strictly in order. Each
//! work item is fetched, normalized and persisted before the next begins, and
//! any failure inside that sequence ends only that item.

use sqlx::SqlitePool;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::domain::models::{ItemOutcome, SyncReport, WorkItem};
use crate::error::{Result, SyncError, SyncStage};
use crate::extractor::{CreditsExtractor, IdentifierExtractor};
use crate::repository::sqlite::{CreditRepository, ProfileRepository};
use crate::service::http::ProfileFetcher;

pub struct SyncProcessor<'c> {
    config: &'c SyncConfig,
    profiles: ProfileRepository,
    credits: CreditRepository,
    fetcher: ProfileFetcher,
}

impl<'c> SyncProcessor<'c> {
    pub fn new(pool: SqlitePool, config: &'c SyncConfig) -> Result<Self> {
        Ok(Self {
            config,
            profiles: ProfileRepository::new(pool.clone()),
            credits: CreditRepository::new(pool),
            fetcher: ProfileFetcher::new(config)?,
        })
    }

    /// Process the whole pending set.
    ///
    /// Only a failure to load the pending set is returned as an error; every
    /// per-item failure is logged and counted in the report.
    pub async fn run(&self) -> Result<SyncReport> {
        let timer = Instant::now();
        let run_id = Uuid::new_v4();

        let mut pending = self
            .profiles
            .get_pending()
            .await
            .map_err(|e| SyncError::fatal(format!("could not load pending set: {:#}", e)))?;

        if let Some(limit) = self.config.limit {
            pending.truncate(limit);
        }

        log::info!(
            "[SYNC] Run {} starting with {} pending profiles{}",
            run_id,
            pending.len(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        let mut report = SyncReport::new(run_id, pending.len());

        for (idx, item) in pending.iter().enumerate() {
            let outcome = self.process_item(item).await;
            report.record(&outcome);

            if pause_after(&outcome, idx, pending.len(), self.config.delay_ms) {
                tokio::time::sleep(self.config.delay()).await;
            }
        }

        let written = if self.config.dry_run {
            format!("{} records previewed", report.records_previewed)
        } else {
            format!("{} records written", report.records_written)
        };
        log::info!(
            "[SYNC] Run {} finished in {}ms: {} synced, {} skipped, {} failed, {}",
            run_id,
            timer.elapsed().as_millis(),
            report.synced,
            report.skipped,
            report.failed,
            written
        );

        Ok(report)
    }

    /// Run one item to a terminal state. Never returns an error.
    pub async fn process_item(&self, item: &WorkItem) -> ItemOutcome {
        let span = tracing::info_span!("item", entity_id = item.entity_id);
        match self.sync_item(item).instrument(span).await {
            Ok(outcome) => outcome,
            Err(e @ SyncError::IdentifierAbsent(_)) => {
                log::warn!("[SYNC] Entity {} {}: {}", item.entity_id, SyncStage::Skipped, e);
                ItemOutcome::Skipped
            }
            Err(e) => {
                log::error!(
                    "[SYNC] Entity {} {} after {}: {}",
                    item.entity_id,
                    SyncStage::Failed,
                    e.stage(),
                    e
                );
                ItemOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn sync_item(&self, item: &WorkItem) -> Result<ItemOutcome> {
        let identifier = IdentifierExtractor::extract_opt(item.source_url.as_deref())
            .ok_or_else(|| SyncError::IdentifierAbsent(item.source_url.clone()))?;
        log::debug!(
            "[SYNC] Entity {} {} as {}",
            item.entity_id,
            SyncStage::IdentifierResolved,
            identifier
        );

        let document = self.fetcher.fetch(identifier).await?;
        log::debug!("[SYNC] Entity {} {}", item.entity_id, SyncStage::Fetched);

        let credits = CreditsExtractor::extract(&document)?;
        log::debug!(
            "[SYNC] Entity {} {} into {} credits",
            item.entity_id,
            SyncStage::Normalized,
            credits.len()
        );

        if self.config.dry_run {
            log::info!(
                "[SYNC] Entity {}: {} credits (dry run, not written)",
                item.entity_id,
                credits.len()
            );
            return Ok(ItemOutcome::Previewed {
                records: credits.len(),
            });
        }

        // One insert per record in extraction order; rows already written
        // stay if a later insert fails.
        let mut written = 0;
        for credit in credits {
            let record = credit.into_record(item.entity_id);
            self.credits
                .insert(&record)
                .await
                .map_err(|e| SyncError::persistence(item.entity_id, format!("{:#}", e)))?;
            written += 1;
        }

        log::info!(
            "[SYNC] Entity {} {} with {} credits",
            item.entity_id,
            SyncStage::Persisted,
            written
        );
        Ok(ItemOutcome::Synced { records: written })
    }
}

/// Politeness delay: only between items that actually hit the network.
fn pause_after(outcome: &ItemOutcome, idx: usize, total: usize, delay_ms: u64) -> bool {
    let fetched = !matches!(outcome, ItemOutcome::Skipped);
    fetched && idx + 1 < total && delay_ms > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{credit_count, insert_person, mocks, setup_test_db};

    fn config_for(server: &mockito::Server) -> SyncConfig {
        SyncConfig::new("sqlite::memory:").with_provider(server.url())
    }

    #[tokio::test]
    async fn test_end_to_end_single_movie() {
        let mut server = mockito::Server::new_async().await;
        let payload = mocks::credits_payload(
            vec![mocks::movie_edge("Movie A", "tt9999", 2020, "Hero")],
            None,
        );
        let _mock = server
            .mock("GET", "/name/nm0000123/")
            .with_status(200)
            .with_body(mocks::page_with_payload(&payload))
            .create_async()
            .await;

        let pool = setup_test_db().await;
        insert_person(&pool, 7, Some("https://x/name/nm0000123/")).await;

        let config = config_for(&server);
        let report = SyncProcessor::new(pool.clone(), &config)
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(report.records_written, 1);

        let stored = CreditRepository::new(pool).get_by_entity(7).await.unwrap();
        assert_eq!(stored.len(), 1);
        let row = &stored[0];
        assert_eq!(row.entity_id, 7);
        assert_eq!(row.title, "Movie A");
        assert_eq!(row.title_url, "https://www.imdb.com/title/tt9999/");
        assert_eq!(row.start_year, "2020");
        assert_eq!(row.end_year, None);
        assert_eq!(row.episode_count, 0);
        assert_eq!(row.credit_type, "Movie");
        assert_eq!(row.role, "Hero");
        assert_eq!(row.production_stage, "");
    }

    #[tokio::test]
    async fn test_missing_identifier_is_skipped_without_fetch() {
        let mut server = mockito::Server::new_async().await;
        let never = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;

        let pool = setup_test_db().await;
        insert_person(&pool, 1, None).await;
        insert_person(&pool, 2, Some("")).await;
        insert_person(&pool, 3, Some("https://www.imdb.com/title/tt1/")).await;

        let config = config_for(&server);
        let report = SyncProcessor::new(pool, &config).unwrap().run().await.unwrap();

        assert_eq!(report.skipped, 3);
        assert_eq!(report.failed, 0);
        never.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_failure_isolated_per_item() {
        let mut server = mockito::Server::new_async().await;
        let _bad = server
            .mock("GET", "/name/nm1/")
            .with_status(500)
            .create_async()
            .await;
        let payload = mocks::credits_payload(
            vec![mocks::title_edge("B1"), mocks::title_edge("B2")],
            Some(vec![]),
        );
        let _good = server
            .mock("GET", "/name/nm2/")
            .with_status(200)
            .with_body(mocks::page_with_payload(&payload))
            .create_async()
            .await;

        let pool = setup_test_db().await;
        insert_person(&pool, 1, Some("https://x/name/nm1/")).await;
        insert_person(&pool, 2, Some("https://x/name/nm2/")).await;

        let config = config_for(&server);
        let report = SyncProcessor::new(pool.clone(), &config)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.synced, 1);
        assert_eq!(credit_count(&pool, 1).await, 0);
        assert_eq!(credit_count(&pool, 2).await, 2);
    }

    #[tokio::test]
    async fn test_malformed_document_fails_item_and_stays_pending() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/name/nm5/")
            .with_status(200)
            .with_body(mocks::page_without_payload())
            .create_async()
            .await;

        let pool = setup_test_db().await;
        insert_person(&pool, 5, Some("https://x/name/nm5/")).await;

        let config = config_for(&server);
        let processor = SyncProcessor::new(pool.clone(), &config).unwrap();
        let outcome = processor
            .process_item(&WorkItem::new(5, Some("https://x/name/nm5/")))
            .await;

        assert!(matches!(outcome, ItemOutcome::Failed { ref message } if message.contains("Malformed")));
        let pending = ProfileRepository::new(pool).get_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_valid_payload_is_synced_with_zero_records() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/name/nm6/")
            .with_status(200)
            .with_body(mocks::page_with_payload(&serde_json::json!({ "props": {} })))
            .create_async()
            .await;

        let pool = setup_test_db().await;
        let config = config_for(&server);
        let outcome = SyncProcessor::new(pool, &config)
            .unwrap()
            .process_item(&WorkItem::new(6, Some("https://x/name/nm6/")))
            .await;

        assert_eq!(outcome, ItemOutcome::Synced { records: 0 });
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_earlier_rows() {
        let mut server = mockito::Server::new_async().await;
        let payload = mocks::credits_payload(
            vec![
                mocks::title_edge("Kept"),
                mocks::title_edge("Rejected"),
                mocks::title_edge("Never"),
            ],
            None,
        );
        let _mock = server
            .mock("GET", "/name/nm8/")
            .with_status(200)
            .with_body(mocks::page_with_payload(&payload))
            .create_async()
            .await;

        let pool = setup_test_db().await;
        insert_person(&pool, 8, Some("https://x/name/nm8/")).await;
        sqlx::query(
            "CREATE TRIGGER reject_title BEFORE INSERT ON filmography \
             WHEN NEW.title = 'Rejected' BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let config = config_for(&server);
        let report = SyncProcessor::new(pool.clone(), &config)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        let titles: Vec<String> = CreditRepository::new(pool)
            .get_by_entity(8)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["Kept"]);
    }

    #[tokio::test]
    async fn test_pending_set_failure_is_fatal() {
        let server = mockito::Server::new_async().await;
        let pool = setup_test_db().await;
        sqlx::query("DROP TABLE filmography").execute(&pool).await.unwrap();

        let config = config_for(&server);
        let err = SyncProcessor::new(pool, &config).unwrap().run().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let mut server = mockito::Server::new_async().await;
        let payload = mocks::credits_payload(vec![mocks::title_edge("Only")], None);
        let _mock = server
            .mock("GET", "/name/nm9/")
            .with_status(200)
            .with_body(mocks::page_with_payload(&payload))
            .create_async()
            .await;

        let pool = setup_test_db().await;
        insert_person(&pool, 9, Some("https://x/name/nm9/")).await;

        let mut config = config_for(&server);
        config.dry_run = true;
        let report = SyncProcessor::new(pool.clone(), &config)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.synced, 1);
        assert_eq!(report.records_written, 0);
        assert_eq!(report.records_previewed, 1);
        assert_eq!(credit_count(&pool, 9).await, 0);
    }

    #[test]
    fn test_pause_only_between_fetched_items() {
        let synced = ItemOutcome::Synced { records: 1 };
        let failed = ItemOutcome::Failed {
            message: "HTTP 503".into(),
        };
        assert!(pause_after(&synced, 0, 3, 500));
        assert!(pause_after(&failed, 1, 3, 500));
        assert!(!pause_after(&ItemOutcome::Skipped, 0, 3, 500));
        assert!(!pause_after(&synced, 2, 3, 500));
        assert!(!pause_after(&synced, 0, 3, 0));
    }

    #[tokio::test]
    async fn test_delay_separates_fetches() {
        let mut server = mockito::Server::new_async().await;
        let payload = mocks::credits_payload(vec![mocks::title_edge("T")], None);
        let mut _mocks = Vec::new();
        for id in ["nm1", "nm2"] {
            let mock = server
                .mock("GET", format!("/name/{}/", id).as_str())
                .with_status(200)
                .with_body(mocks::page_with_payload(&payload))
                .create_async()
                .await;
            _mocks.push(mock);
        }

        let pool = setup_test_db().await;
        insert_person(&pool, 1, Some("https://x/name/nm1/")).await;
        insert_person(&pool, 2, Some("https://x/name/nm2/")).await;

        let mut config = config_for(&server);
        config.delay_ms = 150;
        let started = Instant::now();
        let report = SyncProcessor::new(pool, &config)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.synced, 2);
        assert!(started.elapsed() >= std::time::Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_limit_caps_items_in_id_order() {
        let mut server = mockito::Server::new_async().await;
        let payload = mocks::credits_payload(vec![mocks::title_edge("T")], None);
        let _first = server
            .mock("GET", "/name/nm1/")
            .with_status(200)
            .with_body(mocks::page_with_payload(&payload))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/name/nm2/")
            .expect(0)
            .create_async()
            .await;

        let pool = setup_test_db().await;
        insert_person(&pool, 2, Some("https://x/name/nm2/")).await;
        insert_person(&pool, 1, Some("https://x/name/nm1/")).await;

        let mut config = config_for(&server);
        config.limit = Some(1);
        let report = SyncProcessor::new(pool.clone(), &config)
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.pending, 1);
        assert_eq!(credit_count(&pool, 1).await, 1);
        second.assert_async().await;
    }
}
