//! Process lifecycle: logging setup and one full sync run.

use crate::config::SyncConfig;
use crate::db;
use crate::domain::models::SyncReport;
use crate::error::{Result, SyncError};
use crate::service::SyncProcessor;

/// Initialize logging with tracing_subscriber.
pub fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["sqlx=warn", "credit_sync=info", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .init();
}

/// Connect, sync the pending set, and release the connection.
///
/// The connection is released on every path once it has been acquired.
/// Only setup failures come back as errors.
pub async fn run(config: &SyncConfig) -> Result<SyncReport> {
    config.validate()?;

    let pool = db::connect(config)
        .await
        .map_err(|e| SyncError::fatal(format!("{:#}", e)))?;

    let outcome = match SyncProcessor::new(pool.clone(), config) {
        Ok(processor) => processor.run().await,
        Err(e) => Err(e),
    };

    db::close(pool).await;
    outcome
}

/// Process exit status for a finished run: `0` even when items failed,
/// `1` only when setup failed.
pub fn exit_status(outcome: &Result<SyncReport>) -> u8 {
    match outcome {
        Ok(report) => {
            if report.failed > 0 {
                log::warn!(
                    "{} of {} profiles failed and remain pending",
                    report.failed,
                    report.pending
                );
            }
            0
        }
        Err(e) => {
            log::error!("{}", e);
            1
        }
    }
}
