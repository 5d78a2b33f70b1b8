//! Run configuration, built once at startup and passed by reference.

use clap::Parser;
use std::time::Duration;
use url::Url;

use crate::error::{Result, SyncError};

pub const DEFAULT_PROVIDER_URL: &str = "https://www.imdb.com";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "credit-sync",
    version,
    about = "Sync filmography credits for every profile that has none yet"
)]
pub struct SyncConfig {
    /// SQLite connection string (sqlite://path/to.db)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Base URL profiles are fetched from, as `<base>/name/<id>/`
    #[arg(long, env = "CREDIT_SYNC_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
    pub provider_base_url: String,

    /// User-Agent header sent with every fetch
    #[arg(long, env = "CREDIT_SYNC_USER_AGENT", default_value = concat!("credit-sync/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[arg(long, env = "CREDIT_SYNC_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, env = "CREDIT_SYNC_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Pause between profiles, in milliseconds
    #[arg(long, env = "CREDIT_SYNC_DELAY_MS", default_value_t = 0)]
    pub delay_ms: u64,

    /// Process at most this many pending profiles
    #[arg(long, env = "CREDIT_SYNC_LIMIT")]
    pub limit: Option<usize>,

    /// Fetch and normalize but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not run the embedded migrations on connect
    #[arg(long)]
    pub skip_migrations: bool,
}

impl SyncConfig {
    /// Config for a given database with every other knob at its default.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            provider_base_url: DEFAULT_PROVIDER_URL.to_string(),
            user_agent: concat!("credit-sync/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            delay_ms: 0,
            limit: None,
            dry_run: false,
            skip_migrations: false,
        }
    }

    pub fn with_provider(mut self, base_url: impl Into<String>) -> Self {
        self.provider_base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(SyncError::fatal("database URL must not be empty"));
        }
        let base = self.provider_url()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SyncError::fatal(format!(
                "provider URL must be http(s), got {}",
                self.provider_base_url
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(SyncError::fatal("user agent must not be empty"));
        }
        Ok(())
    }

    pub fn provider_url(&self) -> Result<Url> {
        Url::parse(&self.provider_base_url).map_err(|e| {
            SyncError::fatal(format!(
                "invalid provider URL {}: {}",
                self.provider_base_url, e
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
