//! Error types for the filmography sync job.
//!
//! This module provides structured error handling with:
//! - `SyncError`: one variant per failure category of a sync run
//! - `SyncStage`: where in the per-item pipeline a failure arose
//! - `Result<T>`: Type alias for Results using SyncError

use std::fmt;
use thiserror::Error;

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Per-item state machine: `Pending -> IdentifierResolved -> Fetched ->
/// Normalized -> Persisted`, with `Skipped` and `Failed` as terminal exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Pending,
    IdentifierResolved,
    Fetched,
    Normalized,
    Persisted,
    Skipped,
    Failed,
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Pending => "pending",
            SyncStage::IdentifierResolved => "identifier-resolved",
            SyncStage::Fetched => "fetched",
            SyncStage::Normalized => "normalized",
            SyncStage::Persisted => "persisted",
            SyncStage::Skipped => "skipped",
            SyncStage::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

#[derive(Debug, Error)]
pub enum SyncError {
    /// Source URL carries no `/name/<token>/` identifier
    #[error("No profile identifier in source URL: {0:?}")]
    IdentifierAbsent(Option<String>),

    /// Fetch failed at the network level or returned a non-2xx status
    #[error("Transport failure for {url}: {message}")]
    TransportFailure {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Structured-data block missing or undecodable
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Valid structured data without any recognizable credit container
    #[error("Schema drift: {0}")]
    SchemaDrift(String),

    /// Insert of a credit record failed
    #[error("Persistence failure for entity {entity_id}: {message}")]
    PersistenceFailure { entity_id: i64, message: String },

    /// Pending set or storage connection could not be acquired
    #[error("Fatal setup failure: {0}")]
    FatalSetup(String),
}

impl SyncError {
    pub fn transport(url: impl Into<String>, status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::TransportFailure {
            url: url.into(),
            status,
            message: msg.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    pub fn persistence(entity_id: i64, msg: impl Into<String>) -> Self {
        Self::PersistenceFailure {
            entity_id,
            message: msg.into(),
        }
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::FatalSetup(msg.into())
    }

    /// The last stage an item reached before this error ended it.
    pub fn stage(&self) -> SyncStage {
        match self {
            SyncError::IdentifierAbsent(_) => SyncStage::Pending,
            SyncError::TransportFailure { .. } => SyncStage::IdentifierResolved,
            SyncError::MalformedDocument(_) | SyncError::SchemaDrift(_) => SyncStage::Fetched,
            SyncError::PersistenceFailure { .. } => SyncStage::Normalized,
            SyncError::FatalSetup(_) => SyncStage::Pending,
        }
    }

    /// Setup-phase errors abort the whole run; everything else is per item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::FatalSetup(_))
    }
}

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;
