//! # Sync Error Types
//!
//! Error types for sync operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Delivery     │  │     Snapshot            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Transport      │  │  SnapshotIncomplete     │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  (rows already          │ │
//! │  │  ConfigLoad/    │  │  Rejected       │  │   confirmed sent)       │ │
//! │  │  SaveFailed     │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Delivery failures are never fatal: the payload stays (or is re-left)  │
//! │  in the outbox for the next triggered flush.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid webhook URL.
    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Delivery Errors
    // =========================================================================
    /// Connection/transport failure reaching the webhook.
    #[error("Delivery transport failed: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout.
    #[error("Delivery timed out after {0} seconds")]
    Timeout(u64),

    /// The remote answered, but not with acceptance (`ok: true`).
    ///
    /// Carries the HTTP status (when one was received) and the raw body for
    /// diagnostics.
    #[error("Remote rejected payload (status {status:?}): {body}")]
    Rejected { status: Option<u16>, body: String },

    // =========================================================================
    // Snapshot Errors
    // =========================================================================
    /// A full-resync chunk was rejected partway through.
    ///
    /// `rows_sent` counts rows the remote already confirmed, so the operator
    /// knows remote state is ahead of empty but behind the full set.
    #[error("Snapshot incomplete: {rows_sent} rows confirmed before failure: {reason}")]
    SnapshotIncomplete { rows_sent: u32, reason: String },

    // =========================================================================
    // Storage / Serialization
    // =========================================================================
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] palletrack_db::DbError),

    /// Payload (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the operation can succeed on a later triggered retry.
    ///
    /// ## Retryable Errors
    /// - Transport failures (network issues)
    /// - Timeouts
    /// - Remote rejections (outage, quota, transient script failure)
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Serialization failures
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_)
                | SyncError::Timeout(_)
                | SyncError::Rejected { .. }
                | SyncError::SnapshotIncomplete { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
