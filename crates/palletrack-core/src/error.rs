//! # Error Types
//!
//! Decode errors for palletrack-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  palletrack-core errors (this file)                                    │
//! │  └── DecodeError      - Malformed/incomplete QR payloads               │
//! │                                                                         │
//! │  palletrack-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  palletrack-sync errors (separate crate)                               │
//! │  └── SyncError        - Delivery/config/snapshot failures              │
//! │                                                                         │
//! │  Flow: DecodeError is surfaced to the operator; the scan is discarded  │
//! │  and nothing is persisted.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Errors raised while decoding a raw QR payload.
///
/// A decode failure always means the scan is rejected whole: no partial
/// record is constructed from an invalid payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The raw text lacks the `KEY=value|KEY=value` structure entirely.
    #[error("QR payload does not match the KEY=value|... structure")]
    InvalidFormat,

    /// One or more of the six required keys (NS, PRD, DSC, LOT, FEC, VTO)
    /// is absent or empty after trimming. Carries every missing key so the
    /// operator sees the full list at once.
    #[error("QR payload is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The NS field is present but not parseable as an integer.
    #[error("serial number '{0}' is not a valid integer")]
    InvalidSerial(String),
}

/// Convenience type alias for Results with DecodeError.
pub type DecodeResult<T> = Result<T, DecodeError>;

// =============================================================================
// Unit Tests
// =============================================================================
