//! # Domain Types
//!
//! Core domain types used throughout Palletrack.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ScanRecord    │   │  PalletStatus   │   │   LotTotals     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  serial_number  │   │  is_full        │   │  pallets        │       │
//! │  │  product_id     │   │  packs_partial  │   │  packs_declared │       │
//! │  │  lot            │   │  updated_at     │   │  description    │       │
//! │  │  dates, desc    │   │                 │   │  (derived)      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  OutboxEntry    │   FIFO queue row; removed only after the          │
//! │  │  ─────────────  │   remote confirms acceptance.                     │
//! │  │  id, payload    │                                                   │
//! │  │  enqueued_at    │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A pallet is identified by the natural key (product_id, serial_number, lot).
//! There are no surrogate ids: the QR label is the identity carrier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Scan Record
// =============================================================================

/// A single decoded pallet scan.
///
/// Immutable once created: the ledger never updates or deletes scan rows.
/// Date fields stay `String` because the codec's lenient fallback keeps
/// unparseable dates verbatim rather than rejecting the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ScanRecord {
    /// Product description as printed on the label (≤ 90 chars, sanitized).
    pub description: String,

    /// Pallet serial number (≥ 1).
    pub serial_number: i64,

    /// Normalized product id ("12.0" and "12" collapse to "12").
    pub product_id: String,

    /// Lot code (DDMMYY of the production date).
    pub lot: String,

    /// Creation date, ISO `YYYY-MM-DD` when parseable.
    pub created_date: String,

    /// Expiry date, ISO `YYYY-MM-DD` when parseable.
    pub expiry_date: String,
}

impl ScanRecord {
    /// Returns the (product_id, lot) pair this scan belongs to.
    #[inline]
    pub fn lot_key(&self) -> (&str, &str) {
        (&self.product_id, &self.lot)
    }
}

// =============================================================================
// Pallet Status
// =============================================================================

/// Current fullness status of one pallet.
///
/// One row per (product_id, lot, serial_number); each re-scan overwrites the
/// prior status (last write wins). `packs_partial` is 0 whenever `is_full`
/// is true and ≥ 1 otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PalletStatus {
    pub product_id: String,
    pub lot: String,
    pub serial_number: i64,

    /// True for a complete pallet, false for a partial one.
    pub is_full: bool,

    /// Declared pack count for a partial pallet; 0 for a full one.
    pub packs_partial: i64,

    /// When this status was last written.
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Lot Totals
// =============================================================================

/// Per-(product, lot) stock totals, derived on demand.
///
/// Never persisted: recomputed from the ledger and the status table inside a
/// single transaction so pallets and packs come from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotTotals {
    pub product_id: String,
    pub lot: String,

    /// Description of the earliest-serial scan for this (product, lot);
    /// empty when no scan exists.
    pub description: String,

    /// Count of all status rows for the key, full and partial alike.
    pub pallets: i64,

    /// Sum of packs_partial over partial rows only.
    pub packs_declared: i64,
}

// =============================================================================
// Outbox Entry
// =============================================================================

/// A queued webhook payload awaiting remote acceptance.
///
/// The queue is the only channel to the remote system; even the immediate
/// incremental sync path enqueues first and flushes after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OutboxEntry {
    /// Monotonic queue position (SQLite AUTOINCREMENT rowid).
    pub id: i64,

    /// Serialized payload envelope (JSON).
    pub payload: String,

    /// When the entry was queued.
    pub enqueued_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
