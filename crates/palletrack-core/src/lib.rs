//! # palletrack-core: Pure Domain Logic for Palletrack
//!
//! This crate is the **heart** of Palletrack. It contains the QR wire codec
//! and the domain types as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Palletrack Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Scanner Shell (apps/scanner-cli)                │   │
//! │  │    scan input ──► partial/full decision ──► resync trigger     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ palletrack-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   codec   │  │   error   │                  │   │
//! │  │   │ScanRecord │  │  decode   │  │DecodeError│                  │   │
//! │  │   │ LotTotals │  │  encode   │  │           │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              palletrack-db / palletrack-sync                    │   │
//! │  │        SQLite ledger, status aggregation, outbox flush          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ScanRecord, PalletStatus, LotTotals, OutboxEntry)
//! - [`codec`] - QR wire format encode/decode with field normalization
//! - [`error`] - Decode error types
//!
//! ## Example Usage
//!
//! ```rust
//! use palletrack_core::codec;
//!
//! let record = codec::decode(
//!     "NS=000007|PRD=12.0|DSC=Widget|LOT=090226|FEC=09/02/26|VTO=09/08/26",
//! ).unwrap();
//!
//! assert_eq!(record.serial_number, 7);
//! assert_eq!(record.product_id, "12");
//! assert_eq!(record.created_date, "2026-02-09");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod error;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::DecodeError;
pub use types::*;
