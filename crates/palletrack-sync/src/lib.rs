//! # palletrack-sync: Remote Sync Engine
//!
//! Delivers per-lot stock totals to the remote spreadsheet webhook with
//! durable, order-preserving, at-least-once semantics.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Data Flow                                  │
//! │                                                                         │
//! │  scan committed                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SyncEngine::sync_lot(product, lot)                                    │
//! │       │                                                                 │
//! │       ├── compute_totals (one transaction)                             │
//! │       ├── build "scan" payload                                         │
//! │       ├── enqueue (durable)                                            │
//! │       └── flush once:                                                  │
//! │             deliver in id order, delete on ok:true,                    │
//! │             STOP at first failure (entry stays queued)                 │
//! │                                                                         │
//! │  explicit retry                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SyncEngine::resync_all()                                              │
//! │       ├── flush queued entries                                         │
//! │       ├── snapshot every (product, lot)                                │
//! │       └── send 200-row chunks directly (not via the queue);            │
//! │           first rejection aborts with the confirmed row count          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`payload`] - webhook payload envelope (`scan` / `bulk_snapshot`)
//! - [`client`] - `Delivery` trait + reqwest implementation
//! - [`engine`] - outbox flush + resync orchestration
//! - [`config`] - TOML/env configuration
//! - [`error`] - sync error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod payload;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{Delivery, HttpDelivery};
pub use config::{AppConfig, SyncConfig};
pub use engine::{FlushReport, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use payload::SyncPayload;
