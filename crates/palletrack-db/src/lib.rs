//! # palletrack-db: Database Layer for Palletrack
//!
//! This crate provides database access for the Palletrack system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Palletrack Data Flow                              │
//! │                                                                         │
//! │  Scan shell (record scan / query totals)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   palletrack-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (scans.rs,     │    │  (embedded)  │  │   │
//! │  │   │               │    │  status.rs,    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  outbox.rs)    │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │    pallet_scans │ pallet_status │ sync_outbox                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (scans, status, outbox)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use palletrack_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/pallets.db")).await?;
//!
//! let inserted = db.scans().record(&record).await?;
//! let totals = db.status().compute_totals("12", "090226").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::outbox::OutboxRepository;
pub use repository::scans::ScanLedgerRepository;
pub use repository::status::PalletStatusRepository;
