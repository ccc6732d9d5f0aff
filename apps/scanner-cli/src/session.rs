//! # Scan Session
//!
//! Owns the single in-flight pending scan and the commit workflow.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scan Session States                                │
//! │                                                                         │
//! │  Operator Action          Session Call            State Change          │
//! │  ───────────────          ────────────            ────────────          │
//! │                                                                         │
//! │  Scan QR (full mode) ───► scan(raw) ────────────► decode + commit full │
//! │                                                                         │
//! │  Scan QR (partial) ─────► scan(raw) ────────────► pending = Some(rec)  │
//! │                                                    awaits pack count    │
//! │                                                                         │
//! │  Enter packs ───────────► commit_packs(n) ──────► commit partial,      │
//! │                                                    pending = None       │
//! │                                                                         │
//! │  Toggle off w/ pending ─► set_partial_mode(false)► commit full          │
//! │                                                                         │
//! │  Bad scan / cancel ─────► clear() ──────────────► pending = None       │
//! │                                                                         │
//! │  Commit = record scan (duplicate → no-op) + status upsert +            │
//! │           incremental sync (enqueue, then one flush attempt).          │
//! │  Every outcome (new/duplicate, sent/queued/failed) is reported          │
//! │  separately; the session never resolves full-vs-partial on its own.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tracing::info;

use palletrack_core::{codec, DecodeError, LotTotals, ScanRecord};
use palletrack_db::{Database, DbError};
use palletrack_sync::{FlushReport, SyncEngine, SyncError};

// =============================================================================
// Session Errors
// =============================================================================

/// Errors surfaced to the operator by the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The scanned text was not a valid QR payload; nothing was persisted.
    #[error("scan rejected: {0}")]
    Decode(#[from] DecodeError),

    /// Pack count for a partial pallet must be ≥ 1.
    #[error("invalid pack count {0}: must be an integer >= 1")]
    InvalidPacks(i64),

    /// A commit was requested with no scan pending.
    #[error("no scan is pending")]
    NoPendingScan,

    /// Local storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Sync failure that is not a plain delivery retry (those are carried
    /// inside the commit summary instead).
    #[error(transparent)]
    Sync(#[from] SyncError),
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of feeding one scanned line to the session.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The pallet was committed (full mode commits immediately).
    Committed(CommitSummary),

    /// Partial mode: the scan is held; the operator must enter packs.
    AwaitingPacks {
        product_id: String,
        lot: String,
        serial_number: i64,
    },
}

/// Everything the shell needs to render feedback for one commit.
#[derive(Debug)]
pub struct CommitSummary {
    pub product_id: String,
    pub lot: String,
    pub serial_number: i64,

    /// False when the ledger already held this (product, serial, lot);
    /// the duplicate still counts toward the displayed totals.
    pub newly_recorded: bool,

    pub is_full: bool,
    pub packs_partial: i64,

    /// Totals after this commit.
    pub totals: LotTotals,

    /// Outcome of the immediate sync attempt (sent / queued / failed).
    pub sync: FlushReport,
}

// =============================================================================
// Scan Session
// =============================================================================

/// Session context owning the storage handle, the sync engine and the single
/// in-flight pending scan. Passed to operations explicitly; there is no
/// ambient process state.
pub struct ScanSession {
    db: Database,
    engine: SyncEngine,
    partial_mode: bool,
    pending: Option<ScanRecord>,
}

impl ScanSession {
    /// Creates a session in full mode with no pending scan.
    pub fn new(db: Database, engine: SyncEngine) -> Self {
        ScanSession {
            db,
            engine,
            partial_mode: false,
            pending: None,
        }
    }

    /// True when the session is in partial mode.
    pub fn partial_mode(&self) -> bool {
        self.partial_mode
    }

    /// The pending scan, if one awaits a pack count.
    pub fn pending(&self) -> Option<&ScanRecord> {
        self.pending.as_ref()
    }

    /// The sync engine, for operations the shell triggers directly
    /// (full resync).
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Switches between full and partial mode.
    ///
    /// Turning partial mode off while a scan is pending commits it as full
    /// immediately (the operator decided the toggle was wrong).
    pub async fn set_partial_mode(
        &mut self,
        partial: bool,
    ) -> Result<Option<CommitSummary>, SessionError> {
        self.partial_mode = partial;

        if !partial && self.pending.is_some() {
            return Ok(Some(self.commit(true, 0).await?));
        }

        Ok(None)
    }

    /// Feeds one scanned line to the session.
    ///
    /// Full mode: decode and commit in one step. Partial mode: decode and
    /// hold the record until [`commit_packs`](Self::commit_packs).
    ///
    /// A decode failure drops any previously pending scan, mirroring the
    /// operator's "bad scan, start over" flow.
    pub async fn scan(&mut self, raw: &str) -> Result<ScanOutcome, SessionError> {
        let record = match codec::decode(raw) {
            Ok(record) => record,
            Err(e) => {
                self.clear();
                return Err(e.into());
            }
        };

        info!(
            product_id = %record.product_id,
            lot = %record.lot,
            serial = record.serial_number,
            "Scan decoded"
        );

        if self.partial_mode {
            let outcome = ScanOutcome::AwaitingPacks {
                product_id: record.product_id.clone(),
                lot: record.lot.clone(),
                serial_number: record.serial_number,
            };
            self.pending = Some(record);
            Ok(outcome)
        } else {
            self.pending = Some(record);
            Ok(ScanOutcome::Committed(self.commit(true, 0).await?))
        }
    }

    /// Commits the pending scan as a partial pallet with a declared pack
    /// count (≥ 1).
    pub async fn commit_packs(&mut self, packs: i64) -> Result<CommitSummary, SessionError> {
        if self.pending.is_none() {
            return Err(SessionError::NoPendingScan);
        }

        // If the toggle was switched off before Enter, the pallet is full
        // after all and the pack count is ignored.
        if !self.partial_mode {
            return self.commit(true, 0).await;
        }

        if packs < 1 {
            return Err(SessionError::InvalidPacks(packs));
        }

        self.commit(false, packs).await
    }

    /// Drops the pending scan without recording anything.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Records the pending scan, upserts its status, and runs the
    /// incremental sync path.
    async fn commit(&mut self, is_full: bool, packs: i64) -> Result<CommitSummary, SessionError> {
        let record = self.pending.take().ok_or(SessionError::NoPendingScan)?;

        let newly_recorded = self.db.scans().record(&record).await?;

        self.db
            .status()
            .upsert(
                &record.product_id,
                &record.lot,
                record.serial_number,
                is_full,
                packs,
            )
            .await?;

        let totals = self
            .db
            .status()
            .compute_totals(&record.product_id, &record.lot)
            .await?;

        let sync = self.engine.sync_lot(&record.product_id, &record.lot).await?;

        Ok(CommitSummary {
            product_id: record.product_id,
            lot: record.lot,
            serial_number: record.serial_number,
            newly_recorded,
            is_full,
            packs_partial: if is_full { 0 } else { packs },
            totals,
            sync,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use palletrack_db::DbConfig;
    use palletrack_sync::{SyncConfig, SyncPayload, SyncResult};

    /// Always-accepting delivery that records payloads.
    struct AcceptAll {
        delivered: Mutex<Vec<SyncPayload>>,
    }

    #[async_trait]
    impl palletrack_sync::Delivery for AcceptAll {
        async fn deliver(&self, payload: &SyncPayload) -> SyncResult<()> {
            self.delivered.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    async fn session() -> ScanSession {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let delivery = Arc::new(AcceptAll { delivered: Mutex::new(Vec::new()) });
        let config = SyncConfig {
            endpoint_url: "https://script.example.com/exec".to_string(),
            api_key: "SECRET-1".to_string(),
            ..SyncConfig::default()
        };
        let engine = SyncEngine::new(db.clone(), delivery, config);
        ScanSession::new(db, engine)
    }

    const RAW: &str = "NS=000007|PRD=12.0|DSC=Widget|LOT=090226|FEC=09/02/26|VTO=09/08/26";

    #[tokio::test]
    async fn test_full_mode_commits_immediately() {
        let mut session = session().await;

        let outcome = session.scan(RAW).await.unwrap();
        match outcome {
            ScanOutcome::Committed(summary) => {
                assert!(summary.newly_recorded);
                assert!(summary.is_full);
                assert_eq!(summary.totals.pallets, 1);
                assert_eq!(summary.totals.packs_declared, 0);
                assert_eq!(summary.sync.sent, 1);
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_scan_reported_not_errored() {
        let mut session = session().await;

        session.scan(RAW).await.unwrap();
        let outcome = session.scan(RAW).await.unwrap();

        match outcome {
            ScanOutcome::Committed(summary) => {
                assert!(!summary.newly_recorded);
                // Duplicate still counts toward displayed totals
                assert_eq!(summary.totals.pallets, 1);
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_mode_waits_for_packs() {
        let mut session = session().await;
        session.set_partial_mode(true).await.unwrap();

        let outcome = session.scan(RAW).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::AwaitingPacks { serial_number: 7, .. }));
        assert!(session.pending().is_some());

        let summary = session.commit_packs(5).await.unwrap();
        assert!(!summary.is_full);
        assert_eq!(summary.packs_partial, 5);
        assert_eq!(summary.totals.packs_declared, 5);
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_commit_packs_rejects_zero() {
        let mut session = session().await;
        session.set_partial_mode(true).await.unwrap();
        session.scan(RAW).await.unwrap();

        let err = session.commit_packs(0).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidPacks(0)));
        // Scan stays pending for a corrected entry
        assert!(session.pending().is_some());
    }

    #[tokio::test]
    async fn test_toggle_off_commits_pending_as_full() {
        let mut session = session().await;
        session.set_partial_mode(true).await.unwrap();
        session.scan(RAW).await.unwrap();

        let summary = session.set_partial_mode(false).await.unwrap().unwrap();
        assert!(summary.is_full);
        assert_eq!(summary.packs_partial, 0);
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_bad_scan_clears_pending_and_persists_nothing() {
        let mut session = session().await;
        session.set_partial_mode(true).await.unwrap();
        session.scan(RAW).await.unwrap();

        let err = session.scan("garbage").await.unwrap_err();
        assert!(matches!(err, SessionError::Decode(DecodeError::InvalidFormat)));
        assert!(session.pending().is_none());

        let err = session.commit_packs(5).await.unwrap_err();
        assert!(matches!(err, SessionError::NoPendingScan));
    }
}
