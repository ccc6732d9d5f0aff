//! # Sync Engine
//!
//! Orchestrates the outbox: queues totals payloads, flushes them in order,
//! and runs the full-snapshot resync.
//!
//! ## Flush Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ordered Flush                                     │
//! │                                                                         │
//! │  outbox:  [A] [B] [C]          (id order = enqueue order)              │
//! │                                                                         │
//! │  flush()                                                               │
//! │    deliver A ── ok ──► DELETE A                                        │
//! │    deliver B ── FAIL ─► STOP                                           │
//! │                                                                         │
//! │  outbox:  [B] [C]              (order intact, nothing skipped)         │
//! │  report:  sent=1, remaining=2, failure=Some(...)                       │
//! │                                                                         │
//! │  Stopping at the first failure preserves delivery order and avoids     │
//! │  amplifying a systemic outage into many redundant failed calls.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Retries are trigger-driven only: the next scan or an explicit resync
//! re-attempts whatever is still queued. There is no background scheduler
//! and no backoff.

use std::sync::Arc;

use tracing::{debug, info, warn};

use palletrack_db::Database;

use crate::client::Delivery;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::payload::SyncPayload;

// =============================================================================
// Flush Report
// =============================================================================

/// Outcome of one flush pass.
///
/// A delivery failure is data, not an `Err`: the entry stays queued and the
/// caller decides how to present it.
#[derive(Debug, Clone)]
pub struct FlushReport {
    /// Entries delivered and removed this pass.
    pub sent: u32,

    /// Entries still queued after the pass.
    pub remaining: i64,

    /// Description of the failure that stopped the pass, if any.
    pub failure: Option<String>,
}

impl FlushReport {
    /// True when the pass emptied everything it attempted.
    pub fn is_clean(&self) -> bool {
        self.failure.is_none()
    }
}

// =============================================================================
// Sync Engine
// =============================================================================

/// Queues and delivers totals payloads for the remote spreadsheet.
pub struct SyncEngine {
    /// Local store (outbox + totals queries).
    db: Database,

    /// Delivery seam (HTTP in production, scripted in tests).
    delivery: Arc<dyn Delivery>,

    /// Sync settings.
    config: SyncConfig,
}

impl SyncEngine {
    /// Creates a new sync engine.
    pub fn new(db: Database, delivery: Arc<dyn Delivery>, config: SyncConfig) -> Self {
        SyncEngine { db, delivery, config }
    }

    /// Computes the current totals for a (product, lot) and queues the
    /// incremental payload. Durable before returning; does not flush.
    pub async fn queue_lot_totals(&self, product_id: &str, lot: &str) -> SyncResult<()> {
        let totals = self.db.status().compute_totals(product_id, lot).await?;
        let payload = SyncPayload::scan_totals(&self.config.api_key, &totals);
        let serialized = serde_json::to_string(&payload)?;

        self.db.outbox().enqueue(&serialized).await?;
        debug!(product_id, lot, "Queued incremental totals payload");

        Ok(())
    }

    /// Flushes queued entries in insertion order.
    ///
    /// Attempts up to `flush_batch` entries; each accepted entry is removed
    /// before the next is attempted. The first failure stops the pass and
    /// leaves the failing entry (and everything behind it) queued.
    ///
    /// ## Errors
    /// Only storage or payload-deserialization failures return `Err`;
    /// delivery failures are reported in the [`FlushReport`].
    pub async fn flush(&self) -> SyncResult<FlushReport> {
        let entries = self.db.outbox().pending(self.config.flush_batch).await?;

        let mut sent = 0u32;
        let mut failure = None;

        for entry in entries {
            let payload: SyncPayload = serde_json::from_str(&entry.payload)?;

            match self.delivery.deliver(&payload).await {
                Ok(()) => {
                    self.db.outbox().remove(entry.id).await?;
                    sent += 1;
                }
                Err(e) => {
                    warn!(id = entry.id, error = %e, "Delivery failed, halting flush");
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        let remaining = self.db.outbox().count().await?;
        debug!(sent, remaining, "Flush pass finished");

        Ok(FlushReport { sent, remaining, failure })
    }

    /// Incremental sync path: queue the lot's totals, then flush once.
    ///
    /// Keeps the common case near-real-time while staying durable when the
    /// immediate attempt fails (the payload simply waits for the next
    /// trigger).
    pub async fn sync_lot(&self, product_id: &str, lot: &str) -> SyncResult<FlushReport> {
        self.queue_lot_totals(product_id, lot).await?;
        self.flush().await
    }

    /// Full resync: flush the queue, then send a fresh snapshot of every
    /// known (product, lot) directly in fixed-size chunks.
    ///
    /// Snapshot chunks bypass the outbox. The first rejected chunk aborts
    /// the operation with [`SyncError::SnapshotIncomplete`] carrying the
    /// count of rows the remote already confirmed.
    ///
    /// ## Returns
    /// Total snapshot rows confirmed by the remote.
    pub async fn resync_all(&self) -> SyncResult<u32> {
        let report = self.flush().await?;
        if let Some(failure) = &report.failure {
            // Queued entries that still fail stay queued; the snapshot runs
            // regardless and repairs the remote sheet wholesale.
            warn!(failure = %failure, "Pre-snapshot flush left entries queued");
        }

        let rows = self.db.status().snapshot_all_lots().await?;
        if rows.is_empty() {
            info!("No lots to snapshot");
            return Ok(0);
        }

        let mut rows_sent = 0u32;
        for chunk in rows.chunks(self.config.snapshot_chunk) {
            let payload = SyncPayload::bulk_snapshot(&self.config.api_key, chunk);

            self.delivery.deliver(&payload).await.map_err(|e| {
                SyncError::SnapshotIncomplete {
                    rows_sent,
                    reason: e.to_string(),
                }
            })?;

            rows_sent += chunk.len() as u32;
            debug!(rows_sent, "Snapshot chunk accepted");
        }

        info!(rows_sent, "Full snapshot delivered");
        Ok(rows_sent)
    }

    /// Current outbox depth (for operator feedback).
    pub async fn pending_count(&self) -> SyncResult<i64> {
        Ok(self.db.outbox().count().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use palletrack_core::ScanRecord;
    use palletrack_db::DbConfig;

    /// Scripted delivery: records every payload, fails on chosen call
    /// indices (0-based).
    struct ScriptedDelivery {
        calls: AtomicUsize,
        fail_on: HashSet<usize>,
        delivered: Mutex<Vec<SyncPayload>>,
    }

    impl ScriptedDelivery {
        fn new(fail_on: impl IntoIterator<Item = usize>) -> Arc<Self> {
            Arc::new(ScriptedDelivery {
                calls: AtomicUsize::new(0),
                fail_on: fail_on.into_iter().collect(),
                delivered: Mutex::new(Vec::new()),
            })
        }

        fn delivered(&self) -> Vec<SyncPayload> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Delivery for ScriptedDelivery {
        async fn deliver(&self, payload: &SyncPayload) -> SyncResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                return Err(SyncError::Rejected {
                    status: Some(502),
                    body: "bad gateway".to_string(),
                });
            }
            self.delivered.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn test_config() -> SyncConfig {
        SyncConfig {
            endpoint_url: "https://script.example.com/exec".to_string(),
            api_key: "SECRET-1".to_string(),
            ..SyncConfig::default()
        }
    }

    async fn engine_with(
        delivery: Arc<ScriptedDelivery>,
        config: SyncConfig,
    ) -> (SyncEngine, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = SyncEngine::new(db.clone(), delivery, config);
        (engine, db)
    }

    fn scan(product_id: &str, serial: i64, lot: &str, description: &str) -> ScanRecord {
        ScanRecord {
            description: description.to_string(),
            serial_number: serial,
            product_id: product_id.to_string(),
            lot: lot.to_string(),
            created_date: "2026-02-09".to_string(),
            expiry_date: "2026-08-09".to_string(),
        }
    }

    fn marker_payload(name: &str) -> String {
        let totals = palletrack_core::LotTotals {
            product_id: name.to_string(),
            lot: "090226".to_string(),
            description: name.to_string(),
            pallets: 1,
            packs_declared: 0,
        };
        serde_json::to_string(&SyncPayload::scan_totals("SECRET-1", &totals)).unwrap()
    }

    #[tokio::test]
    async fn test_flush_sends_in_order_and_halts_on_failure() {
        // Second delivery (B) fails
        let delivery = ScriptedDelivery::new([1]);
        let (engine, db) = engine_with(delivery.clone(), test_config()).await;

        db.outbox().enqueue(&marker_payload("A")).await.unwrap();
        db.outbox().enqueue(&marker_payload("B")).await.unwrap();
        db.outbox().enqueue(&marker_payload("C")).await.unwrap();

        let report = engine.flush().await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(report.remaining, 2);
        assert!(report.failure.is_some());

        // Only A went out
        let delivered = delivery.delivered();
        assert_eq!(delivered.len(), 1);

        // B and C remain queued in original order
        let pending = db.outbox().pending(10).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].payload.contains("\"B\""));
        assert!(pending[1].payload.contains("\"C\""));
    }

    #[tokio::test]
    async fn test_flush_drains_queue_on_success() {
        let delivery = ScriptedDelivery::new([]);
        let (engine, db) = engine_with(delivery.clone(), test_config()).await;

        db.outbox().enqueue(&marker_payload("A")).await.unwrap();
        db.outbox().enqueue(&marker_payload("B")).await.unwrap();

        let report = engine.flush().await.unwrap();
        assert_eq!(report.sent, 2);
        assert_eq!(report.remaining, 0);
        assert!(report.is_clean());
        assert_eq!(delivery.delivered().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_entry_is_retried_on_next_flush() {
        // First call fails, everything after succeeds
        let delivery = ScriptedDelivery::new([0]);
        let (engine, db) = engine_with(delivery.clone(), test_config()).await;

        db.outbox().enqueue(&marker_payload("A")).await.unwrap();

        let first = engine.flush().await.unwrap();
        assert_eq!(first.sent, 0);
        assert_eq!(first.remaining, 1);

        let second = engine.flush().await.unwrap();
        assert_eq!(second.sent, 1);
        assert_eq!(second.remaining, 0);
    }

    #[tokio::test]
    async fn test_sync_lot_queues_then_delivers_totals() {
        let delivery = ScriptedDelivery::new([]);
        let (engine, db) = engine_with(delivery.clone(), test_config()).await;

        db.scans().record(&scan("12", 7, "090226", "Widget")).await.unwrap();
        db.status().upsert("12", "090226", 7, true, 0).await.unwrap();

        let report = engine.sync_lot("12", "090226").await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(report.remaining, 0);

        let delivered = delivery.delivered();
        match &delivered[0] {
            SyncPayload::Scan(scan_totals) => {
                assert_eq!(scan_totals.stock.id_producto, "12");
                assert_eq!(scan_totals.stock.stock_total, 1);
                assert_eq!(scan_totals.stock.packs_aclarados, 0);
            }
            other => panic!("expected scan payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sync_lot_keeps_payload_queued_on_failure() {
        let delivery = ScriptedDelivery::new([0]);
        let (engine, db) = engine_with(delivery, test_config()).await;

        db.scans().record(&scan("12", 7, "090226", "Widget")).await.unwrap();
        db.status().upsert("12", "090226", 7, false, 5).await.unwrap();

        let report = engine.sync_lot("12", "090226").await.unwrap();
        assert_eq!(report.sent, 0);
        assert_eq!(report.remaining, 1);
        assert!(report.failure.is_some());
        assert_eq!(db.outbox().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resync_all_chunks_snapshot() {
        let delivery = ScriptedDelivery::new([]);
        let config = SyncConfig { snapshot_chunk: 2, ..test_config() };
        let (engine, db) = engine_with(delivery.clone(), config).await;

        for (n, product) in ["1", "2", "3", "4", "5"].iter().enumerate() {
            db.scans()
                .record(&scan(product, 1, "090226", &format!("Item {n}")))
                .await
                .unwrap();
            db.status().upsert(product, "090226", 1, true, 0).await.unwrap();
        }

        let rows_sent = engine.resync_all().await.unwrap();
        assert_eq!(rows_sent, 5);

        // 5 rows at chunk size 2 → 3 bulk requests
        let delivered = delivery.delivered();
        assert_eq!(delivered.len(), 3);
        assert!(delivered
            .iter()
            .all(|p| matches!(p, SyncPayload::BulkSnapshot(_))));
    }

    #[tokio::test]
    async fn test_resync_all_reports_rows_sent_before_failure() {
        // Second bulk chunk rejected
        let delivery = ScriptedDelivery::new([1]);
        let config = SyncConfig { snapshot_chunk: 2, ..test_config() };
        let (engine, db) = engine_with(delivery, config).await;

        for product in ["1", "2", "3", "4", "5"] {
            db.scans().record(&scan(product, 1, "090226", "Item")).await.unwrap();
            db.status().upsert(product, "090226", 1, true, 0).await.unwrap();
        }

        let err = engine.resync_all().await.unwrap_err();
        match err {
            SyncError::SnapshotIncomplete { rows_sent, .. } => assert_eq!(rows_sent, 2),
            other => panic!("expected SnapshotIncomplete, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resync_all_empty_store() {
        let delivery = ScriptedDelivery::new([]);
        let (engine, _db) = engine_with(delivery.clone(), test_config()).await;

        assert_eq!(engine.resync_all().await.unwrap(), 0);
        assert!(delivery.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_scan_to_totals() {
        let delivery = ScriptedDelivery::new([]);
        let (engine, db) = engine_with(delivery, test_config()).await;

        let record = palletrack_core::codec::decode(
            "NS=000007|PRD=12.0|DSC=Widget|LOT=090226|FEC=09/02/26|VTO=09/08/26",
        )
        .unwrap();
        assert_eq!(record.product_id, "12");
        assert_eq!(record.created_date, "2026-02-09");
        assert_eq!(record.expiry_date, "2026-08-09");

        assert!(db.scans().record(&record).await.unwrap());
        db.status()
            .upsert(&record.product_id, &record.lot, record.serial_number, true, 0)
            .await
            .unwrap();

        let report = engine.sync_lot(&record.product_id, &record.lot).await.unwrap();
        assert_eq!(report.sent, 1);

        let totals = db.status().compute_totals("12", "090226").await.unwrap();
        assert_eq!(totals.pallets, 1);
        assert_eq!(totals.packs_declared, 0);
    }
}
