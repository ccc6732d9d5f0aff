//! # Sync Outbox Repository
//!
//! FIFO queue of webhook payloads awaiting remote acceptance.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  LOCAL OPERATION (scan committed, totals changed)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO sync_outbox (payload, enqueued_at)   ← durable first      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FLUSH (triggered by the scan itself or an explicit retry)             │
//! │                                                                         │
//! │  1. SELECT ... ORDER BY id ASC LIMIT n                                 │
//! │  2. For each entry in order:                                           │
//! │     a. Deliver to the webhook                                          │
//! │     b. Accepted → DELETE the row, continue                             │
//! │     c. Failed   → STOP; entry stays queued for the next flush          │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • A payload is never lost on delivery failure                         │
//! │  • Rows leave the queue only after confirmed acceptance                │
//! │  • id order preserves enqueue order across retries                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery itself lives in palletrack-sync; this repository only owns the
//! queue rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use palletrack_core::OutboxEntry;

/// Repository for sync outbox operations.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: SqlitePool,
}

impl OutboxRepository {
    /// Creates a new OutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutboxRepository { pool }
    }

    /// Appends a payload to the tail of the queue.
    ///
    /// The row is durable before this returns; the queue is the only channel
    /// to the remote system.
    pub async fn enqueue(&self, payload: &str) -> DbResult<OutboxEntry> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO sync_outbox (payload, enqueued_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(payload)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "Queued outbox payload");

        Ok(OutboxEntry {
            id,
            payload: payload.to_string(),
            enqueued_at: now,
        })
    }

    /// Gets queued entries in insertion order.
    ///
    /// ## Arguments
    /// * `limit` - Maximum entries to return
    pub async fn pending(&self, limit: u32) -> DbResult<Vec<OutboxEntry>> {
        let entries = sqlx::query_as::<_, OutboxEntry>(
            r#"
            SELECT id, payload, enqueued_at
            FROM sync_outbox
            ORDER BY id ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Removes an entry after confirmed remote acceptance.
    pub async fn remove(&self, id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM sync_outbox WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(id, "Removed delivered outbox entry");
        Ok(())
    }

    /// Counts queued entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_outbox")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_enqueue_preserves_fifo_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outbox();

        let a = repo.enqueue(r#"{"n":"a"}"#).await.unwrap();
        let b = repo.enqueue(r#"{"n":"b"}"#).await.unwrap();
        let c = repo.enqueue(r#"{"n":"c"}"#).await.unwrap();
        assert!(a.id < b.id && b.id < c.id);

        let pending = repo.pending(10).await.unwrap();
        let payloads: Vec<&str> = pending.iter().map(|e| e.payload.as_str()).collect();
        assert_eq!(payloads, vec![r#"{"n":"a"}"#, r#"{"n":"b"}"#, r#"{"n":"c"}"#]);
    }

    #[tokio::test]
    async fn test_remove_only_deletes_target_entry() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outbox();

        let a = repo.enqueue("a").await.unwrap();
        repo.enqueue("b").await.unwrap();

        repo.remove(a.id).await.unwrap();

        let pending = repo.pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload, "b");
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pending_respects_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.outbox();

        for n in 0..5 {
            repo.enqueue(&format!("p{n}")).await.unwrap();
        }

        let pending = repo.pending(2).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].payload, "p0");
    }
}
