//! # Scan Ledger Repository
//!
//! Append-only audit trail of pallet scans.
//!
//! ## Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Duplicate Detection                                  │
//! │                                                                         │
//! │  record(scan)                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO pallet_scans ... ON CONFLICT DO NOTHING                   │
//! │       │                                                                 │
//! │       ├── rows_affected = 1 ──► true  (newly inserted)                 │
//! │       └── rows_affected = 0 ──► false (key already present, no-op)     │
//! │                                                                         │
//! │  The UNIQUE(product_id, serial_number, lot) constraint decides;        │
//! │  there is no SELECT-then-INSERT race. Two concurrent inserts of the    │
//! │  same key cannot both report true.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No update or delete operation exists for scan rows.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use palletrack_core::ScanRecord;

/// Repository for the append-only scan ledger.
#[derive(Debug, Clone)]
pub struct ScanLedgerRepository {
    pool: SqlitePool,
}

impl ScanLedgerRepository {
    /// Creates a new ScanLedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ScanLedgerRepository { pool }
    }

    /// Records a scan.
    ///
    /// ## Returns
    /// * `Ok(true)` - newly inserted
    /// * `Ok(false)` - a row with the same (product_id, serial_number, lot)
    ///   already exists; the scan is a no-op, not an error
    pub async fn record(&self, record: &ScanRecord) -> DbResult<bool> {
        debug!(
            product_id = %record.product_id,
            lot = %record.lot,
            serial = record.serial_number,
            "Recording scan"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO pallet_scans (
                description, serial_number, product_id, lot, created_date, expiry_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (product_id, serial_number, lot) DO NOTHING
            "#,
        )
        .bind(&record.description)
        .bind(record.serial_number)
        .bind(&record.product_id)
        .bind(&record.lot)
        .bind(&record.created_date)
        .bind(&record.expiry_date)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists the most relevant scans for display.
    ///
    /// Ordered by (lot, product_id, serial_number) ascending, capped at
    /// `limit` rows.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<ScanRecord>> {
        let records = sqlx::query_as::<_, ScanRecord>(
            r#"
            SELECT description, serial_number, product_id, lot, created_date, expiry_date
            FROM pallet_scans
            ORDER BY lot ASC, product_id ASC, serial_number ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Returns the description of the earliest-serial scan for a
    /// (product_id, lot) pair, trimmed.
    ///
    /// Empty string when no scan exists for the pair.
    pub async fn earliest_description(&self, product_id: &str, lot: &str) -> DbResult<String> {
        let description: Option<String> = sqlx::query_scalar(
            r#"
            SELECT description
            FROM pallet_scans
            WHERE product_id = ?1 AND lot = ?2
            ORDER BY serial_number ASC
            LIMIT 1
            "#,
        )
        .bind(product_id)
        .bind(lot)
        .fetch_optional(&self.pool)
        .await?;

        Ok(description.map(|d| d.trim().to_string()).unwrap_or_default())
    }

    /// Enumerates every distinct (product_id, lot) pair with at least one
    /// scan, ordered by (product_id, lot) ascending.
    pub async fn distinct_product_lots(&self) -> DbResult<Vec<(String, String)>> {
        let pairs = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT DISTINCT product_id, lot
            FROM pallet_scans
            ORDER BY product_id ASC, lot ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pairs)
    }

    /// Counts total scans (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pallet_scans")
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

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.scans();
        let record = scan("12", 7, "090226", "Widget");

        assert!(repo.record(&record).await.unwrap());
        assert!(!repo.record(&record).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_serial_different_lot_is_distinct() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.scans();

        assert!(repo.record(&scan("12", 7, "090226", "Widget")).await.unwrap());
        assert!(repo.record(&scan("12", 7, "100226", "Widget")).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_recent_ordering() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.scans();

        repo.record(&scan("9", 2, "100226", "B")).await.unwrap();
        repo.record(&scan("12", 5, "090226", "A")).await.unwrap();
        repo.record(&scan("12", 1, "090226", "A")).await.unwrap();

        let rows = repo.list_recent(10).await.unwrap();
        let keys: Vec<(String, String, i64)> = rows
            .into_iter()
            .map(|r| (r.lot, r.product_id, r.serial_number))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("090226".to_string(), "12".to_string(), 1),
                ("090226".to_string(), "12".to_string(), 5),
                ("100226".to_string(), "9".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_recent_respects_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.scans();

        for serial in 1..=5 {
            repo.record(&scan("12", serial, "090226", "Widget")).await.unwrap();
        }

        assert_eq!(repo.list_recent(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_earliest_description_picks_smallest_serial() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.scans();

        repo.record(&scan("12", 9, "090226", "Later label")).await.unwrap();
        repo.record(&scan("12", 3, "090226", "  First label  ")).await.unwrap();

        let description = repo.earliest_description("12", "090226").await.unwrap();
        assert_eq!(description, "First label");
    }

    #[tokio::test]
    async fn test_earliest_description_empty_when_absent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let description = db.scans().earliest_description("12", "090226").await.unwrap();
        assert_eq!(description, "");
    }

    #[tokio::test]
    async fn test_distinct_product_lots() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.scans();

        repo.record(&scan("12", 1, "090226", "A")).await.unwrap();
        repo.record(&scan("12", 2, "090226", "A")).await.unwrap();
        repo.record(&scan("9", 1, "100226", "B")).await.unwrap();

        let pairs = repo.distinct_product_lots().await.unwrap();
        assert_eq!(
            pairs,
            vec![
                ("12".to_string(), "090226".to_string()),
                ("9".to_string(), "100226".to_string()),
            ]
        );
    }
}
