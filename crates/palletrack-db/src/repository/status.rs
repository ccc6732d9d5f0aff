//! # Pallet Status Repository
//!
//! One mutable status row per pallet, plus the derived per-lot totals.
//!
//! ## Aggregation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Totals for (product_id, lot)                         │
//! │                                                                         │
//! │  pallet_status rows          pallets        packs_declared             │
//! │  ──────────────────          ───────        ──────────────             │
//! │  serial 1  full              counted        —                          │
//! │  serial 2  partial, 5 packs  counted        +5                         │
//! │  serial 3  partial, 3 packs  counted        +3                         │
//! │                              ───────        ──────────────             │
//! │                              3              8                          │
//! │                                                                         │
//! │  Full AND partial pallets count toward pallet stock; only partial      │
//! │  pallets contribute declared packs. The description comes from the     │
//! │  earliest-serial scan of the pair.                                     │
//! │                                                                         │
//! │  Count, sum and description are read inside ONE transaction so a       │
//! │  concurrent upsert cannot produce a torn result.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use palletrack_core::{codec, LotTotals, PalletStatus};

/// Repository for pallet status rows and derived lot totals.
#[derive(Debug, Clone)]
pub struct PalletStatusRepository {
    pool: SqlitePool,
}

impl PalletStatusRepository {
    /// Creates a new PalletStatusRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PalletStatusRepository { pool }
    }

    /// Inserts or overwrites the status row for a pallet (last write wins).
    ///
    /// Always stamps the current time. `packs_partial` is forced to 0 when
    /// `is_full` is true; callers own every other consistency decision.
    pub async fn upsert(
        &self,
        product_id: &str,
        lot: &str,
        serial_number: i64,
        is_full: bool,
        packs_partial: i64,
    ) -> DbResult<()> {
        let packs_partial = if is_full { 0 } else { packs_partial };
        let now = Utc::now();

        debug!(
            product_id = %product_id,
            lot = %lot,
            serial = serial_number,
            is_full,
            packs_partial,
            "Upserting pallet status"
        );

        sqlx::query(
            r#"
            INSERT INTO pallet_status (
                product_id, lot, serial_number, is_full, packs_partial, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (product_id, lot, serial_number) DO UPDATE SET
                is_full = excluded.is_full,
                packs_partial = excluded.packs_partial,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product_id)
        .bind(lot)
        .bind(serial_number)
        .bind(is_full)
        .bind(packs_partial)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches the current status row for a pallet, if any.
    pub async fn get(
        &self,
        product_id: &str,
        lot: &str,
        serial_number: i64,
    ) -> DbResult<Option<PalletStatus>> {
        let status = sqlx::query_as::<_, PalletStatus>(
            r#"
            SELECT product_id, lot, serial_number, is_full, packs_partial, updated_at
            FROM pallet_status
            WHERE product_id = ?1 AND lot = ?2 AND serial_number = ?3
            "#,
        )
        .bind(product_id)
        .bind(lot)
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    /// Computes the totals for a single (product_id, lot) pair.
    ///
    /// All three reads (pallet count, packs sum, description) run inside one
    /// transaction: the result reflects a single consistent snapshot.
    pub async fn compute_totals(&self, product_id: &str, lot: &str) -> DbResult<LotTotals> {
        let mut tx = self.pool.begin().await?;
        let totals = totals_on(&mut tx, product_id, lot).await?;
        tx.commit().await?;

        Ok(totals)
    }

    /// Computes totals for every distinct scanned (product_id, lot) pair.
    ///
    /// Pairs whose product id, lot, or resolved description is empty are
    /// excluded: partial or corrupt keys must not reach the remote sheet.
    /// The whole snapshot is read inside one transaction.
    pub async fn snapshot_all_lots(&self) -> DbResult<Vec<LotTotals>> {
        let mut tx = self.pool.begin().await?;

        let pairs = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT DISTINCT product_id, lot
            FROM pallet_scans
            ORDER BY product_id ASC, lot ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut rows = Vec::with_capacity(pairs.len());
        for (product_id, lot) in pairs {
            let product_id = codec::normalize_product_id(&product_id);
            let lot = lot.trim().to_string();

            if product_id.is_empty() || lot.is_empty() {
                continue;
            }

            let totals = totals_on(&mut tx, &product_id, &lot).await?;
            if totals.description.is_empty() {
                continue;
            }

            rows.push(totals);
        }

        tx.commit().await?;

        debug!(rows = rows.len(), "Built full snapshot");
        Ok(rows)
    }
}

/// Reads the totals for one pair on an open transaction connection.
async fn totals_on(
    conn: &mut SqliteConnection,
    product_id: &str,
    lot: &str,
) -> DbResult<LotTotals> {
    // Pallets: every status row for the pair, full and partial alike.
    let pallets: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM pallet_status
        WHERE product_id = ?1 AND lot = ?2
        "#,
    )
    .bind(product_id)
    .bind(lot)
    .fetch_one(&mut *conn)
    .await?;

    // Declared packs: partial rows only.
    let packs_declared: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(packs_partial), 0)
        FROM pallet_status
        WHERE product_id = ?1 AND lot = ?2 AND is_full = 0
        "#,
    )
    .bind(product_id)
    .bind(lot)
    .fetch_one(&mut *conn)
    .await?;

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
    .fetch_optional(&mut *conn)
    .await?;

    Ok(LotTotals {
        product_id: product_id.to_string(),
        lot: lot.to_string(),
        description: description.map(|d| d.trim().to_string()).unwrap_or_default(),
        pallets,
        packs_declared,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use palletrack_core::ScanRecord;

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
    async fn test_upsert_overwrites_existing_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.status();

        repo.upsert("12", "090226", 7, true, 0).await.unwrap();
        repo.upsert("12", "090226", 7, false, 4).await.unwrap();

        let status = repo.get("12", "090226", 7).await.unwrap().unwrap();
        assert!(!status.is_full);
        assert_eq!(status.packs_partial, 4);

        let totals = repo.compute_totals("12", "090226").await.unwrap();
        assert_eq!(totals.pallets, 1);
    }

    #[tokio::test]
    async fn test_upsert_forces_zero_packs_when_full() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.status();

        repo.upsert("12", "090226", 7, true, 9).await.unwrap();

        let status = repo.get("12", "090226", 7).await.unwrap().unwrap();
        assert!(status.is_full);
        assert_eq!(status.packs_partial, 0);
    }

    #[tokio::test]
    async fn test_compute_totals_counts_all_sums_partials() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.scans().record(&scan("12", 1, "090226", "Widget")).await.unwrap();

        let repo = db.status();
        repo.upsert("12", "090226", 1, true, 0).await.unwrap();
        repo.upsert("12", "090226", 2, false, 5).await.unwrap();
        repo.upsert("12", "090226", 3, false, 3).await.unwrap();

        let totals = repo.compute_totals("12", "090226").await.unwrap();
        assert_eq!(totals.pallets, 3);
        assert_eq!(totals.packs_declared, 8);
        assert_eq!(totals.description, "Widget");
    }

    #[tokio::test]
    async fn test_compute_totals_empty_pair() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let totals = db.status().compute_totals("12", "090226").await.unwrap();
        assert_eq!(totals.pallets, 0);
        assert_eq!(totals.packs_declared, 0);
        assert_eq!(totals.description, "");
    }

    #[tokio::test]
    async fn test_snapshot_excludes_empty_description() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // Good pair
        db.scans().record(&scan("12", 1, "090226", "Widget")).await.unwrap();
        db.status().upsert("12", "090226", 1, true, 0).await.unwrap();

        // Pair whose only scan carries a blank description
        db.scans().record(&scan("9", 1, "100226", "   ")).await.unwrap();
        db.status().upsert("9", "100226", 1, false, 2).await.unwrap();

        let rows = db.status().snapshot_all_lots().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, "12");
        assert_eq!(rows[0].lot, "090226");
        assert_eq!(rows[0].pallets, 1);
    }

    #[tokio::test]
    async fn test_snapshot_excludes_empty_product_id() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.scans().record(&scan("", 1, "090226", "Orphan")).await.unwrap();

        let rows = db.status().snapshot_all_lots().await.unwrap();
        assert!(rows.is_empty());
    }
}
