//! # Webhook Payload Envelope
//!
//! Serde model of the JSON bodies accepted by the remote spreadsheet
//! webhook.
//!
//! ## Wire Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Payload Envelopes                                  │
//! │                                                                         │
//! │  INCREMENTAL (one lot, after a scan)                                   │
//! │  {                                                                     │
//! │    "api_key": "...", "type": "scan", "timestamp": "2026-02-09T10:11:12"│
//! │    "qr":    { "id_producto", "descripcion", "lote" },                  │
//! │    "stock": { "id_producto", "descripcion", "lote",                    │
//! │               "stock_total", "packs_aclarados" }                       │
//! │  }                                                                     │
//! │                                                                         │
//! │  FULL SNAPSHOT (resync, ≤ 200 rows per request)                        │
//! │  {                                                                     │
//! │    "api_key": "...", "type": "bulk_snapshot", "timestamp": "...",      │
//! │    "rows": [ { "id_producto", "lote", "descripcion",                   │
//! │                "pallets", "packs_aclarados" }, ... ]                   │
//! │  }                                                                     │
//! │                                                                         │
//! │  The shared api_key travels in the body (not a header) and must match  │
//! │  the secret configured on the remote script.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names are fixed by the deployed spreadsheet script; do not rename.

use chrono::Local;
use serde::{Deserialize, Serialize};

use palletrack_core::LotTotals;

// =============================================================================
// Envelope
// =============================================================================

/// A webhook payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncPayload {
    /// Incremental totals for a single (product, lot) after a scan.
    Scan(ScanTotals),

    /// Full recomputation of every known (product, lot), sent in chunks.
    BulkSnapshot(Snapshot),
}

/// Body of an incremental `scan` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTotals {
    pub api_key: String,
    pub timestamp: String,
    pub qr: QrRef,
    pub stock: StockRow,
}

/// The scanned (product, lot) identity echoed back to the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrRef {
    pub id_producto: String,
    pub descripcion: String,
    pub lote: String,
}

/// Current stock totals for one (product, lot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRow {
    pub id_producto: String,
    pub descripcion: String,
    pub lote: String,
    /// Pallet count (full and partial alike).
    pub stock_total: i64,
    /// Declared packs from partial pallets only.
    pub packs_aclarados: i64,
}

/// Body of a `bulk_snapshot` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub api_key: String,
    pub timestamp: String,
    pub rows: Vec<SnapshotRow>,
}

/// One (product, lot) row of a full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id_producto: String,
    pub lote: String,
    pub descripcion: String,
    pub pallets: i64,
    pub packs_aclarados: i64,
}

// =============================================================================
// Builders
// =============================================================================

impl SyncPayload {
    /// Builds an incremental totals payload for one lot.
    pub fn scan_totals(api_key: &str, totals: &LotTotals) -> Self {
        SyncPayload::Scan(ScanTotals {
            api_key: api_key.to_string(),
            timestamp: now_stamp(),
            qr: QrRef {
                id_producto: totals.product_id.clone(),
                descripcion: totals.description.clone(),
                lote: totals.lot.clone(),
            },
            stock: StockRow {
                id_producto: totals.product_id.clone(),
                descripcion: totals.description.clone(),
                lote: totals.lot.clone(),
                stock_total: totals.pallets,
                packs_aclarados: totals.packs_declared,
            },
        })
    }

    /// Builds a snapshot payload from one chunk of totals rows.
    pub fn bulk_snapshot(api_key: &str, rows: &[LotTotals]) -> Self {
        SyncPayload::BulkSnapshot(Snapshot {
            api_key: api_key.to_string(),
            timestamp: now_stamp(),
            rows: rows
                .iter()
                .map(|t| SnapshotRow {
                    id_producto: t.product_id.clone(),
                    lote: t.lot.clone(),
                    descripcion: t.description.clone(),
                    pallets: t.pallets,
                    packs_aclarados: t.packs_declared,
                })
                .collect(),
        })
    }
}

/// Local wall-clock timestamp with seconds precision.
fn now_stamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn totals() -> LotTotals {
        LotTotals {
            product_id: "12".to_string(),
            lot: "090226".to_string(),
            description: "Widget".to_string(),
            pallets: 3,
            packs_declared: 8,
        }
    }

    #[test]
    fn test_scan_payload_wire_shape() {
        let payload = SyncPayload::scan_totals("SECRET-1", &totals());
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "scan");
        assert_eq!(json["api_key"], "SECRET-1");
        assert_eq!(json["qr"]["id_producto"], "12");
        assert_eq!(json["qr"]["lote"], "090226");
        assert_eq!(json["stock"]["descripcion"], "Widget");
        assert_eq!(json["stock"]["stock_total"], 3);
        assert_eq!(json["stock"]["packs_aclarados"], 8);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_bulk_payload_wire_shape() {
        let payload = SyncPayload::bulk_snapshot("SECRET-1", &[totals()]);
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "bulk_snapshot");
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
        assert_eq!(json["rows"][0]["id_producto"], "12");
        assert_eq!(json["rows"][0]["pallets"], 3);
        assert_eq!(json["rows"][0]["packs_aclarados"], 8);
    }

    #[test]
    fn test_payload_round_trips_through_outbox_storage() {
        let payload = SyncPayload::scan_totals("SECRET-1", &totals());
        let stored = serde_json::to_string(&payload).unwrap();
        let restored: SyncPayload = serde_json::from_str(&stored).unwrap();
        assert_eq!(restored, payload);
    }
}
