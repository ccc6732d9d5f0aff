//! # Label Payload Generation
//!
//! Builds the encoded QR payload strings for a new run of pallet labels.
//! The lot code is the production date as DDMMYY and expiry is six months
//! out; rendering (QR images, PDF) is a separate tool's job.

use chrono::{Months, NaiveDate};

use palletrack_core::codec;
use palletrack_core::ScanRecord;

/// Builds `count` encoded label payloads, continuing after `last_serial`.
///
/// Returns the payload strings together with the new last serial, so the
/// caller can persist the counter the way the product master sheet does.
pub fn build_label_payloads(
    product_id: &str,
    description: &str,
    count: u32,
    last_serial: i64,
    production_date: NaiveDate,
) -> (Vec<String>, i64) {
    let lot = production_date.format("%d%m%y").to_string();
    let created_date = production_date.format("%Y-%m-%d").to_string();
    let expiry_date = (production_date + Months::new(6))
        .format("%Y-%m-%d")
        .to_string();

    let product_id = codec::normalize_product_id(product_id);
    let description = codec::sanitize_description(description);

    let payloads = (1..=i64::from(count))
        .map(|offset| {
            codec::encode(&ScanRecord {
                description: description.clone(),
                serial_number: last_serial + offset,
                product_id: product_id.clone(),
                lot: lot.clone(),
                created_date: created_date.clone(),
                expiry_date: expiry_date.clone(),
            })
        })
        .collect();

    (payloads, last_serial + i64::from(count))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_payloads_continue_serial_run() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 9).unwrap();
        let (payloads, last) = build_label_payloads("12.0", "Widget", 3, 41, date);

        assert_eq!(last, 44);
        assert_eq!(
            payloads[0],
            "NS=000042|PRD=12|DSC=Widget|LOT=090226|FEC=2026-02-09|VTO=2026-08-09"
        );
        assert_eq!(payloads.len(), 3);

        // Every payload decodes back to the scan it announces
        let decoded = palletrack_core::codec::decode(&payloads[2]).unwrap();
        assert_eq!(decoded.serial_number, 44);
        assert_eq!(decoded.lot, "090226");
    }

    #[test]
    fn test_expiry_rolls_across_year_end() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
        let (payloads, _) = build_label_payloads("5", "Widget", 1, 0, date);

        assert!(payloads[0].ends_with("FEC=2026-09-15|VTO=2027-03-15"));
    }
}
