//! # QR Wire Codec
//!
//! Encodes and decodes the pipe-delimited `KEY=value` payload printed into
//! pallet QR labels.
//!
//! ## Wire Format
//! ```text
//! NS=000007|PRD=12|DSC=Widget 500g|LOT=090226|FEC=2026-02-09|VTO=2026-08-09
//!
//! NS   serial number, zero-padded to 6 digits on encode
//! PRD  product id (normalized: "12.0" collapses to "12")
//! DSC  description, ≤ 90 chars, no '|' '=' or newlines
//! LOT  lot code (DDMMYY of production date)
//! FEC  creation date, DD/MM/YY or ISO YYYY-MM-DD
//! VTO  expiry date, DD/MM/YY or ISO YYYY-MM-DD
//! ```
//!
//! ## Normalization
//! Decoding normalizes fields so that labels printed by different tools
//! collide on the same identity:
//! - product ids that parse as integral floats render as the integer
//! - `DD/MM/YY` dates re-render as ISO `YYYY-MM-DD`; a date that fails to
//!   parse is kept verbatim (lenient fallback, not an error)
//!
//! All functions here are pure; no I/O.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{DecodeError, DecodeResult};
use crate::types::ScanRecord;

// =============================================================================
// Constants
// =============================================================================

/// Required keys, in canonical wire order.
const REQUIRED_KEYS: [&str; 6] = ["NS", "PRD", "DSC", "LOT", "FEC", "VTO"];

/// Maximum description length carried in a QR payload.
///
/// Longer text is truncated on encode so a verbose product name cannot break
/// the wire format on the next decode.
pub const MAX_DESCRIPTION_LEN: usize = 90;

/// Integral floats at or beyond 2^53 lose precision in f64; above this the
/// raw text is kept instead of re-rendering.
const MAX_EXACT_INTEGER_F64: f64 = 9_007_199_254_740_992.0;

// =============================================================================
// Decode
// =============================================================================

/// Decodes a raw QR payload into a [`ScanRecord`].
///
/// ## Errors
/// * [`DecodeError::InvalidFormat`] - the text has no `|`/`=` structure
/// * [`DecodeError::MissingFields`] - any required key absent or empty,
///   with every missing key named
/// * [`DecodeError::InvalidSerial`] - NS present but not an integer
///
/// ## Example
/// ```rust
/// use palletrack_core::codec::decode;
///
/// let record = decode("NS=000001|PRD=12|DSC=Widget|LOT=090226|FEC=2026-02-09|VTO=2026-08-09").unwrap();
/// assert_eq!(record.serial_number, 1);
/// ```
pub fn decode(raw: &str) -> DecodeResult<ScanRecord> {
    let raw = raw.trim();

    if !raw.contains('|') || !raw.contains('=') {
        return Err(DecodeError::InvalidFormat);
    }

    let mut fields: HashMap<&str, &str> = HashMap::new();
    for part in raw.split('|') {
        if let Some((key, value)) = part.split_once('=') {
            fields.insert(key.trim(), value.trim());
        }
    }

    let missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| fields.get(*key).map_or(true, |v| v.is_empty()))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DecodeError::MissingFields(missing));
    }

    let serial_raw = fields["NS"];
    let serial_number = serial_raw
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidSerial(serial_raw.to_string()))?;

    Ok(ScanRecord {
        description: fields["DSC"].to_string(),
        serial_number,
        product_id: normalize_product_id(fields["PRD"]),
        lot: fields["LOT"].to_string(),
        created_date: normalize_date_iso(fields["FEC"]),
        expiry_date: normalize_date_iso(fields["VTO"]),
    })
}

// =============================================================================
// Encode
// =============================================================================

/// Encodes a [`ScanRecord`] into the wire format.
///
/// The serial is zero-padded to 6 digits and the description is sanitized
/// (see [`sanitize_description`]) so the output always decodes cleanly.
pub fn encode(record: &ScanRecord) -> String {
    format!(
        "NS={:06}|PRD={}|DSC={}|LOT={}|FEC={}|VTO={}",
        record.serial_number,
        record.product_id,
        sanitize_description(&record.description),
        record.lot,
        record.created_date,
        record.expiry_date,
    )
}

/// Strips characters that would corrupt the wire format from a description.
///
/// Newlines become spaces, `|` becomes `/`, `=` becomes `-`; the result is
/// trimmed and truncated to [`MAX_DESCRIPTION_LEN`] characters.
pub fn sanitize_description(description: &str) -> String {
    let cleaned: String = description
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            '|' => '/',
            '=' => '-',
            other => other,
        })
        .collect();

    cleaned.trim().chars().take(MAX_DESCRIPTION_LEN).collect()
}

// =============================================================================
// Field Normalization
// =============================================================================

/// Normalizes a product id.
///
/// Trims; empty or case-insensitive "nan" becomes the empty string; a value
/// that parses as a float with integral value renders as the integer (so
/// "12.0" and "12" collide); anything else is kept as-is.
pub fn normalize_product_id(value: &str) -> String {
    let trimmed = value.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return String::new();
    }

    if let Ok(parsed) = trimmed.parse::<f64>() {
        if parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() < MAX_EXACT_INTEGER_F64 {
            return format!("{}", parsed as i64);
        }
    }

    trimmed.to_string()
}

/// Normalizes a date field to ISO `YYYY-MM-DD`.
///
/// A value containing "/" is parsed as `DD/MM/YY`; on success it re-renders
/// as ISO, on failure the original text is returned unchanged. Values
/// without "/" (already-ISO or free text) pass through untouched.
pub fn normalize_date_iso(value: &str) -> String {
    let trimmed = value.trim();

    if trimmed.contains('/') {
        match NaiveDate::parse_from_str(trimmed, "%d/%m/%y") {
            Ok(date) => date.format("%Y-%m-%d").to_string(),
            Err(_) => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
