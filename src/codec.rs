//! Hex/base64 codec utilities and constant-time comparison.
//!
//! Contract (spec §4.1): every length field populated by [`hex_to_bytes`]
//! equals half the input hex string's length exactly. Callers must supply
//! `max_len` — the family-specific buffer maximum — so oversized or hostile
//! inputs are rejected before any allocation, per the hex-decode length
//! contract in spec §9.

use crate::error::{AmvpError, Result};
use subtle::ConstantTimeEq;

/// Decode a hex string into bytes, rejecting odd length, non-hex
/// characters, and anything that would decode past `max_len` bytes.
///
/// Case-insensitive on input; the invariant `|hex| == 2 * bytes.len()` holds
/// for every successful decode.
pub fn hex_to_bytes(hex: &str, max_len: usize) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return Err(AmvpError::invalid_arg("hex", "odd-length hex string"));
    }
    let want_len = hex.len() / 2;
    if want_len > max_len {
        return Err(AmvpError::invalid_arg(
            "hex",
            format!("decoded length {want_len} exceeds maximum {max_len}"),
        ));
    }
    // Reserve the exact output capacity up front so a hostile-but-within-
    // bounds length that still can't be allocated surfaces as MallocFail
    // rather than an abort (spec §6 error code list; §7 ties this variant
    // to exactly this kind of capacity pre-check).
    let mut out = Vec::new();
    out.try_reserve_exact(want_len)
        .map_err(|e| AmvpError::MallocFail(format!("failed to reserve {want_len} bytes: {e}")))?;
    hex::decode(hex).map_err(|e| AmvpError::invalid_arg("hex", format!("invalid hex: {e}")))
}

/// Encode bytes as lowercase hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a standard (non-URL-safe) base64 string into bytes, bounded by
/// `max_len` decoded bytes.
pub fn b64_to_bytes(b64: &str, max_len: usize) -> Result<Vec<u8>> {
    use base64::Engine as _;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| AmvpError::invalid_arg("base64", format!("invalid base64: {e}")))?;
    if decoded.len() > max_len {
        return Err(AmvpError::invalid_arg(
            "base64",
            format!("decoded length {} exceeds maximum {max_len}", decoded.len()),
        ));
    }
    Ok(decoded)
}

/// Encode bytes as standard base64.
pub fn bytes_to_b64(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Length-independent content comparison, used for VAL test types so a
/// mismatched-length comparison never short-circuits on a timing side
/// channel (spec §4.1).
pub fn buf_compare_const(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let s = "4869205468657265";
        let bytes = hex_to_bytes(s, 64).unwrap();
        assert_eq!(bytes, hex_literal::hex!("4869205468657265"));
        assert_eq!(bytes_to_hex(&bytes), s);
    }

    #[test]
    fn hex_round_trip_upper_case_normalizes_to_lower() {
        let bytes = hex_to_bytes("0B0B0B0B", 16).unwrap();
        assert_eq!(bytes_to_hex(&bytes), "0b0b0b0b");
    }

    #[test]
    fn odd_length_is_invalid_arg() {
        let err = hex_to_bytes("abc", 16).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn non_hex_char_is_invalid_arg() {
        let err = hex_to_bytes("zz", 16).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn oversized_hex_is_rejected_before_decode() {
        let s = "00".repeat(10);
        let err = hex_to_bytes(&s, 4).unwrap_err();
        assert!(matches!(err, AmvpError::InvalidArg { .. }));
    }

    #[test]
    fn const_compare_equal_and_unequal() {
        assert!(buf_compare_const(b"abc", b"abc"));
        assert!(!buf_compare_const(b"abc", b"abd"));
        assert!(!buf_compare_const(b"abc", b"ab"));
    }

    #[test]
    fn base64_round_trip() {
        let s = bytes_to_b64(b"hello world");
        assert_eq!(b64_to_bytes(&s, 64).unwrap(), b"hello world");
    }
}
