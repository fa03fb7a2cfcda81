//! Webhook signature verification with HMAC-SHA256.
//!
//! The upstream service signs `timestamp ++ raw_body` with the shared webhook
//! secret and sends the base64-encoded MAC in a header. Provides:
//! - `sign()` -- compute the base64 signature for a delivery
//! - `verify()` -- constant-time check of a header-supplied signature

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur while signing.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// Invalid HMAC key.
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Compute the base64 HMAC-SHA256 of `timestamp ++ body` under `secret`.
///
/// Useful for generating test vectors and manual webhook deliveries.
pub fn sign(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    let result = mac.finalize();
    Ok(base64::engine::general_purpose::STANDARD.encode(result.into_bytes()))
}

/// Check a delivery's signature.
///
/// Pure: returns `false` on any mismatch and never errors on malformed input.
/// The comparison runs over the full length of both strings.
pub fn verify(timestamp: &str, body: &[u8], signature: &str, secret: &[u8]) -> bool {
    match sign(secret, timestamp, body) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
        Err(_) => false,
    }
}

/// Constant-time byte comparison (XOR-based).
///
/// Returns true if and only if `a == b`. Time taken is independent of
/// how many bytes match.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"user_id":1,"id":"manual-test","type":"sleep.updated","trace_id":"t1"}"#;

    #[test]
    fn test_sign_known_vector() {
        // Wikipedia HMAC-SHA256 example, base64-encoded.
        let sig = sign(b"key", "The quick brown fox ", b"jumps over the lazy dog").unwrap();
        assert_eq!(sig, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn test_verify_valid_signature() {
        let sig = sign(b"s3cr3t", "1700000000", BODY.as_bytes()).unwrap();
        assert_eq!(sig, "QJMBfke5SE9qHyBQZB98JPqnluWwedAdB3LhgeaIbQw=");
        assert!(verify("1700000000", BODY.as_bytes(), &sig, b"s3cr3t"));
    }

    #[test]
    fn test_verify_rejects_arbitrary_signature() {
        assert!(!verify("1700000000", BODY.as_bytes(), "abc123", b"s3cr3t"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let sig = sign(b"s3cr3t", "1700000000", BODY.as_bytes()).unwrap();
        assert!(!verify("1700000000", BODY.as_bytes(), &sig, b"other"));
    }

    #[test]
    fn test_single_byte_mutations_fail() {
        let ts = "1700000000";
        let sig = sign(b"s3cr3t", ts, BODY.as_bytes()).unwrap();

        for i in 0..sig.len() {
            let mut bytes = sig.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!verify(ts, BODY.as_bytes(), &mutated, b"s3cr3t"), "signature byte {i}");
        }

        for i in 0..ts.len() {
            let mut bytes = ts.as_bytes().to_vec();
            bytes[i] = if bytes[i] == b'9' { b'8' } else { b'9' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(!verify(&mutated, BODY.as_bytes(), &sig, b"s3cr3t"), "timestamp byte {i}");
        }

        for i in 0..BODY.len() {
            let mut bytes = BODY.as_bytes().to_vec();
            bytes[i] ^= 0x01;
            assert!(!verify(ts, &bytes, &sig, b"s3cr3t"), "body byte {i}");
        }
    }

    #[test]
    fn test_timestamp_and_body_are_concatenated() {
        // Moving bytes across the boundary keeps the signed input identical.
        let a = sign(b"k", "1700000000", b"{}").unwrap();
        let b = sign(b"k", "170000000", b"0{}").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_inputs_do_not_panic() {
        assert!(!verify("", b"", "", b""));
        assert!(!verify("ts", b"body", "not base64 at all!!", b"secret"));
        assert!(!verify("ts", &[0xff, 0xfe], "====", b"secret"));
    }

    #[test]
    fn test_empty_secret_still_signs() {
        let sig = sign(b"", "1", b"{}").unwrap();
        assert!(verify("1", b"{}", &sig, b""));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer string"));
        assert!(constant_time_eq(b"", b""));
    }
}
