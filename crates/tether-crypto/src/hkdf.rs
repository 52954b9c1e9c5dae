//! HKDF-SHA-256 key derivation (RFC 5869 extract/expand).
//!
//! Shared by the handshake chaining-key schedule and the beacon key
//! schedule. The expand step is written out round by round because the
//! handshake needs the exact 2- and 3-block output splits.

use crate::{CryptoError, HASH_SIZE};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac(key: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(key).expect("hmac key length")
}

/// HKDF-Extract: derive a pseudorandom key from input key material.
///
/// An empty salt is replaced by a 32-byte zero key, matching the
/// RFC 5869 default.
#[must_use]
pub fn extract(salt: &[u8], ikm: &[u8]) -> [u8; HASH_SIZE] {
    let zero = [0u8; HASH_SIZE];
    let mut h = mac(if salt.is_empty() { &zero } else { salt });
    h.update(ikm);
    h.finalize().into_bytes().into()
}

/// HKDF-Expand: expand a pseudorandom key into `length` bytes of output
/// key material.
///
/// Runs `ceil(length / 32)` HMAC rounds where round *i* authenticates
/// `previous_round || info || byte(i + 1)`.
///
/// # Errors
///
/// Returns [`CryptoError::HkdfLengthExceeded`] if the output would need
/// more than 255 rounds.
pub fn expand(prk: &[u8; HASH_SIZE], info: &[u8], length: usize) -> Result<Vec<u8>, CryptoError> {
    let rounds = length.div_ceil(HASH_SIZE);
    if rounds > 255 {
        return Err(CryptoError::HkdfLengthExceeded { requested: length });
    }

    let mut okm = Vec::with_capacity(rounds * HASH_SIZE);
    let mut prev: [u8; HASH_SIZE] = [0; HASH_SIZE];
    for i in 0..rounds {
        let mut h = mac(prk);
        if i > 0 {
            h.update(&prev);
        }
        h.update(info);
        h.update(&[(i + 1) as u8]);
        prev = h.finalize().into_bytes().into();
        okm.extend_from_slice(&prev);
    }
    okm.truncate(length);
    Ok(okm)
}

/// Combined extract-then-expand.
///
/// # Errors
///
/// Returns [`CryptoError::HkdfLengthExceeded`] if `length` needs more
/// than 255 expand rounds.
pub fn derive(ikm: &[u8], salt: &[u8], info: &[u8], length: usize) -> Result<Vec<u8>, CryptoError> {
    expand(&extract(salt, ikm), info, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 5869 Test Case 1
    #[test]
    fn test_rfc5869_case_1() {
        let ikm = hex::decode("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();

        let okm = derive(&ikm, &salt, &info, 42).unwrap();

        let expected = hex::decode(
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865",
        )
        .unwrap();
        assert_eq!(okm, expected);
    }

    // RFC 5869 Test Case 3 (zero-length salt and info)
    #[test]
    fn test_rfc5869_case_3() {
        let ikm = hex::decode("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();

        let okm = derive(&ikm, &[], &[], 42).unwrap();

        let expected = hex::decode(
            "8da4e775a563c18f715f802a063c5a31b8a11f5c5ee1879ec3454e5f3c738d2d9d201395faa4b61a96c8",
        )
        .unwrap();
        assert_eq!(okm, expected);
    }

    #[test]
    fn test_expand_exact_rounds() {
        let prk = extract(&[], b"ikm");

        for n in 1..=4usize {
            let okm = expand(&prk, b"info", 32 * n).unwrap();
            assert_eq!(okm.len(), 32 * n);
            // A longer request extends, never rewrites, earlier rounds
            let longer = expand(&prk, b"info", 32 * (n + 1)).unwrap();
            assert_eq!(&longer[..32 * n], &okm[..]);
        }
    }

    #[test]
    fn test_expand_truncates_partial_round() {
        let prk = extract(b"salt", b"ikm");
        let okm = expand(&prk, b"info", 33).unwrap();
        assert_eq!(okm.len(), 33);

        let full = expand(&prk, b"info", 64).unwrap();
        assert_eq!(okm, full[..33]);
    }

    #[test]
    fn test_expand_max_rounds() {
        let prk = extract(&[], b"ikm");
        assert!(expand(&prk, &[], 255 * 32).is_ok());
        assert!(matches!(
            expand(&prk, &[], 255 * 32 + 1),
            Err(CryptoError::HkdfLengthExceeded { .. })
        ));
    }

    #[test]
    fn test_expand_zero_length() {
        let prk = extract(&[], b"ikm");
        assert!(expand(&prk, &[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_salt_is_zero_key() {
        let a = extract(&[], b"ikm");
        let b = extract(&[0u8; 32], b"ikm");
        assert_eq!(a, b);
    }
}
