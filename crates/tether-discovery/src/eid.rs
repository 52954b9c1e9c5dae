//! EID codec: encrypt and recognize discovery beacon identifiers.
//!
//! An EID is a fixed 20-byte value: one AES-256-CBC block (zero IV, no
//! padding — the seed is exactly one block, so this is a single raw AES
//! block) followed by a 4-byte truncated HMAC-SHA-256 tag over the
//! ciphertext.
//!
//! [`decrypt_eid`] is the discovery filter: a scanner recomputes the
//! tag for every observed beacon under its own session seed, and only
//! the beacon belonging to the currently pairing peer will verify.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tether_crypto::{constant_time::ct_eq, hkdf};

/// Beacon identifier size: 16-byte ciphertext plus 4-byte tag.
pub const EID_SIZE: usize = 20;

/// Beacon seed size (one AES block).
pub const SEED_SIZE: usize = 16;

/// Size of the combined AES + HMAC beacon key.
pub const EID_KEY_SIZE: usize = 64;

/// Truncated tag length appended to the ciphertext.
const TAG_SIZE: usize = 4;

/// Domain-separation tag for the beacon key derivation.
pub(crate) const EID_KEY_INFO: [u8; 4] = [1, 0, 0, 0];

type HmacSha256 = Hmac<Sha256>;

/// Encrypt a beacon seed into a broadcastable EID.
///
/// The first 32 bytes of `eid_key` encrypt the seed, the last 32 key
/// the tag.
#[must_use]
pub fn generate_eid(eid_key: &[u8; EID_KEY_SIZE], seed: &[u8; SEED_SIZE]) -> [u8; EID_SIZE] {
    let (aes_key, hmac_key) = eid_key.split_at(32);

    // Zero IV and a single block: CBC degenerates to one raw AES block
    let mut block = GenericArray::clone_from_slice(seed);
    Aes256::new(GenericArray::from_slice(aes_key)).encrypt_block(&mut block);

    let tag = truncated_tag(hmac_key, &block);

    let mut eid = [0u8; EID_SIZE];
    eid[..SEED_SIZE].copy_from_slice(&block);
    eid[SEED_SIZE..].copy_from_slice(&tag);
    eid
}

/// Try to decrypt an observed beacon under our session secret.
///
/// `seed` is the QR-derived session seed; the beacon key is re-derived
/// from it with the `[1,0,0,0]` info tag, so this agrees with
/// [`crate::schedule::KeySchedule::eid_key`] on the advertiser side.
/// Returns `None` — this beacon is not ours — if the value is not 20
/// bytes, the recomputed tag mismatches (constant-time compare), or the
/// decrypted validity marker byte is nonzero.
#[must_use]
pub fn decrypt_eid(eid: &[u8], seed: &[u8; SEED_SIZE]) -> Option<[u8; SEED_SIZE]> {
    if eid.len() != EID_SIZE {
        tracing::trace!(len = eid.len(), "beacon with unexpected length");
        return None;
    }

    let derived = hkdf::derive(seed, &[], &EID_KEY_INFO, EID_KEY_SIZE).ok()?;
    let (aes_key, hmac_key) = derived.split_at(32);

    let (ciphertext, tag) = eid.split_at(SEED_SIZE);
    let expected = truncated_tag(hmac_key, ciphertext);
    if !ct_eq(&expected, tag) {
        return None;
    }

    let mut block = GenericArray::clone_from_slice(ciphertext);
    Aes256::new(GenericArray::from_slice(aes_key)).decrypt_block(&mut block);

    if block[0] != 0 {
        tracing::debug!("beacon tag verified but validity marker nonzero");
        return None;
    }

    let mut plaintext = [0u8; SEED_SIZE];
    plaintext.copy_from_slice(&block);
    Some(plaintext)
}

/// Build the beacon seed broadcast for one pairing attempt.
///
/// Layout: byte 0 is the version/validity marker (zero), bytes 1–8 the
/// big-endian millisecond timestamp, bytes 9–11 the routing id, bytes
/// 12–15 reserved zero.
#[must_use]
pub fn beacon_seed(routing_id: &[u8; 3], timestamp_millis: u64) -> [u8; SEED_SIZE] {
    let mut seed = [0u8; SEED_SIZE];
    seed[1..9].copy_from_slice(&timestamp_millis.to_be_bytes());
    seed[9..12].copy_from_slice(routing_id);
    seed
}

/// [`beacon_seed`] with the current system time.
#[must_use]
pub fn beacon_seed_now(routing_id: &[u8; 3]) -> [u8; SEED_SIZE] {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    beacon_seed(routing_id, millis)
}

fn truncated_tag(hmac_key: &[u8], ciphertext: &[u8]) -> [u8; TAG_SIZE] {
    // HMAC accepts keys of any length
    let mut mac = <HmacSha256 as Mac>::new_from_slice(hmac_key).expect("hmac key length");
    mac.update(ciphertext);
    let full = mac.finalize().into_bytes();

    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&full[..TAG_SIZE]);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_for(seed: &[u8; SEED_SIZE]) -> [u8; EID_KEY_SIZE] {
        let derived = hkdf::derive(seed, &[], &EID_KEY_INFO, EID_KEY_SIZE).unwrap();
        derived.try_into().unwrap()
    }

    #[test]
    fn test_eid_roundtrip() {
        let seed = beacon_seed(&[0xaa, 0xbb, 0xcc], 1_700_000_000_000);
        let eid = generate_eid(&key_for(&seed), &seed);

        assert_eq!(decrypt_eid(&eid, &seed), Some(seed));
    }

    #[test]
    fn test_wrong_seed_rejected() {
        let seed = beacon_seed(&[1, 2, 3], 42);
        let other = beacon_seed(&[1, 2, 4], 42);
        let eid = generate_eid(&key_for(&seed), &seed);

        assert_eq!(decrypt_eid(&eid, &other), None);
    }

    #[test]
    fn test_bit_flips_rejected() {
        let seed = beacon_seed(&[9, 9, 9], 123_456_789);
        let eid = generate_eid(&key_for(&seed), &seed);

        for byte in 0..EID_SIZE {
            for bit in 0..8 {
                let mut tampered = eid;
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    decrypt_eid(&tampered, &seed),
                    None,
                    "flip at byte {byte} bit {bit} accepted"
                );
            }
        }
    }

    #[test]
    fn test_wrong_length_rejected() {
        let seed = beacon_seed(&[0, 0, 1], 1);
        assert_eq!(decrypt_eid(&[0u8; 19], &seed), None);
        assert_eq!(decrypt_eid(&[0u8; 21], &seed), None);
        assert_eq!(decrypt_eid(&[], &seed), None);
    }

    #[test]
    fn test_nonzero_marker_rejected() {
        // Forge an EID over a seed whose validity marker is nonzero: the
        // tag verifies but the marker check must still reject it
        let mut seed = beacon_seed(&[5, 5, 5], 77);
        let key_seed = seed;
        seed[0] = 1;
        let eid = generate_eid(&key_for(&key_seed), &seed);

        assert_eq!(decrypt_eid(&eid, &key_seed), None);
    }

    #[test]
    fn test_beacon_seed_layout() {
        let seed = beacon_seed(&[0xde, 0xad, 0xbe], 0x0102_0304_0506_0708);

        assert_eq!(seed[0], 0);
        assert_eq!(&seed[1..9], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&seed[9..12], &[0xde, 0xad, 0xbe]);
        assert_eq!(&seed[12..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_discovery_filter_across_many_beacons() {
        // Only the beacon belonging to our seed should verify
        let ours = beacon_seed(&[7, 7, 7], 1_000);
        let eid = generate_eid(&key_for(&ours), &ours);

        let mut matches = 0;
        for i in 0..50u64 {
            let candidate = beacon_seed(&[7, 7, 7], 1_000 + i);
            if decrypt_eid(&eid, &candidate).is_some() {
                matches += 1;
                assert_eq!(candidate, ours);
            }
        }
        assert_eq!(matches, 1);
    }
}
