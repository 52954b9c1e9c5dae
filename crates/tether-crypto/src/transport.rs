//! Post-handshake session transport codec.
//!
//! Wraps the two directional keys produced by
//! [`crate::noise::HandshakeState::split_session_keys`] and turns
//! application payloads into padded AES-256-GCM frames.
//!
//! Each direction has its own monotonic 32-bit counter; the nonce is
//! 8 zero bytes followed by the counter in big-endian. A counter value
//! is burned the moment an encrypt or decrypt is attempted — failures
//! never roll it back, so no two plaintexts can ever share a nonce
//! under the same key.
//!
//! Both directions fail closed: transport noise and adversarial peers
//! are expected, so malformed input yields `None` rather than an error
//! the caller might be tempted to retry.

use crate::{AEAD_NONCE_SIZE, HASH_SIZE};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use zeroize::ZeroizeOnDrop;

/// Frames are padded to a multiple of this many bytes before
/// encryption, hiding exact payload lengths from the transport.
pub const PADDING_GRANULARITY: usize = 32;

/// Bidirectional session codec owning the read/write keys and counters.
///
/// Owned exclusively by one logical connection; a new handshake
/// produces a replacement instance, never a mutation of this one.
#[derive(Debug, ZeroizeOnDrop)]
pub struct SessionTransport {
    read_key: [u8; HASH_SIZE],
    write_key: [u8; HASH_SIZE],
    #[zeroize(skip)]
    read_counter: u32,
    #[zeroize(skip)]
    write_counter: u32,
}

impl SessionTransport {
    /// Build a codec from the two directional keys.
    ///
    /// The caller assigns directions by handshake role: the initiator's
    /// write key is the responder's read key and vice versa.
    #[must_use]
    pub fn new(read_key: [u8; HASH_SIZE], write_key: [u8; HASH_SIZE]) -> Self {
        Self {
            read_key,
            write_key,
            read_counter: 0,
            write_counter: 0,
        }
    }

    /// Encrypt an outgoing payload.
    ///
    /// Pads to the next multiple of 32 bytes (pad length 1–32, recorded
    /// as `pad_len - 1` in the final byte) and encrypts under the write
    /// key. The write counter advances even when encryption fails.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Option<Vec<u8>> {
        let nonce = nonce_for(self.write_counter);
        self.write_counter = self.write_counter.wrapping_add(1);

        let pad_len = PADDING_GRANULARITY - plaintext.len() % PADDING_GRANULARITY;
        let mut padded = Vec::with_capacity(plaintext.len() + pad_len);
        padded.extend_from_slice(plaintext);
        padded.resize(plaintext.len() + pad_len, 0);
        padded[plaintext.len() + pad_len - 1] = (pad_len - 1) as u8;

        Aes256Gcm::new(&self.write_key.into())
            .encrypt(Nonce::from_slice(&nonce), padded.as_slice())
            .ok()
    }

    /// Decrypt an incoming frame.
    ///
    /// The read counter advances even when authentication or padding
    /// validation fails.
    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Option<Vec<u8>> {
        let nonce = nonce_for(self.read_counter);
        self.read_counter = self.read_counter.wrapping_add(1);

        let padded = Aes256Gcm::new(&self.read_key.into())
            .decrypt(Nonce::from_slice(&nonce), ciphertext)
            .ok()?;

        let pad_len = usize::from(*padded.last()?) + 1;
        if pad_len > PADDING_GRANULARITY || pad_len > padded.len() {
            return None;
        }
        let mut plaintext = padded;
        plaintext.truncate(plaintext.len() - pad_len);
        Some(plaintext)
    }

    /// Frames decrypted so far (including failed attempts).
    #[must_use]
    pub fn read_counter(&self) -> u32 {
        self.read_counter
    }

    /// Frames encrypted so far (including failed attempts).
    #[must_use]
    pub fn write_counter(&self) -> u32 {
        self.write_counter
    }
}

fn nonce_for(counter: u32) -> [u8; AEAD_NONCE_SIZE] {
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    nonce[8..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (SessionTransport, SessionTransport) {
        let k1 = [0x11u8; 32];
        let k2 = [0x22u8; 32];
        // Initiator writes with k1, responder reads with k1
        (SessionTransport::new(k2, k1), SessionTransport::new(k1, k2))
    }

    #[test]
    fn test_roundtrip() {
        let (mut alice, mut bob) = pair();

        let ct = alice.encrypt(b"hello authenticator").unwrap();
        assert_eq!(bob.decrypt(&ct).unwrap(), b"hello authenticator");

        let ct = bob.encrypt(b"hello client").unwrap();
        assert_eq!(alice.decrypt(&ct).unwrap(), b"hello client");
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let (mut alice, mut bob) = pair();
        let ct = alice.encrypt(b"").unwrap();
        // A full padding block, encrypted
        assert_eq!(ct.len(), PADDING_GRANULARITY + 16);
        assert_eq!(bob.decrypt(&ct).unwrap(), b"");
    }

    #[test]
    fn test_exact_multiple_gets_full_pad_block() {
        let (mut alice, mut bob) = pair();
        let msg = [7u8; 64];
        let ct = alice.encrypt(&msg).unwrap();
        assert_eq!(ct.len(), 64 + PADDING_GRANULARITY + 16);
        assert_eq!(bob.decrypt(&ct).unwrap(), msg);
    }

    #[test]
    fn test_same_plaintext_distinct_ciphertexts() {
        let (mut alice, _) = pair();
        let a = alice.encrypt(b"repeat").unwrap();
        let b = alice.encrypt(b"repeat").unwrap();
        assert_ne!(a, b);
        assert_eq!(alice.write_counter(), 2);
    }

    #[test]
    fn test_counter_advances_on_failed_decrypt() {
        let (mut alice, mut bob) = pair();

        assert!(bob.decrypt(b"garbage that is not a frame").is_none());
        assert_eq!(bob.read_counter(), 1);

        // Counters are now out of step: the frame alice encrypts with
        // counter 0 can no longer decrypt
        let ct = alice.encrypt(b"late").unwrap();
        assert!(bob.decrypt(&ct).is_none());
    }

    #[test]
    fn test_in_order_sequence() {
        let (mut alice, mut bob) = pair();
        for i in 0..10u8 {
            let msg = vec![i; usize::from(i) * 7];
            let ct = alice.encrypt(&msg).unwrap();
            assert_eq!(bob.decrypt(&ct).unwrap(), msg);
        }
        assert_eq!(alice.write_counter(), 10);
        assert_eq!(bob.read_counter(), 10);
    }

    #[test]
    fn test_tampered_frame_rejected() {
        let (mut alice, mut bob) = pair();
        let mut ct = alice.encrypt(b"payload").unwrap();
        ct[3] ^= 0x01;
        assert!(bob.decrypt(&ct).is_none());
    }

    #[test]
    fn test_reflected_frame_rejected() {
        // A frame written by alice must not decrypt under her own read key
        let (mut alice, _) = pair();
        let ct = alice.encrypt(b"loopback").unwrap();
        assert!(alice.decrypt(&ct).is_none());
    }

    #[test]
    fn test_wrong_direction_keys_rejected() {
        let (mut alice, _) = pair();
        let (_, mut bob2) = pair();
        // bob2's read key matches, but his counter state is fresh; the
        // first frame decrypts, the second requires counter 1
        let ct0 = alice.encrypt(b"a").unwrap();
        let ct1 = alice.encrypt(b"b").unwrap();
        assert!(bob2.decrypt(&ct1).is_none());
        assert!(bob2.decrypt(&ct0).is_none());
    }
}
