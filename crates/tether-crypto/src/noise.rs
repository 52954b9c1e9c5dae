//! Noise-style handshake state machine.
//!
//! Implements the symmetric-state half of the Noise protocol for the
//! three patterns the pairing transport uses: `NK`, `NKpsk0` and
//! `KNpsk0`, all instantiated over P-256, AES-256-GCM and SHA-256.
//!
//! The state carries a rolling transcript hash, a rolling chaining key
//! and an optional cipher key. Message drivers (who sends which
//! ephemeral, which Diffie-Hellman results get mixed, in what order)
//! live in `tether-core`; this module only guarantees that two states
//! fed the same byte sequence converge on the same keys.
//!
//! A state that fails any operation is dead: there is no way back to
//! the initialized state, and retrying a pairing attempt requires a
//! brand-new state plus fresh discovery.

use crate::{AEAD_NONCE_SIZE, CryptoError, HASH_SIZE, hkdf};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Handshake pattern selector.
///
/// The wire protocol communicates the pattern as a small mode integer;
/// `*psk0` patterns mix the QR-derived pre-shared secret before any
/// ephemeral material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePattern {
    /// Responder static key known to the initiator, no PSK.
    Nk,
    /// Responder static key known, PSK mixed first.
    NkPsk0,
    /// Initiator static key known to the responder, PSK mixed first.
    KnPsk0,
}

impl HandshakePattern {
    /// Map a wire mode integer to a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownMode`] for unassigned mode numbers.
    pub fn from_mode(mode: u8) -> Result<Self, CryptoError> {
        match mode {
            1 => Ok(Self::Nk),
            2 => Ok(Self::NkPsk0),
            3 => Ok(Self::KnPsk0),
            _ => Err(CryptoError::UnknownMode(mode)),
        }
    }

    /// The full Noise protocol name for this pattern.
    #[must_use]
    pub fn protocol_name(self) -> &'static str {
        match self {
            Self::Nk => "Noise_NK_P256_AESGCM_SHA256",
            Self::NkPsk0 => "Noise_NKpsk0_P256_AESGCM_SHA256",
            Self::KnPsk0 => "Noise_KNpsk0_P256_AESGCM_SHA256",
        }
    }

    /// Whether the pattern mixes a pre-shared key.
    #[must_use]
    pub fn uses_psk(self) -> bool {
        !matches!(self, Self::Nk)
    }
}

/// Mutable handshake state, owned exclusively by one connection attempt.
///
/// Secret fields are zeroed on drop. [`HandshakeState::split_session_keys`]
/// consumes the state, so a completed handshake cannot be replayed.
#[derive(ZeroizeOnDrop)]
pub struct HandshakeState {
    #[zeroize(skip)]
    transcript_hash: [u8; HASH_SIZE],
    chaining_key: [u8; HASH_SIZE],
    cipher_key: Option<[u8; HASH_SIZE]>,
}

impl HandshakeState {
    /// Initialize a state for the given pattern.
    ///
    /// The transcript hash starts as the protocol name zero-padded or
    /// truncated to 32 bytes; the chaining key starts as a copy of it.
    #[must_use]
    pub fn new(pattern: HandshakePattern) -> Self {
        let name = pattern.protocol_name().as_bytes();
        let mut h = [0u8; HASH_SIZE];
        let n = name.len().min(HASH_SIZE);
        h[..n].copy_from_slice(&name[..n]);

        Self {
            transcript_hash: h,
            chaining_key: h,
            cipher_key: None,
        }
    }

    /// Absorb handshake message bytes into the transcript hash.
    ///
    /// Must be called for every public key and ciphertext sent or
    /// received, in the exact send/receive order of the peer.
    pub fn mix_hash(&mut self, data: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.transcript_hash);
        hasher.update(data);
        self.transcript_hash = hasher.finalize().into();
    }

    /// Mix input key material into the chaining key and derive a fresh
    /// cipher key.
    pub fn mix_key(&mut self, ikm: &[u8]) {
        let prk = hkdf::extract(&self.chaining_key, ikm);
        // 2 rounds of a 32-byte hash can never exceed the expand cap
        let okm = hkdf::expand(&prk, &[], 2 * HASH_SIZE).expect("two-block expand");
        self.replace_keys(&okm[..HASH_SIZE], &okm[HASH_SIZE..]);
    }

    /// PSK mixing step (`psk0`): like [`Self::mix_key`] but the middle
    /// expand block is folded into the transcript hash as well.
    pub fn mix_key_and_hash(&mut self, ikm: &[u8]) {
        let prk = hkdf::extract(&self.chaining_key, ikm);
        let okm = hkdf::expand(&prk, &[], 3 * HASH_SIZE).expect("three-block expand");
        let (ck, rest) = okm.split_at(HASH_SIZE);
        let (temp_hash, key) = rest.split_at(HASH_SIZE);

        self.chaining_key.copy_from_slice(ck);
        self.mix_hash(temp_hash);
        self.set_cipher_key(key);
    }

    /// Encrypt a handshake payload and absorb the ciphertext.
    ///
    /// Uses the current cipher key (an all-zero key before the first
    /// `mix_key`, as the pattern's "empty key" step requires), an
    /// all-zero nonce and the transcript hash as associated data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] if AEAD encryption
    /// fails.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = self
            .aead()
            .encrypt(
                Nonce::from_slice(&[0u8; AEAD_NONCE_SIZE]),
                Payload {
                    msg: plaintext,
                    aad: &self.transcript_hash,
                },
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;
        self.mix_hash(&ciphertext);
        Ok(ciphertext)
    }

    /// Decrypt a handshake payload and absorb the *ciphertext*.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::HandshakeFailed`] on authentication
    /// failure — wrong pre-shared secret, corrupted transport or a
    /// downgrade attempt. The state must then be discarded.
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let plaintext = self
            .aead()
            .decrypt(
                Nonce::from_slice(&[0u8; AEAD_NONCE_SIZE]),
                Payload {
                    msg: ciphertext,
                    aad: &self.transcript_hash,
                },
            )
            .map_err(|_| CryptoError::HandshakeFailed("payload authentication failed"))?;
        self.mix_hash(ciphertext);
        Ok(plaintext)
    }

    /// Derive the two directional session keys from the final chaining
    /// key, consuming the state.
    ///
    /// Returns `(k1, k2)`; the initiator writes with `k1` and reads with
    /// `k2`, the responder the reverse.
    #[must_use]
    pub fn split_session_keys(self) -> ([u8; HASH_SIZE], [u8; HASH_SIZE]) {
        let prk = hkdf::extract(&self.chaining_key, &[]);
        let okm = hkdf::expand(&prk, &[], 2 * HASH_SIZE).expect("two-block expand");

        let mut k1 = [0u8; HASH_SIZE];
        let mut k2 = [0u8; HASH_SIZE];
        k1.copy_from_slice(&okm[..HASH_SIZE]);
        k2.copy_from_slice(&okm[HASH_SIZE..]);
        (k1, k2)
    }

    fn replace_keys(&mut self, ck: &[u8], key: &[u8]) {
        self.chaining_key.copy_from_slice(ck);
        self.set_cipher_key(key);
    }

    fn set_cipher_key(&mut self, key: &[u8]) {
        if let Some(old) = self.cipher_key.as_mut() {
            old.zeroize();
        }
        let mut k = [0u8; HASH_SIZE];
        k.copy_from_slice(key);
        self.cipher_key = Some(k);
    }

    fn aead(&self) -> Aes256Gcm {
        let key = self.cipher_key.unwrap_or([0u8; HASH_SIZE]);
        Aes256Gcm::new(&key.into())
    }
}
