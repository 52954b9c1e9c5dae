//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD encryption failed
    #[error("encryption failed")]
    EncryptionFailed,

    /// HKDF expansion would need more than 255 rounds
    #[error("hkdf expand too long: {requested} bytes requested")]
    HkdfLengthExceeded {
        /// Requested output length
        requested: usize,
    },

    /// Invalid P-256 public key encoding or point
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Invalid P-256 private key
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Handshake message failed authentication; the handshake state must
    /// be discarded and the pairing attempt restarted from discovery
    #[error("handshake failed: {0}")]
    HandshakeFailed(&'static str),

    /// Unknown handshake mode number
    #[error("unknown handshake mode: {0}")]
    UnknownMode(u8),
}
