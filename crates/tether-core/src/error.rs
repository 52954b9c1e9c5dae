//! Pairing engine error types.

use thiserror::Error;

/// Fatal pairing failures.
///
/// Every variant aborts the whole attempt: partial handshake state is
/// never reused, and recovery means going back to beacon discovery with
/// a fresh state.
#[derive(Debug, Error)]
pub enum PairingError {
    /// Handshake or transport crypto failure
    #[error(transparent)]
    Crypto(#[from] tether_crypto::CryptoError),

    /// Handshake message shorter than the pattern requires
    #[error("handshake message too short: {0} bytes")]
    TruncatedHandshake(usize),

    /// Decrypted frame with no type byte
    #[error("decrypted frame is empty")]
    EmptyFrame,

    /// Frame type byte outside the assigned ranges
    #[error("unexpected frame type 0x{0:02x}")]
    UnexpectedFrame(u8),
}
