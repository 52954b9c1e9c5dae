//! Discovery error types.

use thiserror::Error;

/// Errors raised by the discovery key schedule.
///
/// EID encode/decode itself never errors: a beacon that does not verify
/// is simply not ours, so those paths return `Option` instead.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// QR secret outside the allowed 16–32 byte range
    #[error("qr secret must be 16-32 bytes, got {0}")]
    InvalidSecretLength(usize),
}
