//! Pairing key schedule.
//!
//! Everything a pairing attempt needs is derived from the short-lived
//! QR-code secret with domain-separated HKDF invocations:
//!
//! | Output | Info tag | Salt | Length |
//! |--------|----------|------|--------|
//! | EID key | `[1,0,0,0]` | — | 64 |
//! | Tunnel id | `[2,0,0,0]` | — | 16 |
//! | Pre-shared key | `[3,0,0,0]` | beacon seed | 32 |

use crate::eid::{EID_KEY_INFO, EID_KEY_SIZE, SEED_SIZE};
use crate::error::DiscoveryError;
use tether_crypto::hkdf;
use zeroize::{Zeroize, ZeroizeOnDrop};

const TUNNEL_ID_INFO: [u8; 4] = [2, 0, 0, 0];
const PSK_INFO: [u8; 4] = [3, 0, 0, 0];

/// Tunnel identifier length.
pub const TUNNEL_ID_SIZE: usize = 16;

/// Pre-shared key length.
pub const PSK_SIZE: usize = 32;

/// The pre-shared secret conveyed in the QR code.
///
/// Immutable once created; its lifetime is a single pairing attempt.
/// Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct QrSecret(Vec<u8>);

impl QrSecret {
    /// Wrap a QR-derived seed, validating its length.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidSecretLength`] unless the seed
    /// is 16–32 bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, DiscoveryError> {
        if !(16..=32).contains(&bytes.len()) {
            return Err(DiscoveryError::InvalidSecretLength(bytes.len()));
        }
        Ok(Self(bytes.to_vec()))
    }

    fn ikm(&self) -> &[u8] {
        &self.0
    }
}

/// Caller-owned key schedule over one [`QrSecret`].
///
/// Re-architected from the original's process-wide helpers into an
/// explicit handle: nothing here is cached globally, and dropping the
/// schedule drops the secret material with it.
pub struct KeySchedule {
    secret: QrSecret,
}

impl KeySchedule {
    /// Build a schedule over the QR secret.
    #[must_use]
    pub fn new(secret: QrSecret) -> Self {
        Self { secret }
    }

    /// The identifier both peers present to the rendezvous tunnel.
    #[must_use]
    pub fn tunnel_id(&self) -> [u8; TUNNEL_ID_SIZE] {
        let okm = hkdf::derive(self.secret.ikm(), &[], &TUNNEL_ID_INFO, TUNNEL_ID_SIZE)
            .expect("fixed-size expand");
        let mut out = [0u8; TUNNEL_ID_SIZE];
        out.copy_from_slice(&okm);
        out
    }

    /// The 64-byte beacon key handed to [`crate::eid::generate_eid`].
    #[must_use]
    pub fn eid_key(&self) -> [u8; EID_KEY_SIZE] {
        let okm = hkdf::derive(self.secret.ikm(), &[], &EID_KEY_INFO, EID_KEY_SIZE)
            .expect("fixed-size expand");
        let mut out = [0u8; EID_KEY_SIZE];
        out.copy_from_slice(&okm);
        out
    }

    /// The handshake pre-shared key, bound to the beacon seed plaintext
    /// recovered during discovery.
    #[must_use]
    pub fn psk(&self, beacon_seed: &[u8; SEED_SIZE]) -> [u8; PSK_SIZE] {
        let okm = hkdf::derive(self.secret.ikm(), beacon_seed, &PSK_INFO, PSK_SIZE)
            .expect("fixed-size expand");
        let mut out = [0u8; PSK_SIZE];
        out.copy_from_slice(&okm);
        out
    }
}
