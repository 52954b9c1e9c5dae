//! P-256 ECDH key agreement.
//!
//! Public keys cross the wire in SEC 1 uncompressed form
//! (`0x04 || x || y`, 65 bytes); the shared secret is the x-coordinate
//! of the agreed point, as produced by the `p256` crate.

use crate::{CryptoError, P256_PUBLIC_KEY_SIZE, P256_SCALAR_SIZE};
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{EncodedPoint, PublicKey, SecretKey};
use rand_core::{CryptoRng, RngCore};

/// A P-256 key pair used for the handshake's static and ephemeral keys.
///
/// The secret scalar is zeroed on drop by the `p256` crate.
pub struct EcKeyPair {
    secret: SecretKey,
    /// Uncompressed public key, cached at construction.
    public: [u8; P256_PUBLIC_KEY_SIZE],
}

impl EcKeyPair {
    /// Generate a fresh random key pair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = SecretKey::random(rng);
        let public = encode_public(&secret.public_key());
        Self { secret, public }
    }

    /// Build a key pair from a raw 32-byte big-endian private scalar.
    ///
    /// Intended for tests with fixed vectors and for callers restoring a
    /// persisted static key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPrivateKey`] if the scalar is zero
    /// or not reduced modulo the curve order.
    pub fn from_private(private: &[u8; P256_SCALAR_SIZE]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_slice(private).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let public = encode_public(&secret.public_key());
        Ok(Self { secret, public })
    }

    /// The public key in uncompressed SEC 1 form.
    #[must_use]
    pub fn public_key(&self) -> &[u8; P256_PUBLIC_KEY_SIZE] {
        &self.public
    }

    /// ECDH with a peer public key in uncompressed SEC 1 form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the peer key is not
    /// 65 bytes, lacks the `0x04` prefix, or is not a valid curve point.
    pub fn diffie_hellman(&self, peer: &[u8]) -> Result<[u8; P256_SCALAR_SIZE], CryptoError> {
        let peer = parse_public(peer)?;
        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());

        let mut out = [0u8; P256_SCALAR_SIZE];
        out.copy_from_slice(shared.raw_secret_bytes().as_slice());
        Ok(out)
    }
}

fn encode_public(public: &PublicKey) -> [u8; P256_PUBLIC_KEY_SIZE] {
    let point = public.to_encoded_point(false);
    let mut out = [0u8; P256_PUBLIC_KEY_SIZE];
    out.copy_from_slice(point.as_bytes());
    out
}

fn parse_public(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    if bytes.len() != P256_PUBLIC_KEY_SIZE || bytes[0] != 0x04 {
        return Err(CryptoError::InvalidPublicKey);
    }
    let point = EncodedPoint::from_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
    PublicKey::from_encoded_point(&point)
        .into_option()
        .ok_or(CryptoError::InvalidPublicKey)
}
