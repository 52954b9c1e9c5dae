//! # tether-crypto
//!
//! Cryptographic primitives for the tether pairing transport.
//!
//! This crate provides:
//! - HKDF-SHA-256 extract/expand (shared by the handshake and the beacon
//!   key schedule)
//! - P-256 ECDH with SEC 1 uncompressed point encoding
//! - The Noise-style handshake state machine (NK / NKpsk0 / KNpsk0 over
//!   P-256, AES-GCM, SHA-256)
//! - The post-handshake session transport codec (padded AES-GCM frames
//!   with counter-based nonces)
//! - Constant-time comparison helpers
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm |
//! |----------|-----------|
//! | Key Exchange | ECDH P-256 |
//! | AEAD | AES-256-GCM |
//! | Hash | SHA-256 |
//! | KDF | HKDF-SHA-256 |
//! | Beacon MAC | HMAC-SHA-256 (truncated) |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod constant_time;
pub mod ec;
pub mod error;
pub mod hkdf;
pub mod noise;
pub mod transport;

pub use error::CryptoError;

/// SEC 1 uncompressed P-256 public key size (0x04 || x || y).
pub const P256_PUBLIC_KEY_SIZE: usize = 65;

/// P-256 scalar / shared secret size.
pub const P256_SCALAR_SIZE: usize = 32;

/// AES-256-GCM key size.
pub const AEAD_KEY_SIZE: usize = 32;

/// AES-GCM nonce size (12 bytes / 96 bits).
pub const AEAD_NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// SHA-256 output size; also the HKDF round width.
pub const HASH_SIZE: usize = 32;
