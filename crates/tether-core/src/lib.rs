//! # tether-core
//!
//! Pairing engine for the tether hybrid transport: the message-flow
//! drivers that turn the symmetric handshake state from `tether-crypto`
//! into a completed session, and the framing of decrypted session
//! payloads.
//!
//! The engine is logically single-threaded per pairing attempt: each
//! handshake driver is a single-owner handle consumed by its final
//! step, and the derived [`tether_crypto::transport::SessionTransport`]
//! is owned by whoever drives the connection. All operations are
//! synchronous and CPU-bound; waiting for the peer belongs to the
//! external link layer, which calls back in once bytes arrive.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod frame;
pub mod pairing;

pub use error::PairingError;
pub use frame::{FRAME_CTAP, FRAME_POST_HANDSHAKE, Frame, split_ctap_payload};
pub use pairing::{HELLO_SIZE, InitiatorHandshake, ResponderHandshake};
