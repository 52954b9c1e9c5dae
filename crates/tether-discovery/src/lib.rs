//! # tether-discovery
//!
//! Discovery-side pieces of the tether pairing transport.
//!
//! This crate provides:
//! - The EID codec: the 20-byte ephemeral identifier broadcast in
//!   discovery beacons so a scanning peer can recognize one specific
//!   pairing session among many observed advertisements
//! - Beacon seed construction (version byte, timestamp, routing id)
//! - The pairing key schedule deriving tunnel id, EID key and
//!   pre-shared key from the QR-code secret
//!
//! The beacon transport itself (BLE advertising and scanning) is
//! external; this crate only produces and consumes the beacon bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod eid;
pub mod error;
pub mod schedule;

pub use eid::{EID_SIZE, SEED_SIZE, beacon_seed, beacon_seed_now, decrypt_eid, generate_eid};
pub use error::DiscoveryError;
pub use schedule::{KeySchedule, QrSecret};
