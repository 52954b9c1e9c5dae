//! # tether-ctap
//!
//! CTAP2 message codec for the tether pairing transport.
//!
//! Encodes outgoing authenticator requests as a command byte plus a
//! canonical compact map, and decodes responses through a two-path
//! pipeline: a strict canonical parser whose failures surface as
//! `None`, and a defensive manual byte walker invoked as a fallback.
//! The only hard failures are required fields missing after a full
//! fallback walk and inputs outside the supported encoding subset.
//!
//! Also carries the mechanical CTAP1/APDU framing for the legacy
//! compatibility boundary. Transmission of any of these buffers is the
//! caller's concern; this crate never performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod apdu;
pub mod cbor;
pub mod error;
pub mod raw_reader;
pub mod request;
pub mod response;

pub use apdu::{CommandApdu, ResponseApdu};
pub use cbor::Value;
pub use error::CtapError;
pub use request::{
    ClientPinRequest, Ctap2Command, Ctap2Request, GetAssertionRequest, MakeCredentialRequest,
    get_info_request, get_next_assertion_request,
};
pub use response::{
    GetAssertionResponse, GetInfoResponse, MakeCredentialResponse, decode_get_assertion,
    decode_get_info, decode_make_credential, extract_credential_id,
};
