//! Post-handshake frame dispatch.
//!
//! Every decrypted session payload starts with one type byte. The
//! assigned values: `0x00` post-handshake exchange (capability
//! advertisement, acknowledgment), `0x01` CTAP message, `0xA0`–`0xBF`
//! update frames carrying a channel nibble. Anything else aborts the
//! session — an unknown frame under an authenticated key means the
//! peer speaks a different protocol revision.

use crate::error::PairingError;

/// Frame type byte for post-handshake exchanges.
pub const FRAME_POST_HANDSHAKE: u8 = 0x00;

/// Frame type byte for CTAP messages.
pub const FRAME_CTAP: u8 = 0x01;

/// A decrypted session frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Post-handshake capability exchange or acknowledgment
    PostHandshake(Vec<u8>),
    /// CTAP request or response body
    Ctap(Vec<u8>),
    /// Update frame; the low nibble of the type byte selects a channel
    Update {
        /// Channel from the type byte's low nibble
        channel: u8,
        /// Frame body
        payload: Vec<u8>,
    },
}

impl Frame {
    /// Parse a decrypted payload into a typed frame.
    ///
    /// # Errors
    ///
    /// [`PairingError::EmptyFrame`] for zero-length payloads,
    /// [`PairingError::UnexpectedFrame`] for unassigned type bytes.
    pub fn parse(plaintext: &[u8]) -> Result<Self, PairingError> {
        let (&frame_type, payload) = plaintext.split_first().ok_or(PairingError::EmptyFrame)?;
        match frame_type {
            FRAME_POST_HANDSHAKE => Ok(Frame::PostHandshake(payload.to_vec())),
            FRAME_CTAP => Ok(Frame::Ctap(payload.to_vec())),
            0xa0..=0xbf => Ok(Frame::Update {
                channel: frame_type & 0x0f,
                payload: payload.to_vec(),
            }),
            other => {
                tracing::debug!(frame_type = other, "unassigned frame type");
                Err(PairingError::UnexpectedFrame(other))
            }
        }
    }

    /// Serialize back to a type byte plus body.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let (type_byte, payload) = match self {
            Frame::PostHandshake(payload) => (FRAME_POST_HANDSHAKE, payload),
            Frame::Ctap(payload) => (FRAME_CTAP, payload),
            Frame::Update { channel, payload } => (0xa0 | (channel & 0x0f), payload),
        };
        let mut out = Vec::with_capacity(1 + payload.len());
        out.push(type_byte);
        out.extend_from_slice(payload);
        out
    }
}

/// Split a CTAP frame body into its status byte and message body.
///
/// `None` when the body is empty; a bare status byte yields an empty
/// message.
#[must_use]
pub fn split_ctap_payload(payload: &[u8]) -> Option<(u8, &[u8])> {
    payload.split_first().map(|(&status, body)| (status, body))
}
