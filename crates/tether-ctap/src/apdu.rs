//! Smart-card style APDU framing for the legacy CTAP1/U2F boundary.
//!
//! Mechanical layer, no cryptographic content: four fixed header bytes,
//! then request data with a 1-byte (short) or 2-byte (extended) length
//! prefix, then an optional expected-response length. Extended form is
//! selected automatically when the data exceeds 255 bytes or the
//! expected response length exceeds 256.

use crate::error::CtapError;

/// Success status word.
pub const SW_SUCCESS: u16 = 0x9000;

/// User presence required; the caller retries after a touch.
pub const SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985;

/// Command APDU builder.
#[derive(Debug, Clone)]
pub struct CommandApdu {
    /// Instruction class
    pub cla: u8,
    /// Instruction code
    pub ins: u8,
    /// First parameter byte
    pub p1: u8,
    /// Second parameter byte
    pub p2: u8,
    /// Request payload
    pub data: Vec<u8>,
    /// Expected response length, `None` when no response body is wanted
    pub expected_len: Option<u32>,
}

impl CommandApdu {
    /// APDU with a payload and no expected-length field.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data,
            expected_len: None,
        }
    }

    /// Set the expected response length.
    #[must_use]
    pub fn with_expected_len(mut self, expected_len: u32) -> Self {
        self.expected_len = Some(expected_len);
        self
    }

    fn is_extended(&self) -> bool {
        self.data.len() > 255 || self.expected_len.is_some_and(|ne| ne > 256)
    }

    /// Serialize to wire form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.cla, self.ins, self.p1, self.p2];

        if self.is_extended() {
            // Extended marker, then 2-byte lengths
            out.push(0x00);
            if !self.data.is_empty() {
                out.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
                out.extend_from_slice(&self.data);
            }
            if let Some(ne) = self.expected_len {
                // 65536 is encoded as 0x0000
                out.extend_from_slice(&(ne as u16).to_be_bytes());
            }
        } else {
            if !self.data.is_empty() {
                out.push(self.data.len() as u8);
                out.extend_from_slice(&self.data);
            }
            if let Some(ne) = self.expected_len {
                // 256 is encoded as 0x00
                out.push(ne as u8);
            }
        }
        out
    }
}

/// Parsed response APDU: payload plus the 2-byte status trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    /// Response payload
    pub data: Vec<u8>,
    /// Status word
    pub status: u16,
}

impl ResponseApdu {
    /// Split a raw response into payload and status word.
    ///
    /// # Errors
    ///
    /// [`CtapError::Truncated`] when the buffer is shorter than the
    /// 2-byte trailer.
    pub fn parse(bytes: &[u8]) -> Result<Self, CtapError> {
        if bytes.len() < 2 {
            return Err(CtapError::Truncated {
                offset: bytes.len(),
                needed: 2 - bytes.len(),
            });
        }
        let (data, trailer) = bytes.split_at(bytes.len() - 2);
        Ok(Self {
            data: data.to_vec(),
            status: u16::from_be_bytes([trailer[0], trailer[1]]),
        })
    }

    /// Whether the status word is `0x9000`.
    pub fn is_success(&self) -> bool {
        self.status == SW_SUCCESS
    }
}
