//! Hand-rolled byte walker for the fallback response path.
//!
//! Some authenticators emit responses the canonical decoder refuses
//! (non-minimal heads, junk after the map, truncated trailing fields).
//! The fallback walks the byte stream directly, reading only the narrow
//! subset the response formats actually use: map heads with embedded
//! entry counts, byte strings with short/1-byte/2-byte lengths, and
//! text strings with short/1-byte lengths. 4-byte-length heads (0x5a,
//! 0x7a) and indefinite lengths stay a hard compatibility boundary.
//!
//! Invariant: the cursor never exceeds the buffer length; every read
//! either advances by exactly the bytes consumed or fails.

use crate::error::CtapError;

/// Cursor over a response buffer.
pub struct RawReader<'a> {
    source: &'a [u8],
    position: usize,
}

impl<'a> RawReader<'a> {
    /// Wrap a buffer with the cursor at the start.
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, CtapError> {
        let byte = *self
            .source
            .get(self.position)
            .ok_or(CtapError::Truncated {
                offset: self.position,
                needed: 1,
            })?;
        self.position += 1;
        Ok(byte)
    }

    /// Read exactly `length` bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8], CtapError> {
        let remaining = self.source.len() - self.position;
        if length > remaining {
            return Err(CtapError::Truncated {
                offset: self.position,
                needed: length - remaining,
            });
        }
        let slice = &self.source[self.position..self.position + length];
        self.position += length;
        Ok(slice)
    }

    /// Read a byte-string item (heads 0x40–0x57, 0x58, 0x59).
    pub fn read_byte_string(&mut self) -> Result<&'a [u8], CtapError> {
        let header = self.read_u8()?;
        match header {
            0x40..=0x57 => self.read_bytes(usize::from(header - 0x40)),
            0x58 => {
                let length = usize::from(self.read_u8()?);
                self.read_bytes(length)
            }
            0x59 => {
                let high = self.read_u8()?;
                let low = self.read_u8()?;
                self.read_bytes(usize::from(u16::from_be_bytes([high, low])))
            }
            _ => Err(CtapError::UnsupportedHeader(header)),
        }
    }

    /// Read a text-string item (heads 0x60–0x77, 0x78).
    pub fn read_text_string(&mut self) -> Result<&'a str, CtapError> {
        let header = self.read_u8()?;
        let raw = match header {
            0x60..=0x77 => self.read_bytes(usize::from(header - 0x60))?,
            0x78 => {
                let length = usize::from(self.read_u8()?);
                self.read_bytes(length)?
            }
            _ => return Err(CtapError::UnsupportedHeader(header)),
        };
        std::str::from_utf8(raw).map_err(|_| CtapError::InvalidUtf8)
    }

    /// Skip the next item.
    ///
    /// Short byte strings and text strings are consumed; any other head
    /// is treated as a zero-length item and only the head byte is
    /// consumed, matching the tolerant walk the fallback performs over
    /// fields it does not care about.
    pub fn skip_next(&mut self) -> Result<(), CtapError> {
        let header = self.read_u8()?;
        match header {
            0x40..=0x57 => {
                self.read_bytes(usize::from(header - 0x40))?;
            }
            0x58 => {
                let length = usize::from(self.read_u8()?);
                self.read_bytes(length)?;
            }
            0x59 => {
                let high = self.read_u8()?;
                let low = self.read_u8()?;
                self.read_bytes(usize::from(u16::from_be_bytes([high, low])))?;
            }
            0x60..=0x77 => {
                self.read_bytes(usize::from(header - 0x60))?;
            }
            0x78 => {
                let length = usize::from(self.read_u8()?);
                self.read_bytes(length)?;
            }
            _ => {}
        }
        Ok(())
    }
}
