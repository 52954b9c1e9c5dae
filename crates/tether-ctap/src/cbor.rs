//! Canonical compact-map codec for CTAP2 message bodies.
//!
//! CTAP2 bodies are maps from small integer keys to typed values in the
//! deterministic encoding: minimal-length item heads and map keys sorted
//! by their encoded form (shorter first, then bytewise). Two conforming
//! encoders agree byte-for-byte, which matters because the handshake
//! transcript and the session AEAD both cover these bytes exactly.
//!
//! The decoder accepts definite-length items only. Indefinite lengths,
//! tags, floats and reserved heads are outside the supported subset and
//! fail decoding; the response layer treats that as "canonical parse
//! failed" and falls back to [`crate::raw_reader::RawReader`].

use crate::error::CtapError;

/// Container nesting bound; authenticator messages are shallow.
const MAX_DEPTH: usize = 8;

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_SIMPLE: u8 = 7;

/// A decoded compact-map item.
///
/// Maps preserve entry order as a pair list; [`Value::encode`] sorts
/// keys canonically, so insertion order never leaks onto the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Non-negative integer
    Unsigned(u64),
    /// Negative integer, stored as `n` for the value `-1 - n`
    Negative(u64),
    /// Byte string
    Bytes(Vec<u8>),
    /// UTF-8 text string
    Text(String),
    /// Definite-length array
    Array(Vec<Value>),
    /// Definite-length map as ordered key/value pairs
    Map(Vec<(Value, Value)>),
    /// Boolean simple value
    Bool(bool),
}

impl Value {
    /// Convenience constructor for a byte-string value.
    pub fn bytes(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }

    /// Convenience constructor for a text-string value.
    pub fn text(s: &str) -> Self {
        Value::Text(s.to_owned())
    }

    /// Encode canonically into a fresh buffer.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Unsigned(n) => write_head(out, MAJOR_UNSIGNED, *n),
            Value::Negative(n) => write_head(out, MAJOR_NEGATIVE, *n),
            Value::Bytes(b) => {
                write_head(out, MAJOR_BYTES, b.len() as u64);
                out.extend_from_slice(b);
            }
            Value::Text(s) => {
                write_head(out, MAJOR_TEXT, s.len() as u64);
                out.extend_from_slice(s.as_bytes());
            }
            Value::Array(items) => {
                write_head(out, MAJOR_ARRAY, items.len() as u64);
                for item in items {
                    item.encode_into(out);
                }
            }
            Value::Map(entries) => {
                write_head(out, MAJOR_MAP, entries.len() as u64);
                // Canonical key order: shorter encoded key first, then
                // bytewise. The head byte carries the major type in its
                // top bits, so type order falls out of the comparison.
                let mut encoded: Vec<(Vec<u8>, &Value)> = entries
                    .iter()
                    .map(|(k, v)| (k.encode(), v))
                    .collect();
                encoded.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
                for (key_bytes, value) in encoded {
                    out.extend_from_slice(&key_bytes);
                    value.encode_into(out);
                }
            }
            Value::Bool(b) => out.push(if *b { 0xf5 } else { 0xf4 }),
        }
    }

    /// Decode a single top-level item, rejecting trailing bytes.
    pub fn decode(input: &[u8]) -> Result<Value, CtapError> {
        let mut cursor = Cursor { input, position: 0 };
        let value = cursor.decode_item(0)?;
        if cursor.position != input.len() {
            return Err(CtapError::TrailingBytes);
        }
        Ok(value)
    }

    /// The contained unsigned integer, if this is one.
    pub fn as_unsigned(&self) -> Option<u64> {
        match self {
            Value::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    /// The contained byte string, if this is one.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The contained text string, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The contained array, if this is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The contained map entries, if this is a map.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The contained boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a map entry by key; `None` for non-maps too.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a map entry under an unsigned integer key.
    pub fn map_get_int(&self, key: u64) -> Option<&Value> {
        self.map_get(&Value::Unsigned(key))
    }

    /// Look up a map entry under a text key.
    pub fn map_get_text(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }
}

fn write_head(out: &mut Vec<u8>, major: u8, value: u64) {
    let m = major << 5;
    if value < 24 {
        out.push(m | value as u8);
    } else if value <= u64::from(u8::MAX) {
        out.push(m | 24);
        out.push(value as u8);
    } else if value <= u64::from(u16::MAX) {
        out.push(m | 25);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u64::from(u32::MAX) {
        out.push(m | 26);
        out.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        out.push(m | 27);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

struct Cursor<'a> {
    input: &'a [u8],
    position: usize,
}

impl Cursor<'_> {
    fn take(&mut self, length: usize) -> Result<&[u8], CtapError> {
        let remaining = self.input.len() - self.position;
        if length > remaining {
            return Err(CtapError::Truncated {
                offset: self.position,
                needed: length - remaining,
            });
        }
        let slice = &self.input[self.position..self.position + length];
        self.position += length;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, CtapError> {
        Ok(self.take(1)?[0])
    }

    /// Read an item head, returning `(major, argument)`.
    fn read_head(&mut self) -> Result<(u8, u64), CtapError> {
        let initial = self.take_u8()?;
        let major = initial >> 5;
        let info = initial & 0x1f;
        let argument = match info {
            0..=23 => u64::from(info),
            24 => u64::from(self.take_u8()?),
            25 => {
                let b = self.take(2)?;
                u64::from(u16::from_be_bytes([b[0], b[1]]))
            }
            26 => {
                let b = self.take(4)?;
                u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            }
            27 => {
                let b = self.take(8)?;
                u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
            // 28-30 reserved, 31 indefinite
            _ => return Err(CtapError::UnsupportedHeader(initial)),
        };
        Ok((major, argument))
    }

    fn decode_item(&mut self, depth: usize) -> Result<Value, CtapError> {
        if depth > MAX_DEPTH {
            return Err(CtapError::DepthExceeded);
        }
        let head_offset = self.position;
        let (major, argument) = self.read_head()?;
        match major {
            MAJOR_UNSIGNED => Ok(Value::Unsigned(argument)),
            MAJOR_NEGATIVE => Ok(Value::Negative(argument)),
            MAJOR_BYTES => {
                let length = arg_to_length(argument, self.position)?;
                Ok(Value::Bytes(self.take(length)?.to_vec()))
            }
            MAJOR_TEXT => {
                let length = arg_to_length(argument, self.position)?;
                let raw = self.take(length)?;
                let text = std::str::from_utf8(raw).map_err(|_| CtapError::InvalidUtf8)?;
                Ok(Value::Text(text.to_owned()))
            }
            MAJOR_ARRAY => {
                let count = arg_to_length(argument, self.position)?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(self.decode_item(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            MAJOR_MAP => {
                let count = arg_to_length(argument, self.position)?;
                let mut entries = Vec::new();
                for _ in 0..count {
                    let key = self.decode_item(depth + 1)?;
                    let value = self.decode_item(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            MAJOR_SIMPLE => match argument {
                20 => Ok(Value::Bool(false)),
                21 => Ok(Value::Bool(true)),
                _ => Err(CtapError::UnsupportedHeader(self.input[head_offset])),
            },
            // major 6 (tags) and anything else
            _ => Err(CtapError::UnsupportedHeader(self.input[head_offset])),
        }
    }
}

fn arg_to_length(argument: u64, offset: usize) -> Result<usize, CtapError> {
    usize::try_from(argument).map_err(|_| CtapError::Truncated {
        offset,
        needed: usize::MAX,
    })
}
