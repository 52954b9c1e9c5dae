//! CTAP codec error types.

use thiserror::Error;

/// Hard decode failures.
///
/// Most malformed input is reported as `None` by the response decoders
/// so the caller can discard the buffer and move on; these errors are
/// reserved for the cases where continuing would return a partially
/// filled structure (missing required fields) or where the input is
/// outside the supported encoding subset entirely.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CtapError {
    /// Buffer ended before the current item was complete
    #[error("truncated input at offset {offset}, needed {needed} more bytes")]
    Truncated {
        /// Cursor position when the shortfall was detected
        offset: usize,
        /// Bytes still required by the current item
        needed: usize,
    },

    /// Item header outside the supported encoding subset
    #[error("unsupported item header 0x{0:02x}")]
    UnsupportedHeader(u8),

    /// A field the response format requires was absent after a full walk
    #[error("required field missing: {0}")]
    MissingField(&'static str),

    /// Input bytes left over after the top-level item
    #[error("trailing bytes after top-level item")]
    TrailingBytes,

    /// Container nesting beyond the decoder's fixed bound
    #[error("nesting depth limit exceeded")]
    DepthExceeded,

    /// Text string item holding invalid UTF-8
    #[error("text string is not valid utf-8")]
    InvalidUtf8,
}
