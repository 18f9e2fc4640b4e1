//! Error types for CI-V parsing and encoding

use thiserror::Error;

/// Errors that can occur while parsing CI-V data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Frame structure is invalid (bad preamble, stray 0xFE in body, short frame)
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A BCD nibble was outside 0..=9
    #[error("invalid BCD digit in byte 0x{0:02X}")]
    InvalidBcd(u8),

    /// Payload shorter than the command requires
    #[error("truncated payload: need {needed} bytes, have {have}")]
    TruncatedPayload { needed: usize, have: usize },

    /// Spectrum fragment did not fit the expected sequence
    #[error("spectrum fragment out of sequence: got {got}, expected {expected}")]
    FragmentOutOfSequence { got: u8, expected: u8 },
}

/// Higher-level protocol errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The capability record says the rig cannot do this
    #[error("operation not supported by {model}: {operation}")]
    Unsupported {
        model: String,
        operation: &'static str,
    },

    /// Value outside the encodable range
    #[error("value out of range: {0}")]
    OutOfRange(String),
}
