//! Error types for the LAN transport

use thiserror::Error;

/// Errors raised by the UDP triple-stream
#[derive(Debug, Error)]
pub enum LanError {
    /// Datagram shorter than its header
    #[error("short packet: {0} bytes")]
    ShortPacket(usize),

    /// Declared length disagrees with the datagram size
    #[error("length mismatch: header says {declared}, datagram is {actual}")]
    LengthMismatch { declared: u16, actual: usize },

    /// Keep-alive quorum lost
    #[error("link dead: {0} consecutive pings unanswered")]
    LinkDead(u32),

    /// Login or token refused by the unit
    #[error("authentication rejected")]
    AuthRejected,

    /// The requested radio is in use by another operator
    #[error("radio busy: {0}")]
    Busy(String),

    /// Retransmission gave up on a control frame
    #[error("retransmit limit reached for seq {0}")]
    RetransmitExhausted(u16),

    /// Underlying socket failure
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}
