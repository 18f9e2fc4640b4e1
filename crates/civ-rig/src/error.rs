//! Error types for the rig commander

use thiserror::Error;

/// Errors that can occur while driving a rig
#[derive(Debug, Error)]
pub enum RigError {
    /// The capability record says this operation is unavailable
    #[error("unsupported operation: {0}")]
    Unsupported(#[from] civ_protocol::ProtocolError),

    /// No rig has been identified yet
    #[error("no rig bound; identification has not completed")]
    NoRig,

    /// The transport mailbox is gone
    #[error("transport closed")]
    TransportClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
