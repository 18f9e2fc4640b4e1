//! Icom network transport
//!
//! Remote heads of LAN-capable Icom rigs speak a proprietary three-stream
//! UDP protocol: a control stream carrying the handshake, authentication,
//! and keep-alive; a CI-V stream tunnelling ordinary CI-V frames; and an
//! audio stream with its own sequencing and latency budget.
//!
//! - [`packets`]: datagram layouts shared by all three streams
//! - [`passcode`]: the credential folding the unit expects at login
//! - [`control`]: the pure handshake/keep-alive/token state machine
//! - [`audio`]: jitter buffer and level metering
//! - [`transport`]: the async task owning the sockets and timers
//!
//! The commander never sees any of this; it receives plain CI-V bytes on
//! a channel, exactly as it would from a serial port.

pub mod audio;
pub mod control;
pub mod error;
pub mod packets;
pub mod passcode;
pub mod transport;

pub use audio::{AudioFrame, JitterBuffer, LevelRing};
pub use control::{ControlMachine, LinkState, RadioInfo};
pub use error::LanError;
pub use transport::{LanCommand, LanConfig, LanEvent, LanSession};
