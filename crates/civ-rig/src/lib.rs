//! Rig state register and commander actor
//!
//! This crate owns the shared observable state of a connected rig and the
//! actor that mediates between clients, the CI-V builder/parser, and the
//! byte transports.
//!
//! - [`state`]: the key/value register with `valid` and `updated` flags
//! - [`commander`]: the async actor that drives the rig and reconciles
//!   external writes (write the new value, then read it back)
//! - [`events`]: the broadcast event stream observers subscribe to
//!
//! Transports stay decoupled: they receive a send-only mailbox for inbound
//! bytes and hand status changes back as [`commander::CommanderCommand`]s.

pub mod commander;
pub mod error;
pub mod events;
pub mod state;

pub use commander::{run_commander, CommanderCommand, SessionConfig};
pub use error::RigError;
pub use events::{AudioLevels, LinkStatus, RadioDescriptor, RigEvent};
pub use state::{default_passband, RigState, StateKey, StateValue};
