//! Typed event stream out of the rig commander
//!
//! Everything observable (state changes, identification, spectrum lines,
//! link status) flows through one broadcast channel. Each event carries an
//! immutable value copy, so observers never share mutable state with the
//! commander.

use civ_protocol::command::SpectrumMode;
use civ_protocol::models::RigCapabilities;
use civ_protocol::spectrum::SpectrumLine;

use crate::state::{StateKey, StateValue};

/// Link status for whichever transport is in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    /// Keep-alive quorum lost; the session is being torn down
    LinkDead,
    /// Login or token refused; no retry without user action
    AuthRejected,
    /// Underlying serial or UDP failure
    TransportError(String),
    Disconnected,
}

/// One radio on a multi-radio LAN unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioDescriptor {
    pub index: u8,
    pub name: String,
    pub busy: bool,
    pub in_use_by: Option<String>,
}

/// Audio level telemetry from the LAN audio channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioLevels {
    pub rx_peak: u8,
    pub rx_rms: u8,
    pub tx_peak: u8,
    pub tx_rms: u8,
    pub underruns: u32,
}

/// Events emitted by the rig commander
#[derive(Debug, Clone, PartialEq)]
pub enum RigEvent {
    /// First successful identification of a rig
    DiscoveredRig { caps: RigCapabilities },
    /// Subsequent identification replies for an already-bound rig
    HaveRigId { caps: RigCapabilities },

    /// A register entry gained or changed a confirmed value
    StateChanged { key: StateKey, value: StateValue },

    /// One assembled panadapter line
    Spectrum(SpectrumLine),
    ScopeModeChanged(SpectrumMode),
    ScopeOutOfRange(bool),
    ScopeRefLevel(i32),

    /// Band-stack register contents
    BandStack {
        band: u8,
        reg_code: u8,
        hz: u64,
        mode_code: u8,
        filter: u8,
        data_mode: bool,
    },

    /// The rig rejected the most recent matching command
    NegativeAck,

    /// Transport status transition
    Status(LinkStatus),

    /// A multi-radio unit wants the user to pick a radio
    RadioSelectionRequired { radios: Vec<RadioDescriptor> },

    /// Audio path levels (RX/TX peak and RMS)
    AudioLevels(AudioLevels),
}
