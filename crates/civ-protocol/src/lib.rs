//! Icom CI-V Protocol Library
//!
//! Parsing and encoding for the CI-V control protocol spoken by Icom
//! transceivers, plus the per-model capability catalogue that decides how
//! each operation goes on the wire.
//!
//! # Frame Format
//! ```text
//! FE FE [to] [from] [cmd] [subcmd] [data...] FD
//! ```
//!
//! # Architecture
//!
//! - [`frame`]: streaming frame codec and address routing
//! - [`bcd`]: the little-endian BCD number encoding frequencies ride in
//! - [`models`]: static capability records keyed by model-ID byte
//! - [`command`]: typed operations to payload bytes, and the reply parser
//! - [`tone`]: CTCSS/DTCS wire encoding
//! - [`spectrum`]: multi-fragment panadapter line reassembly
//!
//! Everything here is pure and synchronous; transports and actors live in
//! the sibling crates.
//!
//! # Example
//!
//! ```rust
//! use civ_protocol::command::{parse_reply, CivOperation, CivReply};
//! use civ_protocol::frame::{CivFrame, FrameCodec};
//! use civ_protocol::models::RigCapabilities;
//!
//! let caps = RigCapabilities::for_model(0x94, 0x94);
//! let payload = CivOperation::SetFrequency { hz: 14_250_000 }
//!     .payload(&caps)
//!     .unwrap();
//! let frame = CivFrame::new(caps.civ_address, 0xE1, payload);
//! assert_eq!(
//!     frame.encode(),
//!     vec![0xFE, 0xFE, 0x94, 0xE1, 0x05, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]
//! );
//!
//! let mut codec = FrameCodec::new();
//! codec.push_bytes(&[0xFE, 0xFE, 0xE1, 0x94, 0x03, 0x00, 0x60, 0x45, 0x14, 0x00, 0x00, 0xFD]);
//! let reply = codec.next_frame().unwrap();
//! assert!(matches!(
//!     parse_reply(&reply.payload),
//!     Ok(CivReply::Frequency { hz: 14_456_000, .. })
//! ));
//! ```

pub mod bcd;
pub mod command;
pub mod error;
pub mod frame;
pub mod models;
pub mod spectrum;
pub mod tone;

pub use command::{
    parse_reply, BreakInMode, CivOperation, CivReply, DuplexMode, FuncKind, LevelKind, MeterKind,
    SpectrumMode, Vfo,
};
pub use error::{ParseError, ProtocolError};
pub use frame::{classify, CivFrame, FrameCodec, FrameRoute, DEFAULT_CONTROLLER_ADDR};
pub use models::{Band, BandId, CenterSpan, ModeKind, ModelRecord, RigCapabilities, RigInput};
pub use spectrum::{ScopeEvent, SpectrumAssembler, SpectrumLine};
pub use tone::Tone;
