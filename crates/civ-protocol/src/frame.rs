//! CI-V frame layer
//!
//! Frames look like:
//!
//! ```text
//! FE FE [to] [from] [cmd] [subcmd] [data...] FD
//! ```
//!
//! - `FE FE`: preamble
//! - `to`: destination address (rig address, controller address, or 0x00 broadcast)
//! - `from`: source address
//! - `FD`: terminator
//!
//! The stream side splits a raw byte buffer on `FD`, tolerating multiple
//! concatenated frames and partial tails. A fragment that begins with a
//! single `FE` gets the missing preamble byte restored (serial echoes often
//! lose the first byte); anything else that does not start `FE FE` is
//! dropped. A body containing a stray `FE` marks the frame corrupt.

use crate::error::ParseError;

/// CI-V frame preamble byte
pub const PREAMBLE: u8 = 0xFE;
/// CI-V frame terminator byte
pub const TERMINATOR: u8 = 0xFD;
/// Default controller address; kept in session config, not hardwired
pub const DEFAULT_CONTROLLER_ADDR: u8 = 0xE1;
/// Broadcast address used for rig discovery
pub const BROADCAST_ADDR: u8 = 0x00;

/// Spectrum frames over LAN can run past 500 bytes
const MAX_BUFFER_LEN: usize = 4096;

/// A parsed CI-V frame
///
/// `payload` is `cmd [subcmd] [data...]` with the preamble, addresses, and
/// terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivFrame {
    /// Destination address
    pub to: u8,
    /// Source address
    pub from: u8,
    /// Command, subcommand, and data bytes
    pub payload: Vec<u8>,
}

impl CivFrame {
    /// Create a frame
    pub fn new(to: u8, from: u8, payload: Vec<u8>) -> Self {
        Self { to, from, payload }
    }

    /// The command byte
    pub fn command(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// The subcommand byte
    pub fn subcommand(&self) -> Option<u8> {
        self.payload.get(1).copied()
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 5);
        out.push(PREAMBLE);
        out.push(PREAMBLE);
        out.push(self.to);
        out.push(self.from);
        out.extend_from_slice(&self.payload);
        out.push(TERMINATOR);
        out
    }
}

/// Where an incoming frame is headed, from the controller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRoute {
    /// Addressed to us: a reply to something we sent
    Reply,
    /// Addressed to 0x00: a rig-initiated update (user turned the dial)
    Unsolicited,
    /// Our own broadcast query echoed back (to 0x00, from us)
    BroadcastEcho,
    /// Local echo of a command we transmitted
    Echo,
    /// Traffic for other equipment on the CI-V bus
    OtherEquipment,
}

/// Classify a frame against the session's controller address and the rig
/// address, once bound.
pub fn classify(frame: &CivFrame, controller_addr: u8, rig_addr: Option<u8>) -> FrameRoute {
    // 0xE0 was the conventional controller address before 0xE1; replies to
    // either are for us.
    if frame.to == controller_addr || frame.to == 0xE0 {
        return FrameRoute::Reply;
    }
    if frame.to == BROADCAST_ADDR {
        if frame.from == controller_addr {
            return FrameRoute::BroadcastEcho;
        }
        return FrameRoute::Unsolicited;
    }
    if Some(frame.to) == rig_addr {
        return FrameRoute::Echo;
    }
    FrameRoute::OtherEquipment
}

/// Streaming CI-V frame codec
///
/// Push raw transport bytes in, pull complete frames out. Malformed
/// fragments are dropped without disturbing the rest of the stream.
pub struct FrameCodec {
    buffer: Vec<u8>,
}

impl FrameCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(256),
        }
    }

    /// Push raw bytes into the codec's buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if self.buffer.len() > MAX_BUFFER_LEN {
            let start = self.buffer.len() - MAX_BUFFER_LEN / 2;
            self.buffer.drain(..start);
        }
    }

    /// Try to extract the next complete frame from the buffer
    pub fn next_frame(&mut self) -> Option<CivFrame> {
        loop {
            let term = self.buffer.iter().position(|&b| b == TERMINATOR)?;
            let mut fragment: Vec<u8> = self.buffer.drain(..=term).collect();
            fragment.pop(); // terminator

            match Self::parse_fragment(fragment) {
                Ok(frame) => return Some(frame),
                Err(e) => {
                    tracing::trace!("dropping CI-V fragment: {}", e);
                    continue;
                }
            }
        }
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn parse_fragment(mut fragment: Vec<u8>) -> Result<CivFrame, ParseError> {
        if fragment.is_empty() {
            return Err(ParseError::MalformedFrame("empty fragment".into()));
        }

        // Echo recovery: a local echo sometimes loses the first preamble byte.
        if fragment[0] == PREAMBLE && fragment.get(1) != Some(&PREAMBLE) {
            fragment.insert(0, PREAMBLE);
        }

        if fragment.len() < 5 || fragment[0] != PREAMBLE || fragment[1] != PREAMBLE {
            return Err(ParseError::MalformedFrame("missing preamble".into()));
        }

        let to = fragment[2];
        let from = fragment[3];
        let payload = fragment.split_off(4);

        if payload.contains(&PREAMBLE) {
            return Err(ParseError::MalformedFrame("0xFE inside body".into()));
        }

        Ok(CivFrame { to, from, payload })
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_single_frame() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&[0xFE, 0xFE, 0xE1, 0x94, 0xFB, 0xFD]);

        let frame = codec.next_frame().unwrap();
        assert_eq!(frame.to, 0xE1);
        assert_eq!(frame.from, 0x94);
        assert_eq!(frame.payload, vec![0xFB]);
        assert!(codec.next_frame().is_none());
    }

    #[test]
    fn parse_concatenated_frames() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&[
            0xFE, 0xFE, 0xE1, 0x94, 0xFB, 0xFD, // ack
            0xFE, 0xFE, 0xE1, 0x94, 0x1C, 0x00, 0x01, 0xFD, // ptt on
        ]);

        assert_eq!(codec.next_frame().unwrap().payload, vec![0xFB]);
        assert_eq!(codec.next_frame().unwrap().payload, vec![0x1C, 0x00, 0x01]);
    }

    #[test]
    fn partial_frame_waits_for_more() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&[0xFE, 0xFE, 0xE1, 0x94]);
        assert!(codec.next_frame().is_none());
        codec.push_bytes(&[0xFB, 0xFD]);
        assert!(codec.next_frame().is_some());
    }

    #[test]
    fn echo_recovery_prepends_missing_preamble() {
        let mut codec = FrameCodec::new();
        // Local echo lost the first FE.
        codec.push_bytes(&[0xFE, 0x94, 0xE1, 0x03, 0xFD]);

        let frame = codec.next_frame().unwrap();
        assert_eq!(frame.to, 0x94);
        assert_eq!(frame.from, 0xE1);
        assert_eq!(frame.payload, vec![0x03]);
    }

    #[test]
    fn garbage_fragment_dropped_stream_continues() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&[0x12, 0x34, 0xFD, 0xFE, 0xFE, 0xE1, 0x94, 0xFB, 0xFD]);

        let frame = codec.next_frame().unwrap();
        assert_eq!(frame.payload, vec![0xFB]);
    }

    #[test]
    fn stray_preamble_in_body_drops_frame() {
        let mut codec = FrameCodec::new();
        codec.push_bytes(&[0xFE, 0xFE, 0xE1, 0x94, 0x03, 0xFE, 0x00, 0xFD]);
        assert!(codec.next_frame().is_none());
    }

    #[test]
    fn encode_reference_frame() {
        let frame = CivFrame::new(0x94, 0xE1, vec![0x05, 0x00, 0x00, 0x25, 0x14, 0x00]);
        assert_eq!(
            frame.encode(),
            vec![0xFE, 0xFE, 0x94, 0xE1, 0x05, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD]
        );
    }

    #[test]
    fn classify_routes() {
        let reply = CivFrame::new(0xE1, 0x94, vec![0xFB]);
        assert_eq!(classify(&reply, 0xE1, Some(0x94)), FrameRoute::Reply);

        let unsolicited = CivFrame::new(0x00, 0x94, vec![0x00]);
        assert_eq!(
            classify(&unsolicited, 0xE1, Some(0x94)),
            FrameRoute::Unsolicited
        );

        let broadcast_echo = CivFrame::new(0x00, 0xE1, vec![0x19, 0x00]);
        assert_eq!(
            classify(&broadcast_echo, 0xE1, None),
            FrameRoute::BroadcastEcho
        );

        let echo = CivFrame::new(0x94, 0xE1, vec![0x03]);
        assert_eq!(classify(&echo, 0xE1, Some(0x94)), FrameRoute::Echo);

        let other = CivFrame::new(0x5C, 0x94, vec![0x03]);
        assert_eq!(classify(&other, 0xE1, Some(0x94)), FrameRoute::OtherEquipment);
    }

    proptest! {
        #[test]
        fn parser_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut codec = FrameCodec::new();
            codec.push_bytes(&data);
            while codec.next_frame().is_some() {}
        }

        #[test]
        fn roundtrip_wellformed_frames(
            to in 0u8..=0x7F,
            from in 0u8..=0x7F,
            payload in proptest::collection::vec(0u8..0xFD, 1..16),
        ) {
            let frame = CivFrame::new(to, from, payload);
            let mut codec = FrameCodec::new();
            codec.push_bytes(&frame.encode());
            prop_assert_eq!(codec.next_frame().unwrap(), frame);
        }
    }
}
