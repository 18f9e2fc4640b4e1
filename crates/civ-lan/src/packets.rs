//! Wire layout for the three UDP streams
//!
//! Every datagram starts with the same 10-byte header, little-endian:
//!
//! ```text
//! [0..2]  packet length (header + payload)
//! [2..4]  magic (packet type)
//! [4..6]  sequence number
//! [6..8]  sender's local ID
//! [8..10] sender's view of the remote ID
//! ```
//!
//! The control stream speaks the handshake and token types; the CI-V and
//! audio streams reuse the header with their own payload shapes.

use crate::error::LanError;

/// Header size shared by all three streams
pub const HEADER_LEN: usize = 10;

/// Are-you-there / idle ping
pub const MAGIC_PING: u16 = 0x03;
/// I-am-here reply to a ping
pub const MAGIC_HERE: u16 = 0x04;
/// Explicit disconnect
pub const MAGIC_DISCONNECT: u16 = 0x05;
/// Are-you-ready / I-am-ready
pub const MAGIC_READY: u16 = 0x06;
/// Acknowledgement of a sequenced control frame
pub const MAGIC_ACK: u16 = 0x07;
/// Login with obfuscated credentials
pub const MAGIC_LOGIN: u16 = 0x70;
/// Token request / renew / grant
pub const MAGIC_TOKEN: u16 = 0x71;
/// Ask the unit to open the CI-V and audio subchannels
pub const MAGIC_STREAM_REQUEST: u16 = 0x72;
/// Multi-radio unit publishing its radio list
pub const MAGIC_RADIO_LIST: u16 = 0x73;
/// Select one radio on a multi-radio unit
pub const MAGIC_RADIO_SELECT: u16 = 0x74;
/// Wrapped CI-V bytes on the CI-V stream
pub const MAGIC_CIV: u16 = 0xC1;
/// PCM payload on the audio stream
pub const MAGIC_AUDIO: u16 = 0xA1;

/// Token operations carried in the first payload byte of a token packet
pub const TOKEN_OP_REQUEST: u8 = 0x01;
pub const TOKEN_OP_RENEW: u8 = 0x02;
pub const TOKEN_OP_RELEASE: u8 = 0x03;
pub const TOKEN_OP_GRANT: u8 = 0x04;
pub const TOKEN_OP_REJECT: u8 = 0x05;

/// The common datagram header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub len: u16,
    pub magic: u16,
    pub seq: u16,
    pub local_id: u16,
    pub remote_id: u16,
}

impl PacketHeader {
    pub fn new(magic: u16, seq: u16, local_id: u16, remote_id: u16, payload_len: usize) -> Self {
        Self {
            len: (HEADER_LEN + payload_len) as u16,
            magic,
            seq,
            local_id,
            remote_id,
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.len.to_le_bytes());
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&self.seq.to_le_bytes());
        out.extend_from_slice(&self.local_id.to_le_bytes());
        out.extend_from_slice(&self.remote_id.to_le_bytes());
    }

    pub fn parse(data: &[u8]) -> Result<Self, LanError> {
        if data.len() < HEADER_LEN {
            return Err(LanError::ShortPacket(data.len()));
        }
        let word = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);
        let header = Self {
            len: word(0),
            magic: word(2),
            seq: word(4),
            local_id: word(6),
            remote_id: word(8),
        };
        if header.len as usize != data.len() {
            return Err(LanError::LengthMismatch {
                declared: header.len,
                actual: data.len(),
            });
        }
        Ok(header)
    }
}

/// A parsed datagram: header plus its payload slice, copied out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn parse(data: &[u8]) -> Result<Self, LanError> {
        let header = PacketHeader::parse(data)?;
        Ok(Self {
            header,
            payload: data[HEADER_LEN..].to_vec(),
        })
    }
}

fn packet(magic: u16, seq: u16, local: u16, remote: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    PacketHeader::new(magic, seq, local, remote, payload.len()).write_to(&mut out);
    out.extend_from_slice(payload);
    out
}

/// Bare control packet with no payload
pub fn control(magic: u16, seq: u16, local: u16, remote: u16) -> Vec<u8> {
    packet(magic, seq, local, remote, &[])
}

/// Acknowledge a received sequenced frame
pub fn ack(acked_seq: u16, local: u16, remote: u16) -> Vec<u8> {
    packet(MAGIC_ACK, acked_seq, local, remote, &[])
}

/// Login packet: 32 obfuscated username bytes, 32 obfuscated password bytes
pub fn login(seq: u16, local: u16, remote: u16, username: &[u8; 32], password: &[u8; 32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(64);
    payload.extend_from_slice(username);
    payload.extend_from_slice(password);
    packet(MAGIC_LOGIN, seq, local, remote, &payload)
}

/// Token packet: operation byte, pad byte, 32-bit token little-endian
pub fn token(seq: u16, local: u16, remote: u16, op: u8, token: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(6);
    payload.push(op);
    payload.push(0);
    payload.extend_from_slice(&token.to_le_bytes());
    packet(MAGIC_TOKEN, seq, local, remote, &payload)
}

/// Parse the payload of a token packet into (op, token)
pub fn parse_token_payload(payload: &[u8]) -> Result<(u8, u32), LanError> {
    if payload.len() < 6 {
        return Err(LanError::ShortPacket(payload.len()));
    }
    let value = u32::from_le_bytes([payload[2], payload[3], payload[4], payload[5]]);
    Ok((payload[0], value))
}

/// Ask the unit to open the CI-V and audio subchannels on our ports
pub fn stream_request(seq: u16, local: u16, remote: u16, civ_port: u16, audio_port: u16) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4);
    payload.extend_from_slice(&civ_port.to_le_bytes());
    payload.extend_from_slice(&audio_port.to_le_bytes());
    packet(MAGIC_STREAM_REQUEST, seq, local, remote, &payload)
}

/// Select a radio on a multi-radio unit
pub fn radio_select(seq: u16, local: u16, remote: u16, index: u8) -> Vec<u8> {
    packet(MAGIC_RADIO_SELECT, seq, local, remote, &[index])
}

/// One entry of a radio-list payload: index, busy flag, 16-byte name
pub const RADIO_ENTRY_LEN: usize = 18;

/// Parse the payload of a radio-list packet
pub fn parse_radio_list(payload: &[u8]) -> Vec<(u8, bool, String)> {
    payload
        .chunks_exact(RADIO_ENTRY_LEN)
        .map(|chunk| {
            let name_bytes = &chunk[2..RADIO_ENTRY_LEN];
            let end = name_bytes
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(name_bytes.len());
            let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();
            (chunk[0], chunk[1] != 0, name)
        })
        .collect()
}

/// Wrap CI-V bytes for the CI-V stream: 32-bit connection ID, then data
pub fn civ_data(seq: u16, local: u16, remote: u16, conn_id: u32, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + data.len());
    payload.extend_from_slice(&conn_id.to_le_bytes());
    payload.extend_from_slice(data);
    packet(MAGIC_CIV, seq, local, remote, &payload)
}

/// Unwrap a CI-V stream payload into (connection ID, CI-V bytes)
pub fn parse_civ_payload(payload: &[u8]) -> Result<(u32, &[u8]), LanError> {
    if payload.len() < 4 {
        return Err(LanError::ShortPacket(payload.len()));
    }
    let conn_id = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    Ok((conn_id, &payload[4..]))
}

/// Audio packet: 32-bit sample timestamp, then sample bytes
pub fn audio_data(seq: u16, local: u16, remote: u16, timestamp: u32, samples: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + samples.len());
    payload.extend_from_slice(&timestamp.to_le_bytes());
    payload.extend_from_slice(samples);
    packet(MAGIC_AUDIO, seq, local, remote, &payload)
}

/// Unwrap an audio payload into (timestamp, samples)
pub fn parse_audio_payload(payload: &[u8]) -> Result<(u32, &[u8]), LanError> {
    if payload.len() < 4 {
        return Err(LanError::ShortPacket(payload.len()));
    }
    let ts = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    Ok((ts, &payload[4..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn header_roundtrip() {
        let bytes = control(MAGIC_PING, 7, 0x1234, 0x5678);
        assert_eq!(bytes.len(), HEADER_LEN);

        let header = PacketHeader::parse(&bytes).unwrap();
        assert_eq!(header.magic, MAGIC_PING);
        assert_eq!(header.seq, 7);
        assert_eq!(header.local_id, 0x1234);
        assert_eq!(header.remote_id, 0x5678);
    }

    #[test]
    fn length_mismatch_rejected() {
        let mut bytes = control(MAGIC_PING, 1, 1, 2);
        bytes.push(0xAA);
        assert!(matches!(
            PacketHeader::parse(&bytes),
            Err(LanError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn login_layout() {
        let user = [0x11u8; 32];
        let pass = [0x22u8; 32];
        let bytes = login(3, 1, 2, &user, &pass);
        assert_eq!(bytes.len(), HEADER_LEN + 64);

        let pkt = Packet::parse(&bytes).unwrap();
        assert_eq!(pkt.header.magic, MAGIC_LOGIN);
        assert_eq!(&pkt.payload[..32], &user);
        assert_eq!(&pkt.payload[32..], &pass);
    }

    #[test]
    fn token_roundtrip() {
        let bytes = token(9, 1, 2, TOKEN_OP_REQUEST, 0xDEADBEEF);
        let pkt = Packet::parse(&bytes).unwrap();
        let (op, value) = parse_token_payload(&pkt.payload).unwrap();
        assert_eq!(op, TOKEN_OP_REQUEST);
        assert_eq!(value, 0xDEADBEEF);
    }

    #[test]
    fn civ_wrapper_roundtrip() {
        let civ = [0xFE, 0xFE, 0xE1, 0x94, 0xFB, 0xFD];
        let bytes = civ_data(4, 1, 2, 0xCAFE0001, &civ);
        let pkt = Packet::parse(&bytes).unwrap();
        let (conn, data) = parse_civ_payload(&pkt.payload).unwrap();
        assert_eq!(conn, 0xCAFE0001);
        assert_eq!(data, civ);
    }

    #[test]
    fn radio_list_parse() {
        let mut payload = Vec::new();
        payload.push(0);
        payload.push(0);
        payload.extend_from_slice(b"IC-7851 MAIN\0\0\0\0");
        payload.push(1);
        payload.push(1);
        payload.extend_from_slice(b"IC-7851 SUB\0\0\0\0\0");

        let radios = parse_radio_list(&payload);
        assert_eq!(radios.len(), 2);
        assert_eq!(radios[0], (0, false, "IC-7851 MAIN".to_string()));
        assert_eq!(radios[1], (1, true, "IC-7851 SUB".to_string()));
    }

    proptest! {
        #[test]
        fn parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = Packet::parse(&data);
            let _ = parse_token_payload(&data);
            let _ = parse_civ_payload(&data);
            let _ = parse_audio_payload(&data);
            let _ = parse_radio_list(&data);
        }

        #[test]
        fn audio_roundtrip(ts: u32, samples in proptest::collection::vec(any::<u8>(), 0..256)) {
            let bytes = audio_data(0, 1, 2, ts, &samples);
            let pkt = Packet::parse(&bytes).unwrap();
            let (got_ts, got) = parse_audio_payload(&pkt.payload).unwrap();
            prop_assert_eq!(got_ts, ts);
            prop_assert_eq!(got, &samples[..]);
        }
    }
}
