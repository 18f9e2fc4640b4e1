//! Control-channel state machine
//!
//! ```text
//! Disconnected -> AreYouThere -> AreYouReady -> Login -> TokenRequest
//!     -> Connected <-> TokenRenew
//!     Connected -> (RequestStream) -> Streaming
//!     * -> Disconnected on missed pings, logout, or token rejection
//! ```
//!
//! The machine itself is pure: packets and 100 ms ticks go in, actions
//! come out. The async runner in [`crate::transport`] owns the socket and
//! timers. That split keeps every transition unit-testable without a
//! radio on the bench.

use tracing::{debug, info, warn};

use crate::error::LanError;
use crate::packets::{self, Packet};
use crate::passcode::encode_credential;

/// Idle ping cadence
pub const TICK_MS: u64 = 100;
/// Consecutive unanswered pings before the channel is declared dead
pub const PING_DEADLINE_TICKS: u32 = 3;
/// Retransmit a pending frame after this many ticks without an ack (~150 ms)
const RETRANSMIT_AFTER_TICKS: u32 = 2;
/// Attempts per frame before giving up
const RETRANSMIT_LIMIT: u8 = 4;
/// Token renewal cadence (60 s of 100 ms ticks)
const REAUTH_TICKS: u32 = 600;
/// Token grant deadline (1 s)
const TOKEN_DEADLINE_TICKS: u32 = 10;
/// Replay window: sequences remembered for duplicate suppression
const REPLAY_WINDOW: usize = 32;

/// Connection states, in handshake order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    AreYouThere,
    AreYouReady,
    Login,
    TokenRequest,
    TokenRenew,
    Connected,
    Streaming,
}

/// What the runner should do after feeding the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send these bytes on the control socket
    Send(Vec<u8>),
    /// Open the CI-V and audio subchannels
    OpenStreams,
    /// The unit published a radio list; user must choose before streaming
    RadioSelectionRequired(Vec<RadioInfo>),
    /// Authentication and token exchange completed
    Connected,
    /// Tear the session down (all three channels)
    Teardown(TeardownReason),
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownReason {
    LinkDead(u32),
    AuthRejected,
    RemoteDisconnect,
    RetransmitExhausted(u16),
}

impl TeardownReason {
    pub fn into_error(self) -> LanError {
        match self {
            TeardownReason::LinkDead(misses) => LanError::LinkDead(misses),
            TeardownReason::AuthRejected => LanError::AuthRejected,
            TeardownReason::RemoteDisconnect => LanError::LinkDead(0),
            TeardownReason::RetransmitExhausted(seq) => LanError::RetransmitExhausted(seq),
        }
    }
}

/// One radio on a multi-radio unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioInfo {
    pub index: u8,
    pub name: String,
    pub busy: bool,
}

struct PendingFrame {
    seq: u16,
    bytes: Vec<u8>,
    age_ticks: u32,
    attempts: u8,
}

/// The pure control-channel machine
pub struct ControlMachine {
    state: LinkState,
    seq: u16,
    local_id: u16,
    remote_id: u16,
    token: u32,
    username: [u8; 32],
    password: [u8; 32],
    civ_port: u16,
    audio_port: u16,

    ticks_since_pong: u32,
    reauth_ticks: u32,
    token_wait_ticks: u32,

    pending: Vec<PendingFrame>,
    replay: Vec<u16>,

    radios: Vec<RadioInfo>,
    selected_radio: Option<u8>,
    wants_streams: bool,
}

impl ControlMachine {
    pub fn new(
        local_id: u16,
        username: &str,
        password: &str,
        civ_port: u16,
        audio_port: u16,
    ) -> Self {
        Self {
            state: LinkState::Disconnected,
            seq: 0,
            local_id,
            remote_id: 0,
            token: 0,
            username: encode_credential(username),
            password: encode_credential(password),
            civ_port,
            audio_port,
            ticks_since_pong: 0,
            reauth_ticks: 0,
            token_wait_ticks: 0,
            pending: Vec::new(),
            replay: Vec::new(),
            radios: Vec::new(),
            selected_radio: None,
            wants_streams: true,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn token(&self) -> u32 {
        self.token
    }

    fn next_seq(&mut self) -> u16 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    /// Begin the handshake: first are-you-there goes out immediately,
    /// then once per tick until answered
    pub fn start(&mut self) -> Vec<Action> {
        info!("opening control channel");
        self.state = LinkState::AreYouThere;
        self.ticks_since_pong = 0;
        vec![self.send_ping()]
    }

    fn send_ping(&mut self) -> Action {
        let seq = self.next_seq();
        Action::Send(packets::control(
            packets::MAGIC_PING,
            seq,
            self.local_id,
            self.remote_id,
        ))
    }

    /// Queue a sequenced frame that needs acknowledgement
    fn send_tracked(&mut self, build: impl FnOnce(u16, u16, u16) -> Vec<u8>) -> Action {
        let seq = self.next_seq();
        let bytes = build(seq, self.local_id, self.remote_id);
        self.pending.push(PendingFrame {
            seq,
            bytes: bytes.clone(),
            age_ticks: 0,
            attempts: 1,
        });
        Action::Send(bytes)
    }

    /// One 100 ms tick: idle pings, liveness, retransmission, reauth
    pub fn on_tick(&mut self) -> Vec<Action> {
        if self.state == LinkState::Disconnected {
            return Vec::new();
        }

        let mut actions = Vec::new();

        self.ticks_since_pong += 1;
        if self.ticks_since_pong >= PING_DEADLINE_TICKS && self.state != LinkState::AreYouThere {
            warn!(
                "{} consecutive pings unanswered, closing",
                self.ticks_since_pong
            );
            return self.teardown(TeardownReason::LinkDead(self.ticks_since_pong));
        }

        actions.push(self.send_ping());

        // Retransmission sweep
        let mut gave_up = None;
        for frame in &mut self.pending {
            frame.age_ticks += 1;
            if frame.age_ticks >= RETRANSMIT_AFTER_TICKS {
                if frame.attempts >= RETRANSMIT_LIMIT {
                    gave_up = Some(frame.seq);
                    break;
                }
                frame.age_ticks = 0;
                frame.attempts += 1;
                debug!("retransmitting seq {} (attempt {})", frame.seq, frame.attempts);
                actions.push(Action::Send(frame.bytes.clone()));
            }
        }
        if let Some(seq) = gave_up {
            return self.teardown(TeardownReason::RetransmitExhausted(seq));
        }

        // Token renewal and grant deadline
        match self.state {
            LinkState::Connected | LinkState::Streaming => {
                self.reauth_ticks += 1;
                if self.reauth_ticks >= REAUTH_TICKS {
                    // Streams stay open while the renewal is in flight.
                    self.reauth_ticks = 0;
                    self.token_wait_ticks = 0;
                    self.state = LinkState::TokenRenew;
                    let token = self.token;
                    actions.push(self.send_tracked(|seq, local, remote| {
                        packets::token(seq, local, remote, packets::TOKEN_OP_RENEW, token)
                    }));
                }
            }
            LinkState::TokenRequest | LinkState::TokenRenew => {
                self.token_wait_ticks += 1;
                if self.token_wait_ticks >= TOKEN_DEADLINE_TICKS {
                    warn!("token exchange timed out");
                    return self.teardown(TeardownReason::AuthRejected);
                }
            }
            _ => {}
        }

        actions
    }

    /// Feed one received control datagram
    pub fn on_packet(&mut self, data: &[u8]) -> Vec<Action> {
        let packet = match Packet::parse(data) {
            Ok(p) => p,
            Err(e) => {
                debug!("dropping control packet: {}", e);
                return Vec::new();
            }
        };

        // Duplicate suppression over the last 32 sequences; pure keep-alive
        // traffic is exempt because both sides free-run their counters.
        let sequenced = !matches!(
            packet.header.magic,
            packets::MAGIC_PING | packets::MAGIC_HERE | packets::MAGIC_READY | packets::MAGIC_ACK
        );
        if sequenced {
            if self.replay.contains(&packet.header.seq) {
                debug!("duplicate seq {}, dropped", packet.header.seq);
                return Vec::new();
            }
            self.replay.push(packet.header.seq);
            if self.replay.len() > REPLAY_WINDOW {
                self.replay.remove(0);
            }
        }

        self.remote_id = packet.header.local_id;
        self.ticks_since_pong = 0;

        match packet.header.magic {
            packets::MAGIC_HERE => self.on_here(),
            packets::MAGIC_READY => self.on_ready(),
            packets::MAGIC_PING => {
                // Answer the unit's own liveness probe.
                vec![Action::Send(packets::control(
                    packets::MAGIC_HERE,
                    packet.header.seq,
                    self.local_id,
                    self.remote_id,
                ))]
            }
            packets::MAGIC_ACK => {
                self.pending.retain(|f| f.seq != packet.header.seq);
                Vec::new()
            }
            packets::MAGIC_TOKEN => self.on_token(&packet),
            packets::MAGIC_RADIO_LIST => self.on_radio_list(&packet),
            packets::MAGIC_DISCONNECT => self.teardown(TeardownReason::RemoteDisconnect),
            other => {
                debug!("unhandled control magic 0x{:04X}", other);
                Vec::new()
            }
        }
    }

    fn on_here(&mut self) -> Vec<Action> {
        if self.state != LinkState::AreYouThere {
            return Vec::new();
        }
        debug!("unit is there, asking if ready");
        self.state = LinkState::AreYouReady;
        vec![Action::Send(packets::control(
            packets::MAGIC_READY,
            self.next_seq(),
            self.local_id,
            self.remote_id,
        ))]
    }

    fn on_ready(&mut self) -> Vec<Action> {
        if self.state != LinkState::AreYouReady {
            return Vec::new();
        }
        debug!("unit ready, logging in");
        self.state = LinkState::Login;
        let (username, password) = (self.username, self.password);
        vec![self.send_tracked(|seq, local, remote| {
            packets::login(seq, local, remote, &username, &password)
        })]
    }

    fn on_token(&mut self, packet: &Packet) -> Vec<Action> {
        let Ok((op, value)) = packets::parse_token_payload(&packet.payload) else {
            return Vec::new();
        };

        match (op, self.state) {
            // Login accepted: the unit answers with a token offer we must
            // formally request. The reply supersedes the pending login.
            (packets::TOKEN_OP_GRANT, LinkState::Login) => {
                self.pending.clear();
                self.state = LinkState::TokenRequest;
                self.token = value;
                self.token_wait_ticks = 0;
                debug!("login accepted, requesting token");
                vec![self.send_tracked(|seq, local, remote| {
                    packets::token(seq, local, remote, packets::TOKEN_OP_REQUEST, value)
                })]
            }
            (packets::TOKEN_OP_GRANT, LinkState::TokenRequest) => {
                self.pending.clear();
                self.token = value;
                self.reauth_ticks = 0;
                self.state = LinkState::Connected;
                info!("control channel connected, token 0x{:08X}", value);

                let mut actions = vec![Action::Connected];
                actions.extend(self.maybe_open_streams());
                actions
            }
            (packets::TOKEN_OP_GRANT, LinkState::TokenRenew) => {
                self.pending.clear();
                self.token = value;
                self.reauth_ticks = 0;
                self.state = if self.selected_radio.is_some() || self.radios.is_empty() {
                    LinkState::Streaming
                } else {
                    LinkState::Connected
                };
                Vec::new()
            }
            (packets::TOKEN_OP_REJECT, _) => {
                warn!("token rejected by unit");
                self.teardown(TeardownReason::AuthRejected)
            }
            _ => Vec::new(),
        }
    }

    fn on_radio_list(&mut self, packet: &Packet) -> Vec<Action> {
        let radios: Vec<RadioInfo> = packets::parse_radio_list(&packet.payload)
            .into_iter()
            .map(|(index, busy, name)| RadioInfo { index, busy, name })
            .collect();

        if radios.len() <= 1 {
            // Single-radio unit: nothing to choose.
            return Vec::new();
        }

        info!("unit exposes {} radios", radios.len());
        self.radios = radios.clone();
        self.selected_radio = None;
        vec![Action::RadioSelectionRequired(radios)]
    }

    /// User picked a radio on a multi-radio unit
    pub fn select_radio(&mut self, index: u8) -> Vec<Action> {
        if let Some(radio) = self.radios.iter().find(|r| r.index == index) {
            if radio.busy {
                let name = radio.name.clone();
                warn!("radio {} is busy", name);
                return vec![Action::RadioSelectionRequired(self.radios.clone())];
            }
        }
        self.selected_radio = Some(index);
        let seq = self.next_seq();
        let mut actions = vec![Action::Send(packets::radio_select(
            seq,
            self.local_id,
            self.remote_id,
            index,
        ))];
        actions.extend(self.maybe_open_streams());
        actions
    }

    /// Promote to Streaming once auth is done and any required radio
    /// selection has happened
    fn maybe_open_streams(&mut self) -> Vec<Action> {
        if self.state != LinkState::Connected || !self.wants_streams {
            return Vec::new();
        }
        if !self.radios.is_empty() && self.selected_radio.is_none() {
            return Vec::new();
        }

        self.state = LinkState::Streaming;
        // Untracked: a lost request shows up as silent subchannels and the
        // keep-alive logic there recovers.
        let seq = self.next_seq();
        let request = packets::stream_request(
            seq,
            self.local_id,
            self.remote_id,
            self.civ_port,
            self.audio_port,
        );
        vec![Action::Send(request), Action::OpenStreams]
    }

    /// Explicit logout; also the teardown path for every failure
    pub fn disconnect(&mut self) -> Vec<Action> {
        if self.state == LinkState::Disconnected {
            return Vec::new();
        }
        let bye = packets::control(
            packets::MAGIC_DISCONNECT,
            self.next_seq(),
            self.local_id,
            self.remote_id,
        );
        self.reset();
        vec![Action::Send(bye)]
    }

    fn teardown(&mut self, reason: TeardownReason) -> Vec<Action> {
        self.reset();
        vec![Action::Teardown(reason)]
    }

    fn reset(&mut self) {
        self.state = LinkState::Disconnected;
        // Pending frames are dropped without replay.
        self.pending.clear();
        self.replay.clear();
        self.radios.clear();
        self.selected_radio = None;
        self.ticks_since_pong = 0;
        self.reauth_ticks = 0;
        self.token_wait_ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake(machine: &mut ControlMachine) {
        machine.start();
        machine.on_packet(&packets::control(packets::MAGIC_HERE, 1, 0xBEEF, 0));
        machine.on_packet(&packets::control(packets::MAGIC_READY, 2, 0xBEEF, 0));
        // Login accepted with a token offer, then the grant.
        machine.on_packet(&packets::token(3, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x1111));
        machine.on_packet(&packets::token(4, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x1111));
    }

    #[test]
    fn handshake_reaches_streaming() {
        let mut machine = ControlMachine::new(0xCAFE, "user", "pass", 50002, 50003);

        let actions = machine.start();
        assert_eq!(machine.state(), LinkState::AreYouThere);
        assert!(matches!(actions[0], Action::Send(_)));

        let actions = machine.on_packet(&packets::control(packets::MAGIC_HERE, 1, 0xBEEF, 0));
        assert_eq!(machine.state(), LinkState::AreYouReady);
        assert_eq!(actions.len(), 1);

        let actions = machine.on_packet(&packets::control(packets::MAGIC_READY, 2, 0xBEEF, 0));
        assert_eq!(machine.state(), LinkState::Login);
        // Login carries the folded credentials.
        let Action::Send(login) = &actions[0] else {
            panic!("expected login send");
        };
        assert_eq!(login.len(), packets::HEADER_LEN + 64);

        machine.on_packet(&packets::token(3, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x2222));
        assert_eq!(machine.state(), LinkState::TokenRequest);

        let actions =
            machine.on_packet(&packets::token(4, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x2222));
        assert_eq!(machine.state(), LinkState::Streaming);
        assert!(actions.contains(&Action::Connected));
        assert!(actions.contains(&Action::OpenStreams));
        assert_eq!(machine.token(), 0x2222);
    }

    #[test]
    fn three_missed_pings_kill_the_link() {
        let mut machine = ControlMachine::new(1, "u", "p", 50002, 50003);
        handshake(&mut machine);
        assert_eq!(machine.state(), LinkState::Streaming);

        let mut dead = None;
        for _ in 0..4 {
            for action in machine.on_tick() {
                if let Action::Teardown(reason) = action {
                    dead = Some(reason);
                }
            }
        }

        assert!(matches!(dead, Some(TeardownReason::LinkDead(3))));
        assert_eq!(machine.state(), LinkState::Disconnected);
    }

    #[test]
    fn pings_answered_keep_the_link_alive() {
        let mut machine = ControlMachine::new(1, "u", "p", 50002, 50003);
        handshake(&mut machine);

        for i in 0..20u16 {
            let actions = machine.on_tick();
            assert!(
                !actions.iter().any(|a| matches!(a, Action::Teardown(_))),
                "tick {i} tore down a healthy link"
            );
            machine.on_packet(&packets::control(packets::MAGIC_HERE, 100 + i, 0xBEEF, 0));
        }
        assert_eq!(machine.state(), LinkState::Streaming);
    }

    #[test]
    fn token_rejection_tears_down_without_retry() {
        let mut machine = ControlMachine::new(1, "u", "p", 50002, 50003);
        handshake(&mut machine);

        let actions =
            machine.on_packet(&packets::token(9, 0xBEEF, 0, packets::TOKEN_OP_REJECT, 0));
        assert!(matches!(
            actions[0],
            Action::Teardown(TeardownReason::AuthRejected)
        ));
        assert_eq!(machine.state(), LinkState::Disconnected);
        assert!(machine.on_tick().is_empty());
    }

    #[test]
    fn unacked_frames_retransmit_then_give_up() {
        let mut machine = ControlMachine::new(1, "u", "p", 50002, 50003);
        machine.start();
        machine.on_packet(&packets::control(packets::MAGIC_HERE, 1, 0xBEEF, 0));
        // Login is now pending and will never be acked, but the unit keeps
        // answering pings so only retransmission can fail.
        machine.on_packet(&packets::control(packets::MAGIC_READY, 2, 0xBEEF, 0));

        let mut sends = 0;
        let mut exhausted = false;
        for i in 0..20u16 {
            for action in machine.on_tick() {
                match action {
                    Action::Send(bytes) => {
                        if bytes.len() == packets::HEADER_LEN + 64 {
                            sends += 1;
                        }
                    }
                    Action::Teardown(TeardownReason::RetransmitExhausted(_)) => {
                        exhausted = true;
                    }
                    _ => {}
                }
            }
            if exhausted {
                break;
            }
            machine.on_packet(&packets::control(packets::MAGIC_HERE, 300 + i, 0xBEEF, 0));
        }

        assert!(exhausted, "retransmission never gave up");
        assert_eq!(sends, 3, "one initial send plus three retries tracked on tick");
    }

    #[test]
    fn duplicate_sequences_dropped_by_replay_window() {
        let mut machine = ControlMachine::new(1, "u", "p", 50002, 50003);
        machine.start();
        machine.on_packet(&packets::control(packets::MAGIC_HERE, 1, 0xBEEF, 0));
        machine.on_packet(&packets::control(packets::MAGIC_READY, 2, 0xBEEF, 0));

        let grant = packets::token(3, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x1234);
        let first = machine.on_packet(&grant);
        assert!(!first.is_empty());

        // Replayed datagram: same sequence, no effect.
        let second = machine.on_packet(&grant);
        assert!(second.is_empty());
    }

    #[test]
    fn multi_radio_gates_streaming_on_selection() {
        let mut machine = ControlMachine::new(1, "u", "p", 50002, 50003);
        machine.start();
        machine.on_packet(&packets::control(packets::MAGIC_HERE, 1, 0xBEEF, 0));
        machine.on_packet(&packets::control(packets::MAGIC_READY, 2, 0xBEEF, 0));

        // Radio list arrives before the token grant completes.
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(b"MAIN\0\0\0\0\0\0\0\0\0\0\0\0");
        payload.extend_from_slice(&[1, 0]);
        payload.extend_from_slice(b"SUB\0\0\0\0\0\0\0\0\0\0\0\0\0");
        let mut list = Vec::new();
        packets::PacketHeader::new(packets::MAGIC_RADIO_LIST, 3, 0xBEEF, 0, payload.len())
            .write_to(&mut list);
        list.extend_from_slice(&payload);

        let actions = machine.on_packet(&list);
        assert!(matches!(actions[0], Action::RadioSelectionRequired(_)));

        machine.on_packet(&packets::token(4, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x1));
        let actions = machine.on_packet(&packets::token(5, 0xBEEF, 0, packets::TOKEN_OP_GRANT, 0x1));
        // Connected but not streaming until a radio is chosen.
        assert!(actions.contains(&Action::Connected));
        assert!(!actions.contains(&Action::OpenStreams));
        assert_eq!(machine.state(), LinkState::Connected);

        let actions = machine.select_radio(0);
        assert!(actions.contains(&Action::OpenStreams));
        assert_eq!(machine.state(), LinkState::Streaming);
    }
}
