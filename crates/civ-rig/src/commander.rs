//! Rig Commander Actor
//!
//! The commander is the only owner of the state register. Clients (the
//! rigctld server, a GUI, tests) talk to it through a command channel;
//! transports hand it raw bytes and take encoded frames back through
//! send-only mailboxes, so there are no reference cycles between the
//! builder and its transports.
//!
//! # Architecture
//!
//! ```text
//!   clients ── CommanderCommand ──> commander ── Vec<u8> ──> transport
//!   transport ── Vec<u8> ─────────> commander ── RigEvent ─> observers
//! ```
//!
//! A client write marks register keys `updated`; the reconciliation pass
//! walks marked keys in key-enumeration order, emits the write and the
//! matching read, then settles the key optimistically. The rig's reply
//! re-confirms the value and clears nothing further.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use civ_protocol::command::{
    key_speed_wpm, parse_reply, wake_preamble_len, BreakInMode, CivOperation, CivReply, DuplexMode,
    FuncKind, LevelKind, MeterKind,
};
use civ_protocol::frame::{classify, CivFrame, FrameCodec, FrameRoute, BROADCAST_ADDR};
use civ_protocol::models::RigCapabilities;
use civ_protocol::spectrum::{ScopeEvent, SpectrumAssembler};
use civ_protocol::ProtocolError;

use crate::events::{AudioLevels, LinkStatus, RadioDescriptor, RigEvent};
use crate::state::{RigState, StateKey, StateValue};

/// Immutable per-session configuration, handed in by the embedder
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Our CI-V address on the bus
    pub controller_addr: u8,
    /// Serial baud rate; scales the power-on wake preamble
    pub baud_rate: u32,
    /// User preference overriding the model's RTS-for-PTT default
    pub rts_for_ptt_override: Option<bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            controller_addr: civ_protocol::DEFAULT_CONTROLLER_ADDR,
            baud_rate: 115_200,
            rts_for_ptt_override: None,
        }
    }
}

/// Commands accepted by the commander actor
#[derive(Debug)]
pub enum CommanderCommand {
    /// Send one typed operation to the rig, outside the register
    Execute(CivOperation),

    /// External write to the state register; triggers reconciliation
    SetState { key: StateKey, value: StateValue },

    /// Sweep all `updated` keys now
    Reconcile,

    /// Broadcast the rig-ID query to find a rig on the bus
    FindRigs,

    /// Snapshot the full register
    QueryState {
        respond: oneshot::Sender<RigState>,
    },

    /// Fetch the bound capability record, if identification has completed
    QueryCaps {
        respond: oneshot::Sender<Option<RigCapabilities>>,
    },

    /// Change the RTS-for-PTT preference mid-session
    SetRtsForPtt(bool),

    /// Transport status forwarded from a transport task
    LinkStatus(LinkStatus),

    /// A multi-radio unit published its radio list
    RadioSelection(Vec<RadioDescriptor>),

    /// Audio level telemetry from the LAN audio channel
    AudioLevels(AudioLevels),

    /// Stop the actor
    Shutdown,
}

struct Commander {
    config: SessionConfig,
    codec: FrameCodec,
    state: RigState,
    caps: Option<RigCapabilities>,
    assembler: Option<SpectrumAssembler>,
    discovered: bool,
    transport_tx: mpsc::Sender<Vec<u8>>,
    rts_tx: Option<mpsc::Sender<bool>>,
    event_tx: broadcast::Sender<RigEvent>,
}

/// Run the commander actor until shutdown
///
/// * `cmd_rx` - typed commands from clients
/// * `data_rx` - raw bytes from whichever transport is active
/// * `transport_tx` - encoded frames toward the rig
/// * `rts_tx` - RTS line control for rigs keyed through the serial port
/// * `event_tx` - broadcast stream of observable events
pub async fn run_commander(
    config: SessionConfig,
    mut cmd_rx: mpsc::Receiver<CommanderCommand>,
    mut data_rx: mpsc::Receiver<Vec<u8>>,
    transport_tx: mpsc::Sender<Vec<u8>>,
    rts_tx: Option<mpsc::Sender<bool>>,
    event_tx: broadcast::Sender<RigEvent>,
) {
    let mut commander = Commander {
        config,
        codec: FrameCodec::new(),
        state: RigState::new(),
        caps: None,
        assembler: None,
        discovered: false,
        transport_tx,
        rts_tx,
        event_tx,
    };

    info!("rig commander started");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(CommanderCommand::Shutdown) | None => break,
                    Some(cmd) => commander.handle_command(cmd).await,
                }
            }
            data = data_rx.recv() => {
                match data {
                    Some(bytes) => commander.handle_data(&bytes).await,
                    None => {
                        commander.emit(RigEvent::Status(LinkStatus::Disconnected));
                        break;
                    }
                }
            }
        }
    }

    info!("rig commander stopped");
}

impl Commander {
    fn emit(&self, event: RigEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn handle_command(&mut self, cmd: CommanderCommand) {
        match cmd {
            CommanderCommand::Execute(op) => {
                if let Err(e) = self.send_operation(&op).await {
                    warn!("operation failed: {}", e);
                }
            }
            CommanderCommand::SetState { key, value } => {
                self.state.set_from_client(key, value);
                self.reconcile().await;
            }
            CommanderCommand::Reconcile => self.reconcile().await,
            CommanderCommand::FindRigs => self.find_rigs().await,
            CommanderCommand::QueryState { respond } => {
                let _ = respond.send(self.state.clone());
            }
            CommanderCommand::QueryCaps { respond } => {
                let _ = respond.send(self.caps.clone());
            }
            CommanderCommand::SetRtsForPtt(enabled) => {
                self.config.rts_for_ptt_override = Some(enabled);
                if let Some(caps) = &mut self.caps {
                    caps.use_rts_for_ptt = enabled;
                }
            }
            CommanderCommand::LinkStatus(status) => {
                self.emit(RigEvent::Status(status));
            }
            CommanderCommand::RadioSelection(radios) => {
                self.emit(RigEvent::RadioSelectionRequired { radios });
            }
            CommanderCommand::AudioLevels(levels) => {
                self.emit(RigEvent::AudioLevels(levels));
            }
            CommanderCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    /// Broadcast `19 00` so any rig on the bus identifies itself
    async fn find_rigs(&mut self) {
        let frame = CivFrame::new(
            BROADCAST_ADDR,
            self.config.controller_addr,
            vec![0x19, 0x00],
        );
        debug!("broadcasting rig-ID query");
        let _ = self.transport_tx.send(frame.encode()).await;
    }

    async fn send_operation(&mut self, op: &CivOperation) -> Result<(), ProtocolError> {
        // Power-on needs the wake preamble and works without a bound rig.
        if matches!(op, CivOperation::PowerOn) {
            return self.send_power_on().await;
        }

        let caps = match &self.caps {
            Some(caps) => caps,
            None => {
                // Without an identified rig only the discovery query makes
                // sense; other traffic would go to an unknown address.
                if matches!(op, CivOperation::GetRigId) {
                    self.find_rigs().await;
                    return Ok(());
                }
                warn!("dropping {:?}: no rig identified yet", op);
                return Ok(());
            }
        };

        let payload = op.payload(caps)?;
        self.send_payload(payload).await;
        Ok(())
    }

    async fn send_power_on(&mut self) -> Result<(), ProtocolError> {
        let to = self
            .caps
            .as_ref()
            .map(|c| c.civ_address)
            .unwrap_or(BROADCAST_ADDR);
        let mut bytes = vec![0xFE; wake_preamble_len(self.config.baud_rate)];
        bytes.extend(CivFrame::new(to, self.config.controller_addr, vec![0x18, 0x01]).encode());
        debug!("sending power-on with {} wake bytes", bytes.len() - 7);
        let _ = self.transport_tx.send(bytes).await;
        Ok(())
    }

    async fn send_payload(&self, payload: Vec<u8>) {
        let to = self
            .caps
            .as_ref()
            .map(|c| c.civ_address)
            .unwrap_or(BROADCAST_ADDR);

        // Meter polls would swamp the log.
        if payload.first() != Some(&0x15) {
            trace!("tx payload {:02X?}", payload);
        }

        let frame = CivFrame::new(to, self.config.controller_addr, payload);
        let _ = self.transport_tx.send(frame.encode()).await;
    }

    /// Reconciliation pass: write then read for every marked key, in
    /// key-enumeration order
    async fn reconcile(&mut self) {
        let keys = self.state.updated_keys();
        if keys.is_empty() {
            return;
        }

        for key in keys {
            let ops = self.ops_for_key(key);
            for op in &ops {
                if let Err(e) = self.send_operation(op).await {
                    warn!("reconcile {:?}: {}", key, e);
                }
            }

            self.handle_rts_ptt(key).await;

            // Cleared exactly once even if the rig never replies; the
            // client sees the unconfirmed value until a read lands.
            self.state.settle(key);
        }
    }

    /// Drive the RTS line for PTT on rigs without a PTT command
    async fn handle_rts_ptt(&mut self, key: StateKey) {
        if key != StateKey::Ptt {
            return;
        }
        let use_rts = self
            .caps
            .as_ref()
            .map(|c| c.use_rts_for_ptt)
            .unwrap_or(false);
        if !use_rts {
            return;
        }
        if let Some(rts) = &self.rts_tx {
            let _ = rts.send(self.state.bool_of(StateKey::Ptt)).await;
        }
    }

    /// Write-then-read command pair for one register key
    fn ops_for_key(&self, key: StateKey) -> Vec<CivOperation> {
        use CivOperation as Op;

        let s = &self.state;
        let caps = match &self.caps {
            Some(caps) => caps,
            None => return Vec::new(),
        };

        match key {
            StateKey::CurrentVfo => {
                let vfo = if s.u8_of(key) == 0 {
                    civ_protocol::Vfo::A
                } else {
                    civ_protocol::Vfo::B
                };
                vec![Op::SelectVfo(vfo), Op::GetFrequency]
            }
            // The active VFO takes the plain set/read pair; only the
            // inactive VFO needs the 25 family.
            StateKey::VfoAFreq => vec![
                Op::SetFrequency { hz: s.u64_of(key) },
                Op::GetFrequency,
            ],
            StateKey::VfoBFreq => vec![
                Op::SetFrequencyVfo {
                    vfo: 1,
                    hz: s.u64_of(key),
                },
                Op::GetFrequencyVfo { vfo: 1 },
            ],
            StateKey::Mode | StateKey::Filter => {
                let code = s.u8_of(StateKey::Mode);
                match caps.mode_for_code(code) {
                    Some(mode) => vec![
                        Op::SetMode {
                            mode,
                            filter: s.u8_of(StateKey::Filter).clamp(1, 3),
                        },
                        Op::GetMode,
                    ],
                    None => Vec::new(),
                }
            }
            StateKey::DataMode => vec![
                Op::SetDataMode {
                    on: s.bool_of(key),
                    filter: s.u8_of(StateKey::Filter).clamp(1, 3),
                },
                Op::GetDataMode,
            ],
            StateKey::Passband => {
                let mode = caps
                    .mode_for_code(s.u8_of(StateKey::Mode))
                    .unwrap_or(civ_protocol::ModeKind::Usb);
                vec![
                    Op::SetFilterWidth {
                        passband_hz: s.u16_of(key),
                        mode,
                    },
                    Op::GetFilterWidth,
                ]
            }
            StateKey::Duplex => match DuplexMode::from_code(s.u8_of(key)) {
                Some(dm) => vec![Op::SetDuplex(dm), Op::GetSplit],
                None => Vec::new(),
            },
            StateKey::RitValue => vec![Op::SetRitValue(s.i32_of(key)), Op::GetRitValue],
            StateKey::RitEnabled => vec![Op::SetRitEnabled(s.bool_of(key)), Op::GetRitEnabled],
            StateKey::Ptt => {
                if caps.use_rts_for_ptt || !caps.has_ptt_cmd {
                    Vec::new()
                } else {
                    vec![Op::SetPtt(s.bool_of(key)), Op::GetPtt]
                }
            }
            StateKey::PowerStatus => {
                if s.bool_of(key) {
                    vec![Op::PowerOn]
                } else {
                    vec![Op::PowerOff]
                }
            }
            StateKey::Preamp => vec![Op::SetPreamp(s.u8_of(key)), Op::GetPreamp],
            StateKey::Attenuator => vec![Op::SetAttenuator(s.u8_of(key)), Op::GetAttenuator],
            StateKey::Antenna | StateKey::RxAntenna => vec![
                Op::SetAntenna {
                    antenna: s.u8_of(StateKey::Antenna),
                    rx: s.bool_of(StateKey::RxAntenna),
                },
                Op::GetAntenna,
            ],
            StateKey::Agc => vec![Op::SetAgc(s.u8_of(key)), Op::GetAgc],

            StateKey::AfGain => self.level_pair(LevelKind::AfGain, key),
            StateKey::RfGain => self.level_pair(LevelKind::RfGain, key),
            StateKey::Squelch => self.level_pair(LevelKind::Squelch, key),
            StateKey::MicGain => self.level_pair(LevelKind::MicGain, key),
            StateKey::CompLevel => self.level_pair(LevelKind::CompLevel, key),
            StateKey::MonitorGain => self.level_pair(LevelKind::MonitorGain, key),
            StateKey::VoxGain => self.level_pair(LevelKind::VoxGain, key),
            StateKey::AntiVoxGain => self.level_pair(LevelKind::AntiVoxGain, key),
            StateKey::TxPower => self.level_pair(LevelKind::TxPower, key),
            StateKey::NbLevel => self.level_pair(LevelKind::NbLevel, key),
            StateKey::NrLevel => self.level_pair(LevelKind::NrLevel, key),
            StateKey::CwPitch => self.level_pair(LevelKind::CwPitch, key),
            StateKey::KeySpeed => self.level_pair(LevelKind::KeySpeed, key),
            StateKey::NotchFreq => self.level_pair(LevelKind::NotchFreq, key),
            StateKey::PbtInner => self.level_pair(LevelKind::PbtInner, key),
            StateKey::PbtOuter => self.level_pair(LevelKind::PbtOuter, key),

            StateKey::NoiseBlankerFunc => self.func_pair(FuncKind::NoiseBlanker, key),
            StateKey::NoiseReductionFunc => self.func_pair(FuncKind::NoiseReduction, key),
            StateKey::AutoNotchFunc => self.func_pair(FuncKind::AutoNotch, key),
            StateKey::ToneFunc => self.func_pair(FuncKind::RepeaterTone, key),
            StateKey::TsqlFunc => self.func_pair(FuncKind::ToneSquelch, key),
            StateKey::CompFunc => self.func_pair(FuncKind::Compressor, key),
            StateKey::MonitorFunc => self.func_pair(FuncKind::Monitor, key),
            StateKey::VoxFunc => self.func_pair(FuncKind::Vox, key),
            StateKey::ManualNotchFunc => self.func_pair(FuncKind::ManualNotch, key),
            StateKey::LockFunc => self.func_pair(FuncKind::DialLock, key),
            StateKey::SatelliteFunc => self.func_pair(FuncKind::Satellite, key),
            StateKey::IpPlusFunc => self.func_pair(FuncKind::IpPlus, key),

            StateKey::SemiBreakInFunc | StateKey::FullBreakInFunc => {
                let mode = if s.bool_of(StateKey::FullBreakInFunc) {
                    BreakInMode::Full
                } else if s.bool_of(StateKey::SemiBreakInFunc) {
                    BreakInMode::Semi
                } else {
                    BreakInMode::Off
                };
                vec![Op::SetBreakIn(mode), Op::GetBreakIn]
            }
            StateKey::TunerFunc => vec![Op::SetAtu(s.bool_of(key)), Op::GetAtu],
            StateKey::ScopeFunc => vec![
                Op::ScopeDisplayEnable(s.bool_of(key)),
                Op::GetScopeDisplay,
            ],
            StateKey::MuteFunc => vec![Op::SetMute(s.bool_of(key)), Op::GetMute],

            StateKey::CtcssTone => vec![Op::SetTone(s.u16_of(key)), Op::GetTone],
            StateKey::TsqlTone => vec![Op::SetTsql(s.u16_of(key)), Op::GetTsql],
            StateKey::DtcsCode => vec![
                Op::SetDtcs {
                    code: s.u16_of(key),
                    tx_invert: false,
                    rx_invert: false,
                },
                Op::GetDtcs,
            ],
            StateKey::CsqlCode => vec![Op::SetCsql(s.u16_of(key)), Op::GetCsql],

            // Meters are read-only; a stray write settles quietly.
            StateKey::SMeter
            | StateKey::CenterMeter
            | StateKey::PowerMeter
            | StateKey::SwrMeter
            | StateKey::AlcMeter
            | StateKey::CompMeter
            | StateKey::VdMeter
            | StateKey::IdMeter => Vec::new(),
        }
    }

    fn level_pair(&self, kind: LevelKind, key: StateKey) -> Vec<CivOperation> {
        vec![
            CivOperation::SetLevel(kind, self.state.u8_of(key)),
            CivOperation::GetLevel(kind),
        ]
    }

    fn func_pair(&self, kind: FuncKind, key: StateKey) -> Vec<CivOperation> {
        vec![
            CivOperation::SetFunc(kind, self.state.bool_of(key)),
            CivOperation::GetFunc(kind),
        ]
    }

    async fn handle_data(&mut self, bytes: &[u8]) {
        self.codec.push_bytes(bytes);

        while let Some(frame) = self.codec.next_frame() {
            let rig_addr = self.caps.as_ref().map(|c| c.civ_address);
            match classify(&frame, self.config.controller_addr, rig_addr) {
                FrameRoute::Reply | FrameRoute::Unsolicited => self.handle_frame(frame),
                FrameRoute::BroadcastEcho => {
                    trace!("own broadcast query echoed back, rig not answering yet");
                }
                FrameRoute::Echo | FrameRoute::OtherEquipment => {}
            }
        }
    }

    fn handle_frame(&mut self, frame: CivFrame) {
        let reply = match parse_reply(&frame.payload) {
            Ok(reply) => reply,
            Err(e) => {
                trace!("dropping malformed payload: {}", e);
                return;
            }
        };

        // Meter and spectrum volume is too high to log frame-by-frame.
        if !matches!(
            reply,
            CivReply::Meter { .. } | CivReply::SpectrumFragment(_)
        ) {
            trace!("rx {:02X?} from 0x{:02X}", frame.payload, frame.from);
        }

        self.apply_reply(reply, frame.from);
    }

    fn set_and_notify(&mut self, key: StateKey, value: StateValue) {
        if self.state.set_from_rig(key, value) {
            self.emit(RigEvent::StateChanged { key, value });
        }
    }

    fn apply_reply(&mut self, reply: CivReply, from: u8) {
        match reply {
            CivReply::RigId { model_id } => self.bind_rig(model_id, from),

            CivReply::Frequency { hz, vfo } => {
                let key = match vfo {
                    Some(0) => StateKey::VfoAFreq,
                    Some(_) => StateKey::VfoBFreq,
                    None => {
                        if self.state.u8_of(StateKey::CurrentVfo) == 0 {
                            StateKey::VfoAFreq
                        } else {
                            StateKey::VfoBFreq
                        }
                    }
                };
                self.set_and_notify(key, StateValue::U64(hz));
            }
            CivReply::Mode { code, filter } => {
                self.set_and_notify(StateKey::Mode, StateValue::U8(code));
                if filter != 0 {
                    self.set_and_notify(StateKey::Filter, StateValue::U8(filter));
                }
            }
            CivReply::DataMode { on, filter } => {
                self.set_and_notify(StateKey::DataMode, StateValue::Bool(on));
                if on && filter != 0 {
                    self.set_and_notify(StateKey::Filter, StateValue::U8(filter));
                }
            }
            CivReply::Duplex(dm) => {
                self.set_and_notify(StateKey::Duplex, StateValue::U8(dm.code()));
            }
            CivReply::RptOffset { .. } => {}
            CivReply::Attenuator(att) => {
                self.set_and_notify(StateKey::Attenuator, StateValue::U8(att));
            }
            CivReply::Antenna { antenna, rx } => {
                self.set_and_notify(StateKey::Antenna, StateValue::U8(antenna));
                self.set_and_notify(StateKey::RxAntenna, StateValue::Bool(rx));
            }
            CivReply::Preamp(pre) => {
                self.set_and_notify(StateKey::Preamp, StateValue::U8(pre));
            }
            CivReply::Level { kind, value } => {
                let key = match kind {
                    LevelKind::AfGain => StateKey::AfGain,
                    LevelKind::RfGain => StateKey::RfGain,
                    LevelKind::Squelch => StateKey::Squelch,
                    LevelKind::NrLevel => StateKey::NrLevel,
                    LevelKind::PbtInner => StateKey::PbtInner,
                    LevelKind::PbtOuter => StateKey::PbtOuter,
                    LevelKind::CwPitch => StateKey::CwPitch,
                    LevelKind::TxPower => StateKey::TxPower,
                    LevelKind::MicGain => StateKey::MicGain,
                    LevelKind::KeySpeed => {
                        trace!("key speed raw {} = {} wpm", value, key_speed_wpm(value));
                        StateKey::KeySpeed
                    }
                    LevelKind::NotchFreq => StateKey::NotchFreq,
                    LevelKind::CompLevel => StateKey::CompLevel,
                    LevelKind::NbLevel => StateKey::NbLevel,
                    LevelKind::MonitorGain => StateKey::MonitorGain,
                    LevelKind::VoxGain => StateKey::VoxGain,
                    LevelKind::AntiVoxGain => StateKey::AntiVoxGain,
                };
                self.set_and_notify(key, StateValue::U8(value));
            }
            CivReply::Meter { kind, value } => {
                let key = match kind {
                    MeterKind::S => StateKey::SMeter,
                    MeterKind::Center => StateKey::CenterMeter,
                    MeterKind::Power => StateKey::PowerMeter,
                    MeterKind::Swr => StateKey::SwrMeter,
                    MeterKind::Alc => StateKey::AlcMeter,
                    MeterKind::Comp => StateKey::CompMeter,
                    MeterKind::Vd => StateKey::VdMeter,
                    MeterKind::Id => StateKey::IdMeter,
                };
                self.set_and_notify(key, StateValue::U8(value));
            }
            CivReply::Func { kind, on } => {
                let key = match kind {
                    FuncKind::NoiseBlanker => StateKey::NoiseBlankerFunc,
                    FuncKind::NoiseReduction => StateKey::NoiseReductionFunc,
                    FuncKind::AutoNotch => StateKey::AutoNotchFunc,
                    FuncKind::RepeaterTone => StateKey::ToneFunc,
                    FuncKind::ToneSquelch => StateKey::TsqlFunc,
                    FuncKind::Compressor => StateKey::CompFunc,
                    FuncKind::Monitor => StateKey::MonitorFunc,
                    FuncKind::Vox => StateKey::VoxFunc,
                    FuncKind::ManualNotch => StateKey::ManualNotchFunc,
                    FuncKind::DialLock => StateKey::LockFunc,
                    FuncKind::Satellite => StateKey::SatelliteFunc,
                    FuncKind::IpPlus => StateKey::IpPlusFunc,
                };
                self.set_and_notify(key, StateValue::Bool(on));
            }
            CivReply::BreakIn(mode) => {
                self.set_and_notify(
                    StateKey::SemiBreakInFunc,
                    StateValue::Bool(mode == BreakInMode::Semi),
                );
                self.set_and_notify(
                    StateKey::FullBreakInFunc,
                    StateValue::Bool(mode == BreakInMode::Full),
                );
            }
            CivReply::RptAccessMode(_) => {}
            CivReply::BandStack {
                band,
                reg_code,
                hz,
                mode_code,
                filter,
                data_mode,
            } => {
                self.emit(RigEvent::BandStack {
                    band,
                    reg_code,
                    hz,
                    mode_code,
                    filter,
                    data_mode,
                });
            }
            CivReply::FilterWidth { reg } => {
                let mode = self
                    .caps
                    .as_ref()
                    .and_then(|c| c.mode_for_code(self.state.u8_of(StateKey::Mode)))
                    .unwrap_or(civ_protocol::ModeKind::Usb);
                let hz = civ_protocol::command::filter_width_hz(reg, mode);
                self.set_and_notify(StateKey::Passband, StateValue::U16(hz));
            }
            CivReply::Agc(rate) => {
                self.set_and_notify(StateKey::Agc, StateValue::U8(rate));
            }
            CivReply::Mute(on) => {
                self.set_and_notify(StateKey::MuteFunc, StateValue::Bool(on));
            }
            CivReply::DetailedRegister { register, data } => {
                trace!("detailed register {:04} = {:02X?}", register, data);
            }
            CivReply::Tone(tone) => {
                self.set_and_notify(StateKey::CtcssTone, StateValue::U16(tone.value));
            }
            CivReply::Tsql(tone) => {
                self.set_and_notify(StateKey::TsqlTone, StateValue::U16(tone.value));
            }
            CivReply::Dtcs(tone) => {
                self.set_and_notify(StateKey::DtcsCode, StateValue::U16(tone.value));
            }
            CivReply::Csql(tone) => {
                self.set_and_notify(StateKey::CsqlCode, StateValue::U16(tone.value));
            }
            CivReply::Ptt(on) => {
                self.set_and_notify(StateKey::Ptt, StateValue::Bool(on));
            }
            CivReply::AtuStatus(status) => {
                self.set_and_notify(StateKey::TunerFunc, StateValue::Bool(status != 0));
            }
            CivReply::RitValue(hz) => {
                self.set_and_notify(StateKey::RitValue, StateValue::I32(hz));
            }
            CivReply::RitEnabled(on) => {
                self.set_and_notify(StateKey::RitEnabled, StateValue::Bool(on));
            }
            CivReply::SpectrumFragment(payload) => {
                let Some(assembler) = &mut self.assembler else {
                    trace!("spectrum before identification, dropping fragment");
                    return;
                };
                for event in assembler.push_fragment(&payload) {
                    match event {
                        ScopeEvent::Line(line) => self.emit(RigEvent::Spectrum(line)),
                        ScopeEvent::ModeChanged(mode) => {
                            self.emit(RigEvent::ScopeModeChanged(mode))
                        }
                        ScopeEvent::OutOfRange(oor) => self.emit(RigEvent::ScopeOutOfRange(oor)),
                    }
                }
            }
            CivReply::ScopeDisplayEnabled(on) => {
                self.set_and_notify(StateKey::ScopeFunc, StateValue::Bool(on));
            }
            CivReply::ScopeOutputEnabled(_) => {}
            CivReply::ScopeMode(mode) => self.emit(RigEvent::ScopeModeChanged(mode)),
            CivReply::ScopeSpan { .. } | CivReply::ScopeEdge(_) => {}
            CivReply::ScopeRefLevel(db) => self.emit(RigEvent::ScopeRefLevel(db)),
            CivReply::Ack => {}
            CivReply::Nak => {
                debug!("negative acknowledgement from rig");
                self.emit(RigEvent::NegativeAck);
            }
            CivReply::Unknown { cmd, sub } => {
                trace!("unknown reply cmd=0x{:02X} sub={:02X?}", cmd, sub);
            }
        }
    }

    /// Bind the responding rig: look up the catalogue, adopt its CI-V
    /// address, apply the RTS-for-PTT preference, announce it
    fn bind_rig(&mut self, model_id: u8, from: u8) {
        let mut caps = RigCapabilities::for_model(model_id, from);
        if let Some(rts) = self.config.rts_for_ptt_override {
            caps.use_rts_for_ptt = rts;
        }

        if !RigCapabilities::is_catalogued(model_id) {
            warn!("unknown rig model 0x{:02X}, using reduced capability", model_id);
        }

        self.assembler = Some(SpectrumAssembler::new(
            caps.spect_seq_max,
            caps.spect_len_max,
        ));

        let first = !self.discovered;
        self.discovered = true;
        self.caps = Some(caps.clone());

        if first {
            info!("discovered {} at CI-V 0x{:02X}", caps.name, from);
            self.emit(RigEvent::DiscoveredRig { caps });
        } else {
            self.emit(RigEvent::HaveRigId { caps });
        }
    }
}
