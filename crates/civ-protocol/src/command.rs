//! Typed CI-V command building and reply parsing
//!
//! [`CivOperation`] turns a typed request into the `cmd [sub] [data…]`
//! payload for a specific rig, consulting its capability record for
//! model-dependent register addresses. [`parse_reply`] is the inverse
//! direction: a dispatch on `payload[0]`, then `payload[1]`, producing a
//! [`CivReply`]. Unknown command pairs never abort the stream; they come
//! back as [`CivReply::Unknown`] and the caller moves on.

use crate::bcd::{byte_from_bcd, byte_to_bcd, freq_from_bcd, freq_to_bcd, u16_from_bcd, u16_to_bcd};
use crate::error::{ParseError, ProtocolError};
use crate::models::{CenterSpan, ModeKind, RigCapabilities, RigInput};
use crate::tone::Tone;

/// VFO selectors for command 0x07
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vfo {
    A,
    B,
    Main,
    Sub,
}

impl Vfo {
    fn code(&self) -> u8 {
        match self {
            Vfo::A => 0x00,
            Vfo::B => 0x01,
            Vfo::Main => 0xD0,
            Vfo::Sub => 0xD1,
        }
    }
}

/// Duplex / split selector carried by command 0x0F
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplexMode {
    SplitOff,
    SplitOn,
    Simplex,
    DupMinus,
    DupPlus,
}

impl DuplexMode {
    pub fn code(&self) -> u8 {
        match self {
            DuplexMode::SplitOff => 0x00,
            DuplexMode::SplitOn => 0x01,
            DuplexMode::Simplex => 0x10,
            DuplexMode::DupMinus => 0x11,
            DuplexMode::DupPlus => 0x12,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(DuplexMode::SplitOff),
            0x01 => Some(DuplexMode::SplitOn),
            0x10 => Some(DuplexMode::Simplex),
            0x11 => Some(DuplexMode::DupMinus),
            0x12 => Some(DuplexMode::DupPlus),
            _ => None,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, DuplexMode::SplitOn)
    }
}

/// Level registers under command 0x14
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LevelKind {
    AfGain,
    RfGain,
    Squelch,
    NrLevel,
    PbtInner,
    PbtOuter,
    CwPitch,
    TxPower,
    MicGain,
    KeySpeed,
    NotchFreq,
    CompLevel,
    NbLevel,
    MonitorGain,
    VoxGain,
    AntiVoxGain,
}

impl LevelKind {
    pub fn sub(&self) -> u8 {
        match self {
            LevelKind::AfGain => 0x01,
            LevelKind::RfGain => 0x02,
            LevelKind::Squelch => 0x03,
            LevelKind::NrLevel => 0x06,
            LevelKind::PbtInner => 0x07,
            LevelKind::PbtOuter => 0x08,
            LevelKind::CwPitch => 0x09,
            LevelKind::TxPower => 0x0A,
            LevelKind::MicGain => 0x0B,
            LevelKind::KeySpeed => 0x0C,
            LevelKind::NotchFreq => 0x0D,
            LevelKind::CompLevel => 0x0E,
            LevelKind::NbLevel => 0x12,
            LevelKind::MonitorGain => 0x15,
            LevelKind::VoxGain => 0x16,
            LevelKind::AntiVoxGain => 0x17,
        }
    }

    pub fn from_sub(sub: u8) -> Option<Self> {
        match sub {
            0x01 => Some(LevelKind::AfGain),
            0x02 => Some(LevelKind::RfGain),
            0x03 => Some(LevelKind::Squelch),
            0x06 => Some(LevelKind::NrLevel),
            0x07 => Some(LevelKind::PbtInner),
            0x08 => Some(LevelKind::PbtOuter),
            0x09 => Some(LevelKind::CwPitch),
            0x0A => Some(LevelKind::TxPower),
            0x0B => Some(LevelKind::MicGain),
            0x0C => Some(LevelKind::KeySpeed),
            0x0D => Some(LevelKind::NotchFreq),
            0x0E => Some(LevelKind::CompLevel),
            0x12 => Some(LevelKind::NbLevel),
            0x15 => Some(LevelKind::MonitorGain),
            0x16 => Some(LevelKind::VoxGain),
            0x17 => Some(LevelKind::AntiVoxGain),
            _ => None,
        }
    }
}

/// Meter registers under command 0x15
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeterKind {
    S,
    Center,
    Power,
    Swr,
    Alc,
    Comp,
    Vd,
    Id,
}

impl MeterKind {
    pub fn sub(&self) -> u8 {
        match self {
            MeterKind::S => 0x02,
            MeterKind::Center => 0x04,
            MeterKind::Power => 0x11,
            MeterKind::Swr => 0x12,
            MeterKind::Alc => 0x13,
            MeterKind::Comp => 0x14,
            MeterKind::Vd => 0x15,
            MeterKind::Id => 0x16,
        }
    }

    pub fn from_sub(sub: u8) -> Option<Self> {
        match sub {
            0x02 => Some(MeterKind::S),
            0x04 => Some(MeterKind::Center),
            0x11 => Some(MeterKind::Power),
            0x12 => Some(MeterKind::Swr),
            0x13 => Some(MeterKind::Alc),
            0x14 => Some(MeterKind::Comp),
            0x15 => Some(MeterKind::Vd),
            0x16 => Some(MeterKind::Id),
            _ => None,
        }
    }
}

/// Boolean feature toggles under command 0x16
///
/// Preamp (`16 02`), break-in (`16 47`), and repeater access (`16 5D`)
/// carry multi-valued bytes and have their own reply variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FuncKind {
    NoiseBlanker,
    NoiseReduction,
    AutoNotch,
    RepeaterTone,
    ToneSquelch,
    Compressor,
    Monitor,
    Vox,
    ManualNotch,
    DialLock,
    Satellite,
    IpPlus,
}

impl FuncKind {
    pub fn sub(&self) -> u8 {
        match self {
            FuncKind::NoiseBlanker => 0x22,
            FuncKind::NoiseReduction => 0x40,
            FuncKind::AutoNotch => 0x41,
            FuncKind::RepeaterTone => 0x42,
            FuncKind::ToneSquelch => 0x43,
            FuncKind::Compressor => 0x44,
            FuncKind::Monitor => 0x45,
            FuncKind::Vox => 0x46,
            FuncKind::ManualNotch => 0x48,
            FuncKind::DialLock => 0x50,
            FuncKind::Satellite => 0x5A,
            FuncKind::IpPlus => 0x65,
        }
    }

    pub fn from_sub(sub: u8) -> Option<Self> {
        match sub {
            0x22 => Some(FuncKind::NoiseBlanker),
            0x40 => Some(FuncKind::NoiseReduction),
            0x41 => Some(FuncKind::AutoNotch),
            0x42 => Some(FuncKind::RepeaterTone),
            0x43 => Some(FuncKind::ToneSquelch),
            0x44 => Some(FuncKind::Compressor),
            0x45 => Some(FuncKind::Monitor),
            0x46 => Some(FuncKind::Vox),
            0x48 => Some(FuncKind::ManualNotch),
            0x50 => Some(FuncKind::DialLock),
            0x5A => Some(FuncKind::Satellite),
            0x65 => Some(FuncKind::IpPlus),
            _ => None,
        }
    }
}

/// CW break-in settings carried by `16 47`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakInMode {
    Off,
    Semi,
    Full,
}

impl BreakInMode {
    pub fn code(&self) -> u8 {
        match self {
            BreakInMode::Off => 0x00,
            BreakInMode::Semi => 0x01,
            BreakInMode::Full => 0x02,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(BreakInMode::Off),
            0x01 => Some(BreakInMode::Semi),
            0x02 => Some(BreakInMode::Full),
            _ => None,
        }
    }
}

/// Scope display mode carried by `27 14`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpectrumMode {
    Center,
    Fixed,
    ScrollC,
    ScrollF,
}

impl SpectrumMode {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SpectrumMode::Center),
            1 => Some(SpectrumMode::Fixed),
            2 => Some(SpectrumMode::ScrollC),
            3 => Some(SpectrumMode::ScrollF),
            _ => None,
        }
    }
}

/// One typed operation toward the rig
#[derive(Debug, Clone, PartialEq)]
pub enum CivOperation {
    // Frequency and VFO
    GetFrequency,
    GetFrequencyVfo { vfo: u8 },
    SetFrequency { hz: u64 },
    SetFrequencyVfo { vfo: u8, hz: u64 },
    SelectVfo(Vfo),
    EqualizeAb,
    EqualizeMs,
    ExchangeVfos,

    // Mode
    GetMode,
    SetMode { mode: ModeKind, filter: u8 },
    GetDataMode,
    SetDataMode { on: bool, filter: u8 },

    // Split and repeater
    GetSplit,
    SetDuplex(DuplexMode),
    SetQuickSplit(bool),
    GetRptOffset,
    SetRptOffset { hz: u64 },
    GetRptAccessMode,

    // Attenuator, preamp, antenna
    GetAttenuator,
    SetAttenuator(u8),
    GetPreamp,
    SetPreamp(u8),
    GetAntenna,
    SetAntenna { antenna: u8, rx: bool },

    // Levels and meters
    GetLevel(LevelKind),
    SetLevel(LevelKind, u8),
    ReadMeter(MeterKind),

    // Feature toggles
    GetFunc(FuncKind),
    SetFunc(FuncKind, bool),
    GetBreakIn,
    SetBreakIn(BreakInMode),

    // CW
    SendCw(String),
    StopCw,

    // Power
    PowerOn,
    PowerOff,

    // Identification
    GetRigId,

    // 1A register family
    GetBandStack { band: u8, reg_code: u8 },
    GetFilterWidth,
    SetFilterWidth { passband_hz: u16, mode: ModeKind },
    GetAgc,
    SetAgc(u8),
    SetModInput { input: RigInput, data_mode: bool },
    GetModInput { data_mode: bool },
    SetTransceive(bool),
    GetMute,
    SetMute(bool),
    SetTime { hour: u8, minute: u8 },
    SetDate { year: u16, month: u8, day: u8 },

    // Tones
    GetTone,
    SetTone(u16),
    GetTsql,
    SetTsql(u16),
    GetDtcs,
    SetDtcs { code: u16, tx_invert: bool, rx_invert: bool },
    GetCsql,
    SetCsql(u16),

    // PTT and tuner
    GetPtt,
    SetPtt(bool),
    GetAtu,
    SetAtu(bool),
    StartAtu,
    GetTransmitFrequency,

    // RIT
    GetRitValue,
    SetRitValue(i32),
    GetRitEnabled,
    SetRitEnabled(bool),

    // Spectrum scope
    GetScopeDisplay,
    ScopeDisplayEnable(bool),
    ScopeOutputEnable(bool),
    GetScopeMode,
    SetScopeMode(SpectrumMode),
    GetScopeSpan { sub_vfo: bool },
    SetScopeSpan(CenterSpan),
    GetScopeEdge,
    SetScopeEdge(u8),
    GetScopeRefLevel,
    SetScopeRefLevel(i32),
    SetScopeBounds { start_hz: u64, end_hz: u64, edge: u8 },
}

/// Number of `0xFE` wake bytes preceding a power-on command, scaled to the
/// serial baud rate so the rig's UART has time to wake
pub fn wake_preamble_len(baud: u32) -> usize {
    match baud {
        4800 => 7,
        9600 => 13,
        19200 => 25,
        38400 => 50,
        57600 => 75,
        _ => 150,
    }
}

/// CW text may carry letters, digits, and the prosign-friendly punctuation
/// set; everything else becomes `?`
pub fn sanitize_cw(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0'..='9' | 'A'..='Z' | 'a'..='z' => c,
            '/' | '?' | '.' | '-' | ',' | ':' | '\'' | '(' | ')' | '=' | '+' | '"' | '@' | ' ' => c,
            _ => '?',
        })
        .collect()
}

const CW_MESSAGE_MAX: usize = 30;

impl CivOperation {
    /// Build the payload bytes for this operation on the given rig
    pub fn payload(&self, caps: &RigCapabilities) -> Result<Vec<u8>, ProtocolError> {
        let unsupported = |operation: &'static str| ProtocolError::Unsupported {
            model: caps.name.clone(),
            operation,
        };

        let bytes = match self {
            CivOperation::GetFrequency => vec![0x03],
            CivOperation::GetFrequencyVfo { vfo } => {
                if caps.has_vfo_ab || caps.has_vfo_ms {
                    vec![0x25, *vfo]
                } else {
                    vec![0x03]
                }
            }
            CivOperation::SetFrequency { hz } => {
                let mut p = vec![0x05];
                p.extend(freq_to_bcd(*hz, 5));
                p
            }
            CivOperation::SetFrequencyVfo { vfo, hz } => {
                if !(caps.has_vfo_ab || caps.has_vfo_ms) {
                    let mut p = vec![0x05];
                    p.extend(freq_to_bcd(*hz, 5));
                    return Ok(p);
                }
                let mut p = vec![0x25, *vfo];
                p.extend(freq_to_bcd(*hz, 5));
                p
            }
            CivOperation::SelectVfo(vfo) => vec![0x07, vfo.code()],
            CivOperation::EqualizeAb => vec![0x07, 0xA0],
            CivOperation::ExchangeVfos => vec![0x07, 0xB0],
            CivOperation::EqualizeMs => vec![0x07, 0xB1],

            CivOperation::GetMode => vec![0x04],
            CivOperation::SetMode { mode, filter } => {
                let code = caps
                    .mode_code(*mode)
                    .ok_or_else(|| unsupported("set_mode"))?;
                // WFM only has the wide filter
                let filter = if *mode == ModeKind::Wfm { 1 } else { *filter };
                vec![0x06, code, filter.clamp(1, 3)]
            }
            CivOperation::GetDataMode => vec![0x1A, 0x06],
            CivOperation::SetDataMode { on, filter } => {
                if !caps.has_data_modes {
                    return Err(unsupported("set_data_mode"));
                }
                if *on {
                    vec![0x1A, 0x06, 0x01, *filter]
                } else {
                    vec![0x1A, 0x06, 0x00, 0x00]
                }
            }

            CivOperation::GetSplit => vec![0x0F],
            CivOperation::SetDuplex(dm) => vec![0x0F, dm.code()],
            CivOperation::SetQuickSplit(on) => {
                let mut p = caps
                    .quick_split_command
                    .clone()
                    .ok_or_else(|| unsupported("quick_split"))?;
                p.push(u8::from(*on));
                p
            }
            CivOperation::GetRptOffset => vec![0x0C],
            CivOperation::SetRptOffset { hz } => {
                // Offset rides in three BCD bytes, 100 Hz resolution
                let mut p = vec![0x0D];
                p.extend(freq_to_bcd(hz / 100 * 100, 5)[1..4].to_vec());
                p
            }
            CivOperation::GetRptAccessMode => vec![0x16, 0x5D],

            CivOperation::GetAttenuator => vec![0x11],
            CivOperation::SetAttenuator(att) => vec![0x11, *att],
            CivOperation::GetPreamp => vec![0x16, 0x02],
            CivOperation::SetPreamp(pre) => vec![0x16, 0x02, *pre],
            CivOperation::GetAntenna => vec![0x12],
            CivOperation::SetAntenna { antenna, rx } => {
                if caps.antennas.is_empty() {
                    return Err(unsupported("set_antenna"));
                }
                if caps.has_rx_antenna {
                    vec![0x12, *antenna, u8::from(*rx)]
                } else {
                    vec![0x12, *antenna]
                }
            }

            CivOperation::GetLevel(kind) => vec![0x14, kind.sub()],
            CivOperation::SetLevel(kind, value) => {
                let mut p = vec![0x14, kind.sub()];
                p.extend(u16_to_bcd(*value as u16));
                p
            }
            CivOperation::ReadMeter(kind) => vec![0x15, kind.sub()],

            CivOperation::GetFunc(kind) => vec![0x16, kind.sub()],
            CivOperation::SetFunc(kind, on) => vec![0x16, kind.sub(), u8::from(*on)],
            CivOperation::GetBreakIn => vec![0x16, 0x47],
            CivOperation::SetBreakIn(mode) => vec![0x16, 0x47, mode.code()],

            CivOperation::SendCw(text) => {
                if !caps.has_transmit {
                    return Err(unsupported("send_cw"));
                }
                if text.len() > CW_MESSAGE_MAX {
                    return Err(ProtocolError::OutOfRange(format!(
                        "CW message length {} > {CW_MESSAGE_MAX}",
                        text.len()
                    )));
                }
                let mut p = vec![0x17];
                p.extend(sanitize_cw(text).bytes());
                p
            }
            CivOperation::StopCw => vec![0x17, 0xFF],

            CivOperation::PowerOn => vec![0x18, 0x01],
            CivOperation::PowerOff => vec![0x18, 0x00],

            CivOperation::GetRigId => vec![0x19, 0x00],

            CivOperation::GetBandStack { band, reg_code } => vec![0x1A, 0x01, *band, *reg_code],
            CivOperation::GetFilterWidth => vec![0x1A, 0x03],
            CivOperation::SetFilterWidth { passband_hz, mode } => {
                vec![0x1A, 0x03, filter_width_code(*passband_hz, *mode)]
            }
            CivOperation::GetAgc => vec![0x1A, 0x04],
            CivOperation::SetAgc(rate) => vec![0x1A, 0x04, *rate],
            CivOperation::SetModInput { input, data_mode } => {
                let mut p = caps
                    .mod_input_command
                    .clone()
                    .ok_or_else(|| unsupported("set_mod_input"))?;
                if *data_mode {
                    // The data-mode source register sits one past the voice one
                    if let Some(last) = p.last_mut() {
                        *last += 1;
                    }
                }
                let code = caps
                    .input_code(*input)
                    .ok_or_else(|| unsupported("set_mod_input"))?;
                p.push(code);
                p
            }
            CivOperation::GetModInput { data_mode } => {
                let mut p = caps
                    .mod_input_command
                    .clone()
                    .ok_or_else(|| unsupported("get_mod_input"))?;
                if *data_mode {
                    if let Some(last) = p.last_mut() {
                        *last += 1;
                    }
                }
                p
            }
            CivOperation::SetTransceive(on) => {
                let mut p = caps.transceive_command.clone();
                p.push(u8::from(*on));
                p
            }
            CivOperation::GetMute => vec![0x1A, 0x09],
            CivOperation::SetMute(on) => vec![0x1A, 0x09, u8::from(*on)],
            CivOperation::SetTime { hour, minute } => {
                let mut p = caps
                    .time_command
                    .clone()
                    .ok_or_else(|| unsupported("set_time"))?;
                p.push(byte_to_bcd(*hour));
                p.push(byte_to_bcd(*minute));
                p
            }
            CivOperation::SetDate { year, month, day } => {
                let mut p = caps
                    .date_command
                    .clone()
                    .ok_or_else(|| unsupported("set_date"))?;
                p.push(byte_to_bcd((*year / 100) as u8));
                p.push(byte_to_bcd((*year % 100) as u8));
                p.push(byte_to_bcd(*month));
                p.push(byte_to_bcd(*day));
                p
            }

            CivOperation::GetTone => vec![0x1B, 0x00],
            CivOperation::SetTone(tone) => {
                if !caps.has_ctcss {
                    return Err(unsupported("set_tone"));
                }
                let mut p = vec![0x1B, 0x00];
                p.extend(Tone::ctcss(*tone).encode());
                p
            }
            CivOperation::GetTsql => vec![0x1B, 0x01],
            CivOperation::SetTsql(tone) => {
                if !caps.has_ctcss {
                    return Err(unsupported("set_tsql"));
                }
                let mut p = vec![0x1B, 0x01];
                p.extend(Tone::ctcss(*tone).encode());
                p
            }
            CivOperation::GetDtcs => vec![0x1B, 0x02],
            CivOperation::SetDtcs {
                code,
                tx_invert,
                rx_invert,
            } => {
                if !caps.has_dtcs {
                    return Err(unsupported("set_dtcs"));
                }
                let mut p = vec![0x1B, 0x02];
                p.extend(Tone::dtcs(*code, *tx_invert, *rx_invert).encode());
                p
            }
            CivOperation::GetCsql => vec![0x1B, 0x07],
            CivOperation::SetCsql(code) => {
                let mut p = vec![0x1B, 0x07];
                p.extend(Tone::ctcss(*code).encode());
                p
            }

            CivOperation::GetPtt => vec![0x1C, 0x00],
            CivOperation::SetPtt(on) => {
                if !caps.has_ptt_cmd {
                    return Err(unsupported("set_ptt"));
                }
                vec![0x1C, 0x00, u8::from(*on)]
            }
            CivOperation::GetAtu => vec![0x1C, 0x01],
            CivOperation::SetAtu(on) => {
                if !caps.has_atu {
                    return Err(unsupported("set_atu"));
                }
                vec![0x1C, 0x01, u8::from(*on)]
            }
            CivOperation::StartAtu => {
                if !caps.has_atu {
                    return Err(unsupported("start_atu"));
                }
                vec![0x1C, 0x01, 0x02]
            }
            CivOperation::GetTransmitFrequency => vec![0x1C, 0x03],

            CivOperation::GetRitValue => vec![0x21, 0x00],
            CivOperation::SetRitValue(hz) => {
                let negative = *hz < 0;
                let magnitude = hz.unsigned_abs() as u64;
                if magnitude > 9999 {
                    return Err(ProtocolError::OutOfRange(format!("RIT {hz} Hz")));
                }
                let mut p = vec![0x21, 0x00];
                p.extend(freq_to_bcd(magnitude, 2));
                p.push(u8::from(negative));
                p
            }
            CivOperation::GetRitEnabled => vec![0x21, 0x01],
            CivOperation::SetRitEnabled(on) => vec![0x21, 0x01, u8::from(*on)],

            CivOperation::GetScopeDisplay => vec![0x27, 0x10],
            CivOperation::ScopeDisplayEnable(on) => vec![0x27, 0x10, u8::from(*on)],
            CivOperation::ScopeOutputEnable(on) => vec![0x27, 0x11, u8::from(*on)],
            CivOperation::GetScopeMode => vec![0x27, 0x14],
            CivOperation::SetScopeMode(mode) => vec![0x27, 0x14, 0x00, mode.code()],
            CivOperation::GetScopeSpan { sub_vfo } => vec![0x27, 0x15, u8::from(*sub_vfo)],
            CivOperation::SetScopeSpan(span) => {
                let mut p = vec![0x27, 0x15, 0x00];
                p.extend(freq_to_bcd(span.hz(), 6));
                p
            }
            CivOperation::GetScopeEdge => vec![0x27, 0x16],
            CivOperation::SetScopeEdge(edge) => {
                if !(1..=4).contains(edge) {
                    return Err(ProtocolError::OutOfRange(format!("scope edge {edge}")));
                }
                vec![0x27, 0x16, 0x00, *edge]
            }
            CivOperation::GetScopeRefLevel => vec![0x27, 0x19, 0x00],
            CivOperation::SetScopeRefLevel(db) => {
                let mut p = vec![0x27, 0x19, 0x00];
                p.extend(u16_to_bcd(db.unsigned_abs().saturating_mul(10) as u16));
                p.push(u8::from(*db < 0));
                p
            }
            CivOperation::SetScopeBounds {
                start_hz,
                end_hz,
                edge,
            } => {
                if !(1..=4).contains(edge) {
                    return Err(ProtocolError::OutOfRange(format!("scope edge {edge}")));
                }
                let range = scope_freq_range(caps, *start_hz);
                let mut p = vec![0x27, 0x1E, range, *edge];
                p.extend(freq_to_bcd(*start_hz, 5));
                p.extend(freq_to_bcd(*end_hz, 5));
                p
            }
        };

        Ok(bytes)
    }
}

/// Fixed-edge group number for the `27 1E` bounds command
///
/// The grouping is a wire-level property of each model's scope, so this is
/// one of the few justified per-model switches.
fn scope_freq_range(caps: &RigCapabilities, start_hz: u64) -> u8 {
    match caps.model_id {
        // IC-9700: VHF / UHF / 23cm groups
        0xA2 => {
            if start_hz > 450_000_000 {
                3
            } else if start_hz > 148_000_000 {
                2
            } else {
                1
            }
        }
        // IC-R8600 uses a single group
        0x96 => 1,
        // HF rigs divide the spectrum at the published edge boundaries
        _ => {
            const EDGES: [u64; 16] = [
                1_600_000,
                2_000_000,
                6_000_000,
                8_000_000,
                11_000_000,
                15_000_000,
                20_000_000,
                22_000_000,
                26_000_000,
                30_000_000,
                45_000_000,
                60_000_000,
                74_800_000,
                108_000_000,
                137_000_000,
                400_000_000,
            ];
            1 + EDGES.iter().filter(|&&e| start_hz > e).count() as u8
        }
    }
}

/// Passband width register value for `1A 03`
///
/// SSB/CW/RTTY/PSK: 0..=9 in 50 Hz steps, then 100 Hz steps from 600 Hz.
/// AM: 0..=49 in 200 Hz steps. RTTY tops out at register 31.
pub fn filter_width_code(passband_hz: u16, mode: ModeKind) -> u8 {
    let reg = if mode == ModeKind::Am {
        ((passband_hz / 200).saturating_sub(1)).min(49)
    } else if passband_hz >= 600 {
        let reg = passband_hz / 100 + 4;
        if matches!(mode, ModeKind::Rtty | ModeKind::RttyR) {
            reg.min(31)
        } else {
            reg.min(40)
        }
    } else {
        (passband_hz / 50).saturating_sub(1)
    };
    byte_to_bcd(reg as u8)
}

/// Passband width in hertz for a `1A 03` register value
pub fn filter_width_hz(reg: u8, mode: ModeKind) -> u16 {
    if mode == ModeKind::Am {
        200 + (reg as u16) * 200
    } else if reg <= 10 {
        50 + (reg as u16) * 50
    } else {
        600 + (reg as u16 - 10) * 100
    }
}

/// Key-speed scaling between the wire's raw 0..=255 and words per minute
pub fn key_speed_wpm(raw: u8) -> u8 {
    ((raw as f64 / 6.071) + 6.0).round() as u8
}

/// Words per minute back to the wire's raw scale
pub fn key_speed_raw(wpm: u8) -> u8 {
    ((wpm as f64) * 5.1).min(255.0) as u8
}

/// A parsed rig-originated payload
#[derive(Debug, Clone, PartialEq)]
pub enum CivReply {
    /// Frequency report; `vfo` is present only for `0x25` replies
    Frequency { hz: u64, vfo: Option<u8> },
    Mode { code: u8, filter: u8 },
    DataMode { on: bool, filter: u8 },
    Duplex(DuplexMode),
    RptOffset { hz: u64 },
    Attenuator(u8),
    Antenna { antenna: u8, rx: bool },
    Level { kind: LevelKind, value: u8 },
    Meter { kind: MeterKind, value: u8 },
    Preamp(u8),
    Func { kind: FuncKind, on: bool },
    BreakIn(BreakInMode),
    RptAccessMode(u8),
    RigId { model_id: u8 },
    BandStack {
        band: u8,
        reg_code: u8,
        hz: u64,
        mode_code: u8,
        filter: u8,
        data_mode: bool,
    },
    FilterWidth { reg: u8 },
    Agc(u8),
    Mute(bool),
    DetailedRegister { register: u16, data: Vec<u8> },
    Tone(Tone),
    Tsql(Tone),
    Dtcs(Tone),
    Csql(Tone),
    Ptt(bool),
    AtuStatus(u8),
    RitValue(i32),
    RitEnabled(bool),
    /// Raw `27 00` fragment for the spectrum reassembler
    SpectrumFragment(Vec<u8>),
    ScopeDisplayEnabled(bool),
    ScopeOutputEnabled(bool),
    ScopeMode(SpectrumMode),
    ScopeSpan { hz: u64, sub_vfo: bool },
    ScopeEdge(u8),
    ScopeRefLevel(i32),
    Ack,
    Nak,
    Unknown { cmd: u8, sub: Option<u8> },
}

fn need(payload: &[u8], n: usize) -> Result<(), ParseError> {
    if payload.len() < n {
        Err(ParseError::TruncatedPayload {
            needed: n,
            have: payload.len(),
        })
    } else {
        Ok(())
    }
}

/// Parse a reply payload (`cmd [sub] [data…]`, terminator stripped)
///
/// Malformed BCD or truncated payloads return an error so the caller can
/// drop the frame without a state update. Unknown command pairs come back
/// as [`CivReply::Unknown`].
pub fn parse_reply(payload: &[u8]) -> Result<CivReply, ParseError> {
    need(payload, 1)?;
    let cmd = payload[0];
    let sub = payload.get(1).copied();

    let reply = match cmd {
        0x00 | 0x03 | 0x05 => {
            need(payload, 5)?;
            let hz = freq_from_bcd(&payload[1..])?;
            CivReply::Frequency { hz, vfo: None }
        }
        0x25 => {
            need(payload, 7)?;
            let vfo = payload[1];
            let hz = freq_from_bcd(&payload[2..])?;
            CivReply::Frequency { hz, vfo: Some(vfo) }
        }
        0x01 | 0x04 | 0x06 => {
            need(payload, 2)?;
            CivReply::Mode {
                code: payload[1],
                filter: payload.get(2).copied().unwrap_or(0),
            }
        }
        0x0C => {
            need(payload, 4)?;
            let hz = freq_from_bcd(&payload[1..4])? * 100;
            CivReply::RptOffset { hz }
        }
        0x0F => {
            need(payload, 2)?;
            match DuplexMode::from_code(payload[1]) {
                Some(dm) => CivReply::Duplex(dm),
                None => CivReply::Unknown { cmd, sub },
            }
        }
        0x11 => {
            need(payload, 2)?;
            CivReply::Attenuator(payload[1])
        }
        0x12 => {
            need(payload, 2)?;
            CivReply::Antenna {
                antenna: payload[1],
                rx: payload.get(2).copied().unwrap_or(0) != 0,
            }
        }
        0x14 => {
            need(payload, 4)?;
            let value = u16_from_bcd(payload[2], payload[3])?.min(255) as u8;
            match LevelKind::from_sub(payload[1]) {
                Some(kind) => CivReply::Level { kind, value },
                None => CivReply::Unknown { cmd, sub },
            }
        }
        0x15 => {
            need(payload, 4)?;
            let value = u16_from_bcd(payload[2], payload[3])?.min(255) as u8;
            match MeterKind::from_sub(payload[1]) {
                Some(kind) => CivReply::Meter { kind, value },
                None => CivReply::Unknown { cmd, sub },
            }
        }
        0x16 => {
            need(payload, 3)?;
            match payload[1] {
                0x02 => CivReply::Preamp(payload[2]),
                0x47 => match BreakInMode::from_code(payload[2]) {
                    Some(mode) => CivReply::BreakIn(mode),
                    None => CivReply::Unknown { cmd, sub },
                },
                0x5D => CivReply::RptAccessMode(payload[2]),
                s => match FuncKind::from_sub(s) {
                    Some(kind) => CivReply::Func {
                        kind,
                        on: payload[2] != 0,
                    },
                    None => CivReply::Unknown { cmd, sub },
                },
            }
        }
        0x19 if sub == Some(0x00) => {
            need(payload, 3)?;
            CivReply::RigId {
                model_id: payload[2],
            }
        }
        0x1A => {
            need(payload, 2)?;
            match payload[1] {
                0x01 => {
                    need(payload, 12)?;
                    let hz = freq_from_bcd(&payload[4..9])?;
                    CivReply::BandStack {
                        band: payload[2],
                        reg_code: payload[3],
                        hz,
                        mode_code: payload[9],
                        filter: payload[10],
                        data_mode: (payload[11] & 0x10) != 0,
                    }
                }
                0x03 => {
                    need(payload, 3)?;
                    CivReply::FilterWidth {
                        reg: byte_from_bcd(payload[2])?,
                    }
                }
                0x04 => {
                    need(payload, 3)?;
                    CivReply::Agc(payload[2])
                }
                0x05 => {
                    need(payload, 4)?;
                    let register =
                        (byte_from_bcd(payload[2])? as u16) * 100 + byte_from_bcd(payload[3])? as u16;
                    CivReply::DetailedRegister {
                        register,
                        data: payload[4..].to_vec(),
                    }
                }
                0x06 => {
                    need(payload, 3)?;
                    CivReply::DataMode {
                        on: payload[2] != 0,
                        filter: payload.get(3).copied().unwrap_or(0),
                    }
                }
                0x09 => {
                    need(payload, 3)?;
                    CivReply::Mute(payload[2] != 0)
                }
                _ => CivReply::Unknown { cmd, sub },
            }
        }
        0x1B => {
            need(payload, 5)?;
            let tone = Tone::decode(&payload[2..5])?;
            match payload[1] {
                0x00 => CivReply::Tone(tone),
                0x01 => CivReply::Tsql(tone),
                0x02 => CivReply::Dtcs(tone),
                0x07 => CivReply::Csql(tone),
                _ => CivReply::Unknown { cmd, sub },
            }
        }
        0x1C => {
            need(payload, 3)?;
            match payload[1] {
                0x00 => CivReply::Ptt(payload[2] != 0),
                0x01 => CivReply::AtuStatus(payload[2]),
                _ => CivReply::Unknown { cmd, sub },
            }
        }
        0x21 => {
            need(payload, 3)?;
            match payload[1] {
                0x00 => {
                    need(payload, 5)?;
                    let magnitude = freq_from_bcd(&payload[2..4])? as i32;
                    let value = if payload[4] == 0x01 {
                        -magnitude
                    } else {
                        magnitude
                    };
                    CivReply::RitValue(value)
                }
                0x01 => CivReply::RitEnabled(payload[2] != 0),
                _ => CivReply::Unknown { cmd, sub },
            }
        }
        0x27 => {
            need(payload, 2)?;
            match payload[1] {
                0x00 => CivReply::SpectrumFragment(payload.to_vec()),
                0x10 => {
                    need(payload, 3)?;
                    CivReply::ScopeDisplayEnabled(payload[2] != 0)
                }
                0x11 => {
                    need(payload, 3)?;
                    CivReply::ScopeOutputEnabled(payload[2] != 0)
                }
                0x14 => {
                    need(payload, 4)?;
                    match SpectrumMode::from_code(payload[3]) {
                        Some(mode) => CivReply::ScopeMode(mode),
                        None => CivReply::Unknown { cmd, sub },
                    }
                }
                0x15 => {
                    need(payload, 4)?;
                    let sub_vfo = payload[2] == 0x01;
                    let hz = freq_from_bcd(&payload[3..])?;
                    CivReply::ScopeSpan { hz, sub_vfo }
                }
                0x16 => {
                    need(payload, 3)?;
                    CivReply::ScopeEdge(payload[2])
                }
                0x19 => {
                    need(payload, 6)?;
                    let value = (u16_from_bcd(payload[3], payload[4])? / 10) as i32;
                    let value = if payload[5] != 0 { -value } else { value };
                    CivReply::ScopeRefLevel(value)
                }
                _ => CivReply::Unknown { cmd, sub },
            }
        }
        0xFB => CivReply::Ack,
        0xFA => CivReply::Nak,
        _ => CivReply::Unknown { cmd, sub },
    };

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RigCapabilities;
    use proptest::prelude::*;

    fn ic7300() -> RigCapabilities {
        RigCapabilities::for_model(0x94, 0x94)
    }

    #[test]
    fn set_frequency_payload() {
        let p = CivOperation::SetFrequency { hz: 14_250_000 }
            .payload(&ic7300())
            .unwrap();
        assert_eq!(p, vec![0x05, 0x00, 0x00, 0x25, 0x14, 0x00]);
    }

    #[test]
    fn per_vfo_frequency_uses_25_when_capable() {
        let caps = ic7300();
        let p = CivOperation::GetFrequencyVfo { vfo: 1 }
            .payload(&caps)
            .unwrap();
        assert_eq!(p, vec![0x25, 0x01]);

        let mut legacy = caps;
        legacy.has_vfo_ab = false;
        legacy.has_vfo_ms = false;
        let p = CivOperation::GetFrequencyVfo { vfo: 1 }
            .payload(&legacy)
            .unwrap();
        assert_eq!(p, vec![0x03]);
    }

    #[test]
    fn set_level_encodes_bcd() {
        let p = CivOperation::SetLevel(LevelKind::AfGain, 255)
            .payload(&ic7300())
            .unwrap();
        assert_eq!(p, vec![0x14, 0x01, 0x02, 0x55]);
    }

    #[test]
    fn quick_split_uses_model_register() {
        let p = CivOperation::SetQuickSplit(true).payload(&ic7300()).unwrap();
        assert_eq!(p, vec![0x1A, 0x05, 0x00, 0x30, 0x01]);

        let r8600 = RigCapabilities::for_model(0x96, 0x96);
        assert!(CivOperation::SetQuickSplit(true).payload(&r8600).is_err());
    }

    #[test]
    fn cw_text_sanitized_and_bounded() {
        let p = CivOperation::SendCw("CQ CQ de N0CALL~".into())
            .payload(&ic7300())
            .unwrap();
        assert_eq!(&p[1..], b"CQ CQ de N0CALL?");

        let too_long = "A".repeat(31);
        assert!(CivOperation::SendCw(too_long).payload(&ic7300()).is_err());
    }

    #[test]
    fn ptt_refused_on_receiver() {
        let r8600 = RigCapabilities::for_model(0x96, 0x96);
        assert!(CivOperation::SetPtt(true).payload(&r8600).is_err());
    }

    #[test]
    fn rit_encoding() {
        let p = CivOperation::SetRitValue(-330).payload(&ic7300()).unwrap();
        assert_eq!(p, vec![0x21, 0x00, 0x30, 0x03, 0x01]);
    }

    #[test]
    fn wake_preamble_scales_with_baud() {
        assert_eq!(wake_preamble_len(9600), 13);
        assert_eq!(wake_preamble_len(19200), 25);
        assert_eq!(wake_preamble_len(38400), 50);
        assert_eq!(wake_preamble_len(57600), 75);
        assert_eq!(wake_preamble_len(115200), 150);
    }

    #[test]
    fn parse_frequency_reply() {
        let reply = parse_reply(&[0x03, 0x00, 0x60, 0x45, 0x14, 0x00]).unwrap();
        assert_eq!(
            reply,
            CivReply::Frequency {
                hz: 14_456_000,
                vfo: None
            }
        );
    }

    #[test]
    fn parse_bad_bcd_frequency_is_an_error() {
        assert!(parse_reply(&[0x03, 0x00, 0x60, 0x4A, 0x14, 0x00]).is_err());
    }

    #[test]
    fn parse_mode_reply() {
        let reply = parse_reply(&[0x04, 0x01, 0x02]).unwrap();
        assert_eq!(
            reply,
            CivReply::Mode {
                code: 0x01,
                filter: 2
            }
        );
    }

    #[test]
    fn parse_level_and_meter() {
        let reply = parse_reply(&[0x14, 0x02, 0x00, 0x78]).unwrap();
        assert_eq!(
            reply,
            CivReply::Level {
                kind: LevelKind::RfGain,
                value: 78
            }
        );

        let reply = parse_reply(&[0x15, 0x12, 0x01, 0x20]).unwrap();
        assert_eq!(
            reply,
            CivReply::Meter {
                kind: MeterKind::Swr,
                value: 120
            }
        );
    }

    #[test]
    fn parse_rig_id() {
        let reply = parse_reply(&[0x19, 0x00, 0x94]).unwrap();
        assert_eq!(reply, CivReply::RigId { model_id: 0x94 });
    }

    #[test]
    fn parse_tone_reply() {
        let reply = parse_reply(&[0x1B, 0x01, 0x00, 0x12, 0x73]).unwrap();
        assert_eq!(reply, CivReply::Tsql(Tone::ctcss(1273)));
    }

    #[test]
    fn parse_rit_reply() {
        // +330 Hz
        let reply = parse_reply(&[0x21, 0x00, 0x30, 0x03, 0x00]).unwrap();
        assert_eq!(reply, CivReply::RitValue(330));
        // -330 Hz
        let reply = parse_reply(&[0x21, 0x00, 0x30, 0x03, 0x01]).unwrap();
        assert_eq!(reply, CivReply::RitValue(-330));
    }

    #[test]
    fn parse_acks() {
        assert_eq!(parse_reply(&[0xFB]).unwrap(), CivReply::Ack);
        assert_eq!(parse_reply(&[0xFA]).unwrap(), CivReply::Nak);
    }

    #[test]
    fn unknown_pairs_do_not_error() {
        let reply = parse_reply(&[0x77, 0x01, 0x02]).unwrap();
        assert_eq!(
            reply,
            CivReply::Unknown {
                cmd: 0x77,
                sub: Some(0x01)
            }
        );
    }

    #[test]
    fn filter_width_scale() {
        assert_eq!(filter_width_hz(0, ModeKind::Usb), 50);
        assert_eq!(filter_width_hz(10, ModeKind::Usb), 550);
        assert_eq!(filter_width_hz(34, ModeKind::Usb), 3000);
        assert_eq!(filter_width_hz(0, ModeKind::Am), 200);
        assert_eq!(filter_width_hz(49, ModeKind::Am), 10_000);
    }

    #[test]
    fn key_speed_reference_points() {
        assert_eq!(key_speed_wpm(0), 6);
        assert_eq!(key_speed_wpm(255), 48);
        assert_eq!(key_speed_raw(28), 142);
        assert_eq!(key_speed_raw(50), 255);
    }

    proptest! {
        #[test]
        fn parse_never_panics(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = parse_reply(&payload);
        }

        #[test]
        fn frequency_payload_roundtrip(hz in 0u64..10_000_000_000u64) {
            let p = CivOperation::SetFrequency { hz }.payload(&ic7300()).unwrap();
            match parse_reply(&p).unwrap() {
                CivReply::Frequency { hz: parsed, .. } => prop_assert_eq!(parsed, hz),
                other => return Err(proptest::test_runner::TestCaseError::fail(format!("unexpected reply {:?}", other))),
            }
        }
    }
}
