//! Per-connection command processing
//!
//! One line is one command. A line may start with `;`, `,`, or `|` to
//! change the reply separator, `+` for long replies with field labels,
//! `#` for a comment, or `\` for the long-form command name. Hamlib's
//! netrigctl also sends a handful of single high-bit bytes (`\xf0` for
//! `chk_vfo` and friends); those are expanded to their long names before
//! parsing.
//!
//! Set commands answer `RPRT 0`; failures answer `RPRT -1`; verbs this
//! server does not implement answer `RPRT -11`.

use std::collections::HashMap;

use tracing::{debug, info};

use civ_protocol::models::RigCapabilities;
use civ_rig::{RigState, StateKey, StateValue};

use crate::cal::{calibrate, table_for_model};
use crate::dump::{self, mode_name};
use crate::RigCtlHandle;

const RPRT_OK: i32 = 0;
const RPRT_ERROR: i32 = -1;
const RPRT_UNIMPLEMENTED: i32 = -11;

/// Outcome of one input line
#[derive(Debug, PartialEq, Eq)]
pub enum LineResult {
    /// Text to send back (possibly empty)
    Reply(String),
    /// Client asked to quit
    Quit,
}

/// One TCP client's view of the server
pub struct ClientSession {
    handle: RigCtlHandle,
    version: String,
    chk_vfo_seen: bool,
    /// Parameters (`set_parm`) have no CI-V counterpart; they are tracked
    /// per connection so get after set round-trips.
    parms: HashMap<String, String>,
}

impl ClientSession {
    pub fn new(handle: RigCtlHandle, version: String) -> Self {
        Self {
            handle,
            version,
            chk_vfo_seen: false,
            parms: HashMap::new(),
        }
    }

    /// Expand Hamlib's single-byte command escapes into long names
    pub fn expand_escapes(raw: &[u8]) -> String {
        let mut out = String::with_capacity(raw.len());
        for &b in raw {
            match b {
                0x87 => out.push_str("set_powerstat"),
                0x88 => out.push_str("get_powerstat"),
                0x89 => out.push_str("send_dtmf"),
                0x8A => out.push_str("recv_dtmf"),
                0x8B => out.push_str("get_dcd"),
                0xA2 => out.push_str("set_lock_mode"),
                0xA3 => out.push_str("get_lock_mode"),
                0xF0 => out.push_str("chk_vfo"),
                0xF3 => out.push_str("get_vfo_info"),
                0xF5 => out.push_str("get_rig_info"),
                b if b.is_ascii() => out.push(b as char),
                _ => {}
            }
        }
        out
    }

    /// Process one command line into its reply text
    pub async fn process_line(&mut self, line: &str) -> LineResult {
        let mut line = line.trim_end_matches(['\n', '\r']);
        let mut sep = "\n".to_string();
        let mut long_reply = false;

        // Prefix characters
        loop {
            let Some(first) = line.chars().next() else {
                return LineResult::Reply(String::new());
            };
            match first {
                ';' | ',' | '|' => {
                    sep = first.to_string();
                    line = &line[1..];
                }
                '+' => {
                    long_reply = true;
                    line = &line[1..];
                }
                '#' => return LineResult::Reply(String::new()),
                '\\' => {
                    line = &line[1..];
                    break;
                }
                _ => break,
            }
        }

        let args: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = args.first() else {
            return LineResult::Reply(String::new());
        };

        if cmd.eq_ignore_ascii_case("q") || cmd.eq_ignore_ascii_case("quit") {
            return LineResult::Quit;
        }

        debug!("rigctl command: {:?}", args);

        let state = self.handle.snapshot().await.unwrap_or_default();
        let caps = self.handle.caps().await;

        let mut response: Vec<String> = Vec::new();
        let mut code = RPRT_OK;
        let mut set_command = false;

        self.dispatch(
            &args,
            long_reply,
            &state,
            caps.as_ref(),
            &mut response,
            &mut code,
            &mut set_command,
        )
        .await;

        // Long replies echo the command with its arguments first.
        let mut out = String::new();
        if long_reply && args.len() >= 2 {
            out.push_str(&format!("{}: {}{}", args[0], args[1..].join(" "), sep));
        }

        if set_command || code != RPRT_OK || long_reply {
            response.push(format!("RPRT {code}"));
        }

        for line in response.iter().filter(|l| !l.is_empty()) {
            out.push_str(line);
            out.push_str(&sep);
        }
        if sep != "\n" && !out.is_empty() {
            out.push('\n');
        }

        LineResult::Reply(out)
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &mut self,
        args: &[&str],
        long: bool,
        state: &RigState,
        caps: Option<&RigCapabilities>,
        response: &mut Vec<String>,
        code: &mut i32,
        set_command: &mut bool,
    ) {
        let label = |long: bool, tag: &str, value: String| {
            if long {
                format!("{tag}{value}")
            } else {
                value
            }
        };
        let current_mode = caps.and_then(|c| c.mode_for_code(state.u8_of(StateKey::Mode)));

        match args[0] {
            "F" | "set_freq" => {
                *set_command = true;
                let (vfo_b, freq_arg) = match args {
                    [_, vfo, freq] => (*vfo == "VFOB" || *vfo == "Sub", Some(*freq)),
                    [_, freq] => (false, Some(*freq)),
                    _ => (false, None),
                };
                match freq_arg.and_then(parse_freq) {
                    Some(hz) => {
                        let key = if vfo_b {
                            StateKey::VfoBFreq
                        } else {
                            StateKey::VfoAFreq
                        };
                        self.handle.set(key, StateValue::U64(hz)).await;
                    }
                    None => *code = RPRT_ERROR,
                }
            }
            "f" | "get_freq" => {
                let key = if state.u8_of(StateKey::CurrentVfo) == 0 {
                    StateKey::VfoAFreq
                } else {
                    StateKey::VfoBFreq
                };
                response.push(label(long, "Frequency: ", state.u64_of(key).to_string()));
            }

            "M" | "set_mode" => {
                *set_command = true;
                let (mode_arg, passband) = match args {
                    [_, mode] => (Some(*mode), 0u16),
                    [_, mode, pb] => (Some(*mode), pb.parse().unwrap_or(0)),
                    [_, _vfo, mode, pb] => (Some(*mode), pb.parse().unwrap_or(0)),
                    _ => (None, 0),
                };
                match mode_arg.and_then(parse_mode) {
                    Some((mode_code, data)) => {
                        self.handle
                            .set(StateKey::Mode, StateValue::U8(mode_code))
                            .await;
                        self.handle
                            .set(StateKey::DataMode, StateValue::Bool(data))
                            .await;
                        if passband > 0 {
                            let filter = filter_for_passband(mode_code, passband);
                            self.handle
                                .set(StateKey::Filter, StateValue::U8(filter))
                                .await;
                            self.handle
                                .set(StateKey::Passband, StateValue::U16(passband))
                                .await;
                        }
                    }
                    None => *code = RPRT_ERROR,
                }
            }
            "m" | "get_mode" => {
                response.push(label(long, "Mode: ", mode_name(caps, state)));
                response.push(label(
                    long,
                    "Passband: ",
                    state.effective_passband(current_mode).to_string(),
                ));
            }

            "V" | "set_vfo" => {
                *set_command = true;
                match args.get(1) {
                    Some(&"?") => {
                        response.push("set_vfo: ?".to_string());
                        response.push("VFOA".to_string());
                        response.push("VFOB".to_string());
                        response.push("Sub".to_string());
                        response.push("Main".to_string());
                        response.push("MEM".to_string());
                    }
                    Some(&v) => {
                        let index = match v {
                            "VFOA" | "Main" => 0u8,
                            "VFOB" | "Sub" => 1,
                            "MEM" => 2,
                            _ => 0,
                        };
                        self.handle
                            .set(StateKey::CurrentVfo, StateValue::U8(index))
                            .await;
                    }
                    None => *code = RPRT_ERROR,
                }
            }
            "v" | "get_vfo" => {
                let name = match state.u8_of(StateKey::CurrentVfo) {
                    0 => "VFOA",
                    1 => "VFOB",
                    _ => "MEM",
                };
                response.push(label(long, "VFO: ", name.to_string()));
            }

            "J" | "set_rit" => {
                *set_command = true;
                match args.get(1).and_then(|v| v.parse::<i32>().ok()) {
                    Some(value) => {
                        self.handle
                            .set(StateKey::RitValue, StateValue::I32(value))
                            .await;
                    }
                    None => *code = RPRT_ERROR,
                }
            }
            "j" | "get_rit" => {
                response.push(label(
                    long,
                    "RIT: ",
                    state.i32_of(StateKey::RitValue).to_string(),
                ));
            }
            "Z" | "set_xit" => *set_command = true,
            "z" | "get_xit" => response.push(label(long, "XIT: ", "0".to_string())),

            "T" | "set_ptt" => {
                *set_command = true;
                let can_ptt = caps.map(|c| c.has_ptt_cmd || c.use_rts_for_ptt).unwrap_or(false);
                if !can_ptt {
                    *code = RPRT_ERROR;
                } else {
                    match args.get(1).and_then(|v| parse_on_off(v)) {
                        Some(on) => {
                            self.handle.set(StateKey::Ptt, StateValue::Bool(on)).await;
                        }
                        None => *code = RPRT_ERROR,
                    }
                }
            }
            "t" | "get_ptt" => {
                let can_ptt = caps.map(|c| c.has_ptt_cmd || c.use_rts_for_ptt).unwrap_or(false);
                if can_ptt {
                    response.push(label(
                        long,
                        "PTT: ",
                        u8::from(state.bool_of(StateKey::Ptt)).to_string(),
                    ));
                } else {
                    *code = RPRT_ERROR;
                }
            }

            "S" | "set_split_vfo" => {
                *set_command = true;
                let dm = if args.get(1) == Some(&"1") { 0x01 } else { 0x00 };
                self.handle.set(StateKey::Duplex, StateValue::U8(dm)).await;
            }
            "s" | "get_split_vfo" => {
                let split = u8::from(state.u8_of(StateKey::Duplex) == 0x01);
                response.push(label(long, "Split: ", split.to_string()));
                let tx_vfo = if state.u8_of(StateKey::CurrentVfo) == 0 {
                    "VFOB"
                } else {
                    "VFOA"
                };
                response.push(label(long, "TX VFO: ", tx_vfo.to_string()));
            }

            "I" | "set_split_freq" => {
                *set_command = true;
                match args.last().and_then(|v| parse_freq(v)) {
                    Some(hz) => {
                        self.handle
                            .set(StateKey::VfoBFreq, StateValue::U64(hz))
                            .await;
                    }
                    None => *code = RPRT_ERROR,
                }
            }
            "i" | "get_split_freq" => {
                let key = if state.u8_of(StateKey::CurrentVfo) == 0 {
                    StateKey::VfoBFreq
                } else {
                    StateKey::VfoAFreq
                };
                response.push(label(long, "TX VFO: ", state.u64_of(key).to_string()));
            }
            "X" | "set_split_mode" => *set_command = true,
            "x" | "get_split_mode" => {
                response.push(label(long, "TX Mode: ", mode_name(caps, state)));
                response.push(label(
                    long,
                    "TX Passband: ",
                    state.effective_passband(current_mode).to_string(),
                ));
            }

            "U" | "set_func" => {
                *set_command = true;
                match (args.get(1), args.get(2).and_then(|v| parse_on_off(v))) {
                    (Some(name), Some(on)) => match func_key(name) {
                        Some(key) => {
                            self.handle.set(key, StateValue::Bool(on)).await;
                            info!("set_func {} = {}", name, on);
                        }
                        None => debug!("unimplemented func: {}", name),
                    },
                    _ => *code = RPRT_ERROR,
                }
            }
            "u" | "get_func" => match args.get(1) {
                Some(name) => {
                    let value = func_key(name)
                        .map(|key| u8::from(state.bool_of(key)))
                        .unwrap_or(0);
                    response.push(label(long, "Func Status: ", value.to_string()));
                }
                None => *code = RPRT_ERROR,
            },

            "L" | "set_level" => {
                *set_command = true;
                match (args.get(1), args.get(2)) {
                    (Some(name), Some(value)) => {
                        if !self.set_level(name, value).await {
                            debug!("unimplemented level: {}", name);
                        }
                    }
                    _ => *code = RPRT_ERROR,
                }
            }
            "l" | "get_level" => match args.get(1) {
                Some(name) => {
                    let value = self.get_level(name, state, caps);
                    response.push(label(long, "Level Value: ", value));
                }
                None => *code = RPRT_ERROR,
            },

            "P" | "set_parm" => {
                *set_command = true;
                match (args.get(1), args.get(2)) {
                    (Some(name), Some(value)) => {
                        self.parms.insert(name.to_string(), value.to_string());
                    }
                    _ => *code = RPRT_ERROR,
                }
            }
            "p" | "get_parm" => match args.get(1) {
                Some(name) => {
                    let value = self
                        .parms
                        .get(*name)
                        .cloned()
                        .unwrap_or_else(|| "0".to_string());
                    response.push(label(long, "Parm Value: ", value));
                }
                None => *code = RPRT_ERROR,
            },

            "Y" | "set_ant" => {
                *set_command = true;
                let selectable = caps.map(|c| !c.antennas.is_empty()).unwrap_or(false);
                match args.get(1).map(|n| ant_from_name(n)) {
                    Some(index) if index != 99 && selectable => {
                        self.handle
                            .set(StateKey::Antenna, StateValue::U8(index))
                            .await;
                    }
                    _ => *code = RPRT_ERROR,
                }
            }
            "y" | "get_ant" => {
                let requested = args.get(1).and_then(|v| v.parse::<u8>().ok()).unwrap_or(0);
                let current = state.u8_of(StateKey::Antenna);
                response.push(label(long, "AntCurr: ", ant_name(requested).to_string()));
                response.push(label(long, "Option: ", "0".to_string()));
                response.push(label(long, "AntTx: ", ant_name(current).to_string()));
                response.push(label(long, "AntRx: ", ant_name(current).to_string()));
            }

            "chk_vfo" => {
                self.chk_vfo_seen = true;
                response.push(label(
                    long,
                    "ChkVFO: ",
                    state.u8_of(StateKey::CurrentVfo).to_string(),
                ));
            }
            "get_powerstat" => {
                // The server is reachable, so the rig is on.
                response.push(label(long, "Power Status: ", "1".to_string()));
            }
            "set_powerstat" => {
                *set_command = true;
                let on = args.get(1) != Some(&"0");
                self.handle
                    .set(StateKey::PowerStatus, StateValue::Bool(on))
                    .await;
            }
            "get_lock_mode" => {
                response.push(label(long, "Locked: ", "0".to_string()));
            }

            "get_rig_info" => {
                response.push(dump::rig_info(caps, state, &self.version));
            }
            "get_vfo_info" => {
                let vfo_b = args.get(1) == Some(&"VFOB");
                let key = if vfo_b {
                    StateKey::VfoBFreq
                } else {
                    StateKey::VfoAFreq
                };
                if long {
                    response.push(format!("Freq: {}", state.u64_of(key)));
                    response.push(format!("Mode: {}", mode_name(caps, state)));
                    response.push(format!(
                        "Width: {}",
                        state.effective_passband(current_mode)
                    ));
                    response.push(format!(
                        "Split: {}",
                        u8::from(state.u8_of(StateKey::Duplex) == 0x01)
                    ));
                    response.push("SatMode: 0".to_string());
                } else {
                    response.push(state.u64_of(key).to_string());
                    response.push(mode_name(caps, state));
                    response.push(state.effective_passband(current_mode).to_string());
                }
            }

            "dump_state" => match caps {
                Some(caps) => response.extend(dump::dump_state(caps, self.chk_vfo_seen)),
                None => *code = RPRT_ERROR,
            },
            "1" | "dump_caps" => match caps {
                Some(caps) => {
                    response.push(format!("Caps dump for model: {}", caps.model_id));
                    response.push(format!("Model Name:\t{}", caps.name));
                    response.push("Mfg Name:\tIcom".to_string());
                    response.push(format!("Backend version:\t{}", self.version));
                    response.push(if caps.has_transmit {
                        "Rig type:\tTransceiver".to_string()
                    } else {
                        "Rig type:\tReceiver".to_string()
                    });
                    if caps.has_ptt_cmd {
                        response.push("PTT type:\tRig capable".to_string());
                    }
                    response.push("DCD type:\tRig capable".to_string());
                    response.push("Port type:\tNetwork link".to_string());
                }
                None => *code = RPRT_ERROR,
            },

            "get_dcd" => {
                response.push(format!(
                    "{}",
                    state.u8_of(StateKey::Squelch) as f32 / 255.0
                ));
            }
            "_" | "get_info" => response.push("None".to_string()),

            // Recognized but not implemented
            "send_dtmf" | "recv_dtmf" | "R" | "set_rptr_shift" | "r" | "get_rptr_shift" | "O"
            | "set_rptr_offs" | "o" | "get_rptr_offs" | "C" | "set_ctcss_tone" | "c"
            | "get_ctcss_tone" | "D" | "set_dcs_tone" | "d" | "get_dcs_tone" | "set_ctcss_sql"
            | "get_ctcss_sql" | "set_dcs_sql" | "get_dcs_sql" | "N" | "set_ts" | "n" | "get_ts"
            | "B" | "set_bank" | "b" | "get_bank" | "E" | "set_mem" | "e" | "get_mem" | "G"
            | "vfo_op" | "g" | "scan" | "H" | "set_channel" | "A" | "set_trn" | "a" | "get_trn"
            | "*" | "reset" | "send_morse" | "w" | "send_cmd" | "2" | "power2mW" | "3"
            | "mW2power" | "set_clock" | "get_clock" | "set_vfo_opt" | "set_lock_mode" => {
                *code = RPRT_UNIMPLEMENTED;
            }

            other => {
                info!("unimplemented command: {}", other);
                *code = RPRT_UNIMPLEMENTED;
            }
        }
    }

    async fn set_level(&mut self, name: &str, value: &str) -> bool {
        let gain = || (value.parse::<f32>().unwrap_or(0.0).clamp(0.0, 1.0) * 255.0) as u8;
        let int = || value.parse::<i32>().unwrap_or(0);

        let (key, val) = match name {
            "AF" => (StateKey::AfGain, StateValue::U8(gain())),
            "RF" => (StateKey::RfGain, StateValue::U8(gain())),
            "SQL" => (StateKey::Squelch, StateValue::U8(gain())),
            "RFPOWER" => (StateKey::TxPower, StateValue::U8(gain())),
            "COMP" => (StateKey::CompLevel, StateValue::U8(gain())),
            "MICGAIN" => (StateKey::MicGain, StateValue::U8(gain())),
            "MON" => (StateKey::MonitorGain, StateValue::U8(gain())),
            "VOXGAIN" => (StateKey::VoxGain, StateValue::U8(gain())),
            "ANTIVOX" => (StateKey::AntiVoxGain, StateValue::U8(gain())),
            "NR" => (StateKey::NrLevel, StateValue::U8(gain())),
            "NB" => (StateKey::NbLevel, StateValue::U8(gain())),
            "PBT_IN" => (StateKey::PbtInner, StateValue::U8(gain())),
            "PBT_OUT" => (StateKey::PbtOuter, StateValue::U8(gain())),
            "IF" => (StateKey::PbtInner, StateValue::U8(gain())),
            "AGC" => (StateKey::Agc, StateValue::U8(int() as u8)),
            "ATT" => (StateKey::Attenuator, StateValue::U8(int() as u8)),
            "PREAMP" => (
                StateKey::Preamp,
                StateValue::U8((value.parse::<f32>().unwrap_or(0.0) / 10.0) as u8),
            ),
            "CWPITCH" => (StateKey::CwPitch, StateValue::I32(int())),
            "NOTCHF" => (StateKey::NotchFreq, StateValue::I32(int())),
            "KEYSPD" => (
                StateKey::KeySpeed,
                StateValue::U8(civ_protocol::command::key_speed_raw(int() as u8)),
            ),
            _ => return false,
        };

        self.handle.set(key, val).await;
        true
    }

    fn get_level(&self, name: &str, state: &RigState, caps: Option<&RigCapabilities>) -> String {
        let gain = |key: StateKey| format!("{}", state.u8_of(key) as f32 / 255.0);

        match name {
            "STRENGTH" => {
                let table = table_for_model(caps.map(|c| c.model_id).unwrap_or(0x94));
                calibrate(state.u8_of(StateKey::SMeter), table).to_string()
            }
            "AF" => gain(StateKey::AfGain),
            "RF" => gain(StateKey::RfGain),
            "SQL" => gain(StateKey::Squelch),
            "RFPOWER" => gain(StateKey::TxPower),
            "COMP" => gain(StateKey::CompLevel),
            "MICGAIN" => gain(StateKey::MicGain),
            "MON" => gain(StateKey::MonitorGain),
            "VOXGAIN" => gain(StateKey::VoxGain),
            "ANTIVOX" => gain(StateKey::AntiVoxGain),
            "NR" => gain(StateKey::NrLevel),
            "NB" => gain(StateKey::NbLevel),
            "PBT_IN" | "IF" => gain(StateKey::PbtInner),
            "PBT_OUT" => gain(StateKey::PbtOuter),
            "SWR" => gain(StateKey::SwrMeter),
            "ALC" => gain(StateKey::AlcMeter),
            "RAWSTR" => state.u8_of(StateKey::SMeter).to_string(),
            "PREAMP" => (state.u8_of(StateKey::Preamp) as u32 * 10).to_string(),
            "ATT" => state.u8_of(StateKey::Attenuator).to_string(),
            "AGC" => state.u8_of(StateKey::Agc).to_string(),
            "CWPITCH" => state.i32_of(StateKey::CwPitch).to_string(),
            "NOTCHF" => state.i32_of(StateKey::NotchFreq).to_string(),
            "KEYSPD" => {
                format!(
                    "{}",
                    (state.u8_of(StateKey::KeySpeed) as f32 / 5.1).round() as u8
                )
            }
            _ => "0".to_string(),
        }
    }
}

/// Frequency argument: integer hertz, or a decimal that some clients send
/// in megahertz
fn parse_freq(s: &str) -> Option<u64> {
    if let Ok(hz) = s.parse::<u64>() {
        return Some(hz);
    }
    let value = s.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.round() as u64)
}

fn parse_on_off(s: &str) -> Option<bool> {
    match s {
        "0" | "OFF" | "off" => Some(false),
        "1" | "ON" | "on" => Some(true),
        other => other.parse::<i64>().ok().map(|v| v != 0),
    }
}

/// Hamlib mode name to (CI-V mode code, data flag)
fn parse_mode(s: &str) -> Option<(u8, bool)> {
    match s {
        "LSB" => Some((0x00, false)),
        "USB" => Some((0x01, false)),
        "AM" => Some((0x02, false)),
        "CW" => Some((0x03, false)),
        "RTTY" => Some((0x04, false)),
        "FM" => Some((0x05, false)),
        "WFM" => Some((0x06, false)),
        "CWR" => Some((0x07, false)),
        "RTTYR" => Some((0x08, false)),
        "PSK" => Some((0x12, false)),
        "PSKR" => Some((0x13, false)),
        "PKTLSB" => Some((0x00, true)),
        "PKTUSB" => Some((0x01, true)),
        "PKTAM" => Some((0x02, true)),
        "PKTFM" => Some((0x05, true)),
        _ => None,
    }
}

/// Filter index (1..=3) a passband request maps to, per mode family
fn filter_for_passband(mode_code: u8, passband: u16) -> u8 {
    match mode_code {
        // AM
        0x02 => match passband {
            p if p > 6000 => 1,
            p if p > 3000 => 2,
            _ => 3,
        },
        // FM
        0x05 => match passband {
            p if p > 10000 => 1,
            p if p > 7000 => 2,
            _ => 3,
        },
        // CW / RTTY / their reverses / PSK
        0x03 | 0x04 | 0x07 | 0x08 | 0x12 | 0x13 => match passband {
            p if p > 500 => 1,
            p if p > 250 => 2,
            _ => 3,
        },
        // SSB and everything else
        _ => match passband {
            p if p > 2400 => 1,
            p if p > 1800 => 2,
            _ => 3,
        },
    }
}

fn func_key(name: &str) -> Option<StateKey> {
    match name {
        "NB" => Some(StateKey::NoiseBlankerFunc),
        "NR" => Some(StateKey::NoiseReductionFunc),
        "ANF" => Some(StateKey::AutoNotchFunc),
        "TONE" => Some(StateKey::ToneFunc),
        "TSQL" => Some(StateKey::TsqlFunc),
        "COMP" => Some(StateKey::CompFunc),
        "MON" => Some(StateKey::MonitorFunc),
        "VOX" => Some(StateKey::VoxFunc),
        "SBKIN" => Some(StateKey::SemiBreakInFunc),
        "FBKIN" => Some(StateKey::FullBreakInFunc),
        "MN" => Some(StateKey::ManualNotchFunc),
        "LOCK" => Some(StateKey::LockFunc),
        "SATMODE" => Some(StateKey::SatelliteFunc),
        "SCOPE" => Some(StateKey::ScopeFunc),
        "TUNER" => Some(StateKey::TunerFunc),
        "MUTE" => Some(StateKey::MuteFunc),
        "RIT" => Some(StateKey::RitEnabled),
        _ => None,
    }
}

/// Canonical antenna names
fn ant_name(index: u8) -> &'static str {
    match index {
        0 => "ANT1",
        1 => "ANT2",
        2 => "ANT3",
        3 => "ANT4",
        4 => "ANT5",
        30 => "ANT_UNKNOWN",
        31 => "ANT_CURR",
        _ => "ANT_UNK",
    }
}

fn ant_from_name(name: &str) -> u8 {
    match name.to_ascii_uppercase().as_str() {
        "ANT1" => 0,
        "ANT2" => 1,
        "ANT3" => 2,
        "ANT4" => 3,
        "ANT5" => 4,
        "ANT_UNKNOWN" => 30,
        "ANT_CURR" => 31,
        _ => 99,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freq_argument_forms() {
        assert_eq!(parse_freq("14250000"), Some(14_250_000));
        assert_eq!(parse_freq("14250000.000000"), Some(14_250_000));
        assert_eq!(parse_freq("bogus"), None);
    }

    #[test]
    fn on_off_forms() {
        assert_eq!(parse_on_off("0"), Some(false));
        assert_eq!(parse_on_off("1"), Some(true));
        assert_eq!(parse_on_off("2"), Some(true));
        assert_eq!(parse_on_off("ON"), Some(true));
        assert_eq!(parse_on_off("x"), None);
    }

    #[test]
    fn mode_names_roundtrip_data_variants() {
        assert_eq!(parse_mode("USB"), Some((0x01, false)));
        assert_eq!(parse_mode("PKTUSB"), Some((0x01, true)));
        assert_eq!(parse_mode("CWR"), Some((0x07, false)));
        assert_eq!(parse_mode("FT8"), None);
    }

    #[test]
    fn passband_to_filter_mapping() {
        assert_eq!(filter_for_passband(0x01, 3000), 1);
        assert_eq!(filter_for_passband(0x01, 2400), 2);
        assert_eq!(filter_for_passband(0x01, 1800), 3);
        assert_eq!(filter_for_passband(0x02, 9000), 1);
        assert_eq!(filter_for_passband(0x03, 500), 2);
        assert_eq!(filter_for_passband(0x05, 15000), 1);
    }

    #[test]
    fn antenna_names() {
        assert_eq!(ant_name(0), "ANT1");
        assert_eq!(ant_name(30), "ANT_UNKNOWN");
        assert_eq!(ant_name(31), "ANT_CURR");
        assert_eq!(ant_from_name("ant3"), 2);
        assert_eq!(ant_from_name("whip"), 99);
    }

    #[test]
    fn escape_expansion() {
        assert_eq!(
            ClientSession::expand_escapes(&[0xF0, b'\n']),
            "chk_vfo\n".to_string()
        );
        assert_eq!(
            ClientSession::expand_escapes(&[b'+', 0xF5]),
            "+get_rig_info".to_string()
        );
        assert_eq!(ClientSession::expand_escapes(b"F 14250000"), "F 14250000");
    }
}
