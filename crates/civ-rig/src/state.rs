//! Rig state register
//!
//! A fixed enumeration of rig properties, each carrying two flags next to
//! its value: `valid` (the rig has confirmed this value at least once) and
//! `updated` (an external agent wrote it since the last reconciliation).
//!
//! The declaration order of [`StateKey`] is the reconciliation order and
//! is observable by clients, so treat it as part of the contract.

use std::collections::BTreeMap;

use civ_protocol::models::ModeKind;

/// Every property the register tracks
///
/// Reconciliation visits marked keys in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum StateKey {
    // Tuning
    CurrentVfo,
    VfoAFreq,
    VfoBFreq,
    Mode,
    Filter,
    DataMode,
    Passband,
    Duplex,
    RitValue,
    RitEnabled,

    // Transmit chain
    Ptt,
    PowerStatus,

    // Front end
    Preamp,
    Attenuator,
    Antenna,
    RxAntenna,
    Agc,

    // Gains and levels
    AfGain,
    RfGain,
    Squelch,
    MicGain,
    CompLevel,
    MonitorGain,
    VoxGain,
    AntiVoxGain,
    TxPower,
    NbLevel,
    NrLevel,
    CwPitch,
    KeySpeed,
    NotchFreq,
    PbtInner,
    PbtOuter,

    // Feature toggles
    NoiseBlankerFunc,
    NoiseReductionFunc,
    AutoNotchFunc,
    ToneFunc,
    TsqlFunc,
    CompFunc,
    MonitorFunc,
    VoxFunc,
    SemiBreakInFunc,
    FullBreakInFunc,
    ManualNotchFunc,
    TunerFunc,
    LockFunc,
    ScopeFunc,
    SatelliteFunc,
    IpPlusFunc,
    MuteFunc,

    // Meters
    SMeter,
    CenterMeter,
    PowerMeter,
    SwrMeter,
    AlcMeter,
    CompMeter,
    VdMeter,
    IdMeter,

    // Tones
    CtcssTone,
    TsqlTone,
    DtcsCode,
    CsqlCode,
}

/// A tagged property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum StateValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    I32(i32),
    U64(u64),
}

impl StateValue {
    pub fn as_bool(&self) -> bool {
        match self {
            StateValue::Bool(b) => *b,
            StateValue::U8(v) => *v != 0,
            StateValue::U16(v) => *v != 0,
            StateValue::I32(v) => *v != 0,
            StateValue::U64(v) => *v != 0,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            StateValue::Bool(b) => u8::from(*b),
            StateValue::U8(v) => *v,
            StateValue::U16(v) => (*v).min(255) as u8,
            StateValue::I32(v) => (*v).clamp(0, 255) as u8,
            StateValue::U64(v) => (*v).min(255) as u8,
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            StateValue::Bool(b) => u16::from(*b),
            StateValue::U8(v) => *v as u16,
            StateValue::U16(v) => *v,
            StateValue::I32(v) => (*v).clamp(0, u16::MAX as i32) as u16,
            StateValue::U64(v) => (*v).min(u16::MAX as u64) as u16,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            StateValue::Bool(b) => i32::from(*b),
            StateValue::U8(v) => *v as i32,
            StateValue::U16(v) => *v as i32,
            StateValue::I32(v) => *v,
            StateValue::U64(v) => (*v).min(i32::MAX as u64) as i32,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            StateValue::Bool(b) => u64::from(*b),
            StateValue::U8(v) => *v as u64,
            StateValue::U16(v) => *v as u64,
            StateValue::I32(v) => (*v).max(0) as u64,
            StateValue::U64(v) => *v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
struct Entry {
    value: StateValue,
    valid: bool,
    updated: bool,
}

/// The observable rig state register
///
/// Readers get value copies; writers flip the flags that drive the
/// reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct RigState {
    entries: BTreeMap<StateKey, Entry>,
}

impl RigState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rig-confirmed value: sets `valid`, clears `updated`
    pub fn set_from_rig(&mut self, key: StateKey, value: StateValue) -> bool {
        let entry = self.entries.entry(key).or_insert(Entry {
            value,
            valid: false,
            updated: false,
        });
        let changed = !entry.valid || entry.value != value;
        entry.value = value;
        entry.valid = true;
        entry.updated = false;
        changed
    }

    /// Record an external write: marks the key for reconciliation
    pub fn set_from_client(&mut self, key: StateKey, value: StateValue) {
        let entry = self.entries.entry(key).or_insert(Entry {
            value,
            valid: false,
            updated: true,
        });
        entry.value = value;
        entry.updated = true;
    }

    /// Snapshot one value
    pub fn get(&self, key: StateKey) -> Option<StateValue> {
        self.entries.get(&key).map(|e| e.value)
    }

    pub fn is_valid(&self, key: StateKey) -> bool {
        self.entries.get(&key).map(|e| e.valid).unwrap_or(false)
    }

    pub fn is_updated(&self, key: StateKey) -> bool {
        self.entries.get(&key).map(|e| e.updated).unwrap_or(false)
    }

    /// Keys awaiting reconciliation, in key-enumeration order
    pub fn updated_keys(&self) -> Vec<StateKey> {
        self.entries
            .iter()
            .filter(|(_, e)| e.updated)
            .map(|(k, _)| *k)
            .collect()
    }

    /// Clear the `updated` flag and mark the value optimistically valid;
    /// the rig's read reply re-confirms it later
    pub fn settle(&mut self, key: StateKey) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.updated = false;
            entry.valid = true;
        }
    }

    // Typed convenience accessors with quiet defaults

    pub fn bool_of(&self, key: StateKey) -> bool {
        self.get(key).map(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn u8_of(&self, key: StateKey) -> u8 {
        self.get(key).map(|v| v.as_u8()).unwrap_or(0)
    }

    pub fn u16_of(&self, key: StateKey) -> u16 {
        self.get(key).map(|v| v.as_u16()).unwrap_or(0)
    }

    pub fn i32_of(&self, key: StateKey) -> i32 {
        self.get(key).map(|v| v.as_i32()).unwrap_or(0)
    }

    pub fn u64_of(&self, key: StateKey) -> u64 {
        self.get(key).map(|v| v.as_u64()).unwrap_or(0)
    }

    /// Passband in hertz, falling back to the conventional width for the
    /// current mode and filter while the rig has not reported one
    ///
    /// Any rig-reported passband overwrites the fallback.
    pub fn effective_passband(&self, mode: Option<ModeKind>) -> u16 {
        if self.is_valid(StateKey::Passband) {
            return self.u16_of(StateKey::Passband);
        }
        let filter = self.u8_of(StateKey::Filter).clamp(1, 3);
        let data = self.bool_of(StateKey::DataMode);
        default_passband(mode, data, filter)
    }
}

/// Conventional passband for a mode/filter pair, used until the rig
/// reports the real one
pub fn default_passband(mode: Option<ModeKind>, data_mode: bool, filter: u8) -> u16 {
    use ModeKind::*;

    let filter = filter.clamp(1, 3);
    match mode {
        Some(Am) => [9000, 6000, 3000][filter as usize - 1],
        Some(Fm) | Some(Wfm) => [15000, 10000, 7000][filter as usize - 1],
        Some(Cw) | Some(CwR) | Some(Rtty) | Some(RttyR) | Some(Psk) | Some(PskR) => {
            [1200, 500, 250][filter as usize - 1]
        }
        Some(Lsb) | Some(Usb) if data_mode => [2400, 500, 250][filter as usize - 1],
        _ => [3000, 2400, 1800][filter as usize - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_write_marks_updated() {
        let mut state = RigState::new();
        state.set_from_client(StateKey::VfoAFreq, StateValue::U64(14_250_000));

        assert!(state.is_updated(StateKey::VfoAFreq));
        assert!(!state.is_valid(StateKey::VfoAFreq));
        assert_eq!(state.updated_keys(), vec![StateKey::VfoAFreq]);
    }

    #[test]
    fn rig_confirmation_clears_updated() {
        let mut state = RigState::new();
        state.set_from_client(StateKey::Ptt, StateValue::Bool(true));
        state.set_from_rig(StateKey::Ptt, StateValue::Bool(true));

        assert!(state.is_valid(StateKey::Ptt));
        assert!(!state.is_updated(StateKey::Ptt));
    }

    #[test]
    fn updated_keys_follow_declaration_order() {
        let mut state = RigState::new();
        state.set_from_client(StateKey::SMeter, StateValue::U8(0));
        state.set_from_client(StateKey::VfoAFreq, StateValue::U64(7_074_000));
        state.set_from_client(StateKey::Mode, StateValue::U8(1));

        assert_eq!(
            state.updated_keys(),
            vec![StateKey::VfoAFreq, StateKey::Mode, StateKey::SMeter]
        );
    }

    #[test]
    fn settle_clears_every_updated_flag() {
        let mut state = RigState::new();
        state.set_from_client(StateKey::AfGain, StateValue::U8(100));
        state.set_from_client(StateKey::RfGain, StateValue::U8(200));

        for key in state.updated_keys() {
            state.settle(key);
        }
        assert!(state.updated_keys().is_empty());
        assert!(state.is_valid(StateKey::AfGain));
    }

    #[test]
    fn passband_defaults_by_mode_and_filter() {
        let state = RigState::new();
        assert_eq!(state.effective_passband(Some(ModeKind::Usb)), 3000);

        let mut state = RigState::new();
        state.set_from_rig(StateKey::Filter, StateValue::U8(2));
        assert_eq!(state.effective_passband(Some(ModeKind::Usb)), 2400);
        assert_eq!(state.effective_passband(Some(ModeKind::Am)), 6000);
        assert_eq!(state.effective_passband(Some(ModeKind::Fm)), 10000);
        assert_eq!(state.effective_passband(Some(ModeKind::Cw)), 500);

        state.set_from_rig(StateKey::DataMode, StateValue::Bool(true));
        state.set_from_rig(StateKey::Filter, StateValue::U8(1));
        assert_eq!(state.effective_passband(Some(ModeKind::Usb)), 2400);
    }

    #[test]
    fn reported_passband_beats_the_fallback() {
        let mut state = RigState::new();
        state.set_from_rig(StateKey::Filter, StateValue::U8(1));
        state.set_from_rig(StateKey::Passband, StateValue::U16(2700));
        assert_eq!(state.effective_passband(Some(ModeKind::Usb)), 2700);
    }
}
