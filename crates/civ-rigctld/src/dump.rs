//! Capability dumps and the rig-info block
//!
//! `dump_state` speaks Hamlib's protocol-v1 capability dump, a fixed
//! sequence of bare values that netrigctl parses positionally. Keep the
//! ordering exactly as clients expect it; stray lines break `rigctl -m 2`.
//!
//! `get_rig_info` returns a labelled multi-line block with an Ethernet
//! CRC-32 trailer over the preceding text.

use civ_protocol::models::{ModeKind, RigCapabilities};
use civ_rig::{RigState, StateKey};

// Hamlib RIG_MODE_* bit positions
const MODE_AM: u64 = 1 << 0;
const MODE_CW: u64 = 1 << 1;
const MODE_USB: u64 = 1 << 2;
const MODE_LSB: u64 = 1 << 3;
const MODE_RTTY: u64 = 1 << 4;
const MODE_FM: u64 = 1 << 5;
const MODE_WFM: u64 = 1 << 6;
const MODE_CWR: u64 = 1 << 7;
const MODE_RTTYR: u64 = 1 << 8;
const MODE_PKTLSB: u64 = 1 << 10;
const MODE_PKTUSB: u64 = 1 << 11;
const MODE_PKTFM: u64 = 1 << 12;
const MODE_PKTAM: u64 = 1 << 22;
const MODE_PSK: u64 = 1 << 30;
const MODE_PSKR: u64 = 1 << 31;

/// Ethernet CRC-32: polynomial 0xEDB88320, init 0xFFFFFFFF, final XOR
/// 0xFFFFFFFF, reflected input and output
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

/// Hamlib mode bitmask for this model
///
/// `family` narrows to modes whose Hamlib name contains the substring
/// (`"SB"`, `"AM"`, `"CW"`, `"FM"`, `"RTTY"`, `"PSK"`), matching how the
/// per-family filter-width lines are built.
pub fn mode_bits(caps: &RigCapabilities, family: Option<&str>) -> u64 {
    let mut bits = 0u64;

    for entry in &caps.modes {
        let pairs: &[(&str, u64)] = match entry.kind {
            ModeKind::Lsb => &[("LSB", MODE_LSB), ("PKTLSB", MODE_PKTLSB)],
            ModeKind::Usb => &[("USB", MODE_USB), ("PKTUSB", MODE_PKTUSB)],
            ModeKind::Am => &[("AM", MODE_AM), ("PKTAM", MODE_PKTAM)],
            ModeKind::Fm => &[("FM", MODE_FM), ("PKTFM", MODE_PKTFM)],
            ModeKind::Cw => &[("CW", MODE_CW)],
            ModeKind::CwR => &[("CWR", MODE_CWR)],
            ModeKind::Rtty => &[("RTTY", MODE_RTTY)],
            ModeKind::RttyR => &[("RTTYR", MODE_RTTYR)],
            ModeKind::Wfm => &[("WFM", MODE_WFM)],
            ModeKind::Psk => &[("PSK", MODE_PSK)],
            ModeKind::PskR => &[("PSKR", MODE_PSKR)],
            _ => &[],
        };

        for &(name, bit) in pairs {
            // The data-mode variants only exist on rigs with data modes.
            if bit & (MODE_PKTLSB | MODE_PKTUSB | MODE_PKTFM | MODE_PKTAM) != 0
                && !caps.has_data_modes
            {
                continue;
            }
            if family.map(|f| name.contains(f)).unwrap_or(true) {
                bits |= bit;
            }
        }
    }

    bits
}

/// Antenna bitmask: one bit per selectable antenna
pub fn antenna_bits(caps: &RigCapabilities) -> u32 {
    caps.antennas.iter().fold(0, |acc, &a| acc | (1 << a))
}

/// The Hamlib protocol-v1 `dump_state` block
pub fn dump_state(caps: &RigCapabilities, chk_vfo_seen: bool) -> Vec<String> {
    let mut out = Vec::new();
    let modes = mode_bits(caps, None);
    let ants = antenna_bits(caps);

    // Protocol version, rig model, former ITU region
    out.push("1".to_string());
    out.push(caps.hamlib_model.to_string());
    out.push("0".to_string());

    // RX range: the whole span the band list covers
    let low = caps.bands.iter().map(|b| b.low_hz).min().unwrap_or(0);
    let high = caps.bands.iter().map(|b| b.high_hz).max().unwrap_or(0);
    out.push(format!(
        "{low}.000000 {high}.000000 0x{modes:x} -1 -1 0x16000000 0x{ants:x}"
    ));
    out.push("0 0 0 0 0 0 0".to_string());

    // TX ranges, per band
    if caps.has_transmit {
        for band in &caps.bands {
            out.push(format!(
                "{}.000000 {}.000000 0x{modes:x} 2000 100000 0x16000000 0x{ants:x}",
                band.low_hz, band.high_hz
            ));
        }
    }
    out.push("0 0 0 0 0 0 0".to_string());

    // Tuning steps
    for step in [
        1u32, 10, 100, 1000, 2500, 5000, 6125, 8333, 10000, 12500, 25000, 100000, 250000, 1000000,
    ] {
        out.push(format!("0x{modes:x} {step}"));
    }
    out.push("0 0".to_string());

    // Filter widths per mode family
    let families: [(&str, [u16; 3]); 6] = [
        ("SB", [3000, 2400, 1800]),
        ("AM", [9000, 6000, 3000]),
        ("CW", [1200, 500, 200]),
        ("FM", [15000, 10000, 7000]),
        ("RTTY", [2400, 500, 250]),
        ("PSK", [1200, 500, 250]),
    ];
    for (family, widths) in families {
        let bits = mode_bits(caps, Some(family));
        if bits != 0 {
            for width in widths {
                out.push(format!("0x{bits:x} {width}"));
            }
        }
    }
    out.push("0 0".to_string());

    // Max RIT, max XIT, max IF shift, announce capability
    out.push("9900".to_string());
    out.push("9900".to_string());
    out.push("10000".to_string());
    out.push("0".to_string());

    // Preamp gains in dB
    let preamps: Vec<String> = caps
        .preamps
        .iter()
        .filter(|&&p| p != 0)
        .map(|p| (*p as u32 * 10).to_string())
        .collect();
    out.push(if preamps.is_empty() {
        "0".to_string()
    } else {
        preamps.join(" ")
    });

    // Attenuator values, hex
    let attens: Vec<String> = caps
        .attenuators
        .iter()
        .filter(|&&a| a != 0)
        .map(|a| format!("{a:x}"))
        .collect();
    out.push(if attens.is_empty() {
        "0".to_string()
    } else {
        attens.join(" ")
    });

    // get_func / set_func / get_level / set_level / get_parm / set_parm
    for _ in 0..6 {
        out.push("0xffffffffffffffff".to_string());
    }

    if chk_vfo_seen {
        out.push(format!("vfo_ops=0x{:x}", 255));
        out.push(format!("ptt_type=0x{:x}", u8::from(caps.has_transmit)));
        out.push("has_set_vfo=0x1".to_string());
        out.push("has_get_vfo=0x1".to_string());
        out.push("has_set_freq=0x1".to_string());
        out.push("has_get_freq=0x1".to_string());
        out.push("has_set_conf=0x1".to_string());
        out.push("has_get_conf=0x1".to_string());
        out.push("has_power2mW=0x1".to_string());
        out.push("has_mW2power=0x1".to_string());
        out.push(format!("timeout=0x{:x}", 1000));
        out.push("done".to_string());
    }

    out
}

/// Hamlib mode name for the register's current mode
pub fn mode_name(caps: Option<&RigCapabilities>, state: &RigState) -> String {
    let code = state.u8_of(StateKey::Mode);
    let data = state.bool_of(StateKey::DataMode);
    caps.and_then(|c| c.mode_for_code(code))
        .map(|kind| kind.hamlib_name(data).to_string())
        .unwrap_or_else(|| "USB".to_string())
}

/// The labelled `get_rig_info` block, CRC trailer included
pub fn rig_info(caps: Option<&RigCapabilities>, state: &RigState, version: &str) -> String {
    let split = u8::from(state.u8_of(StateKey::Duplex) == 0x01);
    let rx_a = 1;
    let tx_a = u8::from(split == 0);
    let rx_b = 0;
    let tx_b = u8::from(split == 1);

    let mode = mode_name(caps, state);
    let width = state.effective_passband(
        caps.and_then(|c| c.mode_for_code(state.u8_of(StateKey::Mode))),
    );
    let rig = caps.map(|c| c.name.clone()).unwrap_or_else(|| "none".to_string());
    let satmode = u8::from(state.bool_of(StateKey::SatelliteFunc));

    let body = format!(
        "VFO=VFOA Freq={} Mode={} Width={} RX={} TX={}\n\
         VFO=VFOB Freq={} Mode={} Width={} RX={} TX={}\n\
         Split={} SatMode={}\n\
         Rig={}\n\
         App=wfview\n\
         Version={}\n",
        state.u64_of(StateKey::VfoAFreq),
        mode,
        width,
        rx_a,
        tx_a,
        state.u64_of(StateKey::VfoBFreq),
        mode,
        width,
        rx_b,
        tx_b,
        split,
        satmode,
        rig,
        version,
    );

    let crc = crc32(body.as_bytes());
    format!("{body}CRC=0x{crc:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use civ_rig::StateValue;

    #[test]
    fn crc32_check_value() {
        // The classic CRC-32 check vector.
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn rig_info_crc_trailer_matches_body() {
        let caps = RigCapabilities::for_model(0x94, 0x94);
        let mut state = RigState::new();
        state.set_from_rig(StateKey::VfoAFreq, StateValue::U64(14_250_000));
        state.set_from_rig(StateKey::Mode, StateValue::U8(0x01));
        state.set_from_rig(StateKey::Filter, StateValue::U8(1));

        let info = rig_info(Some(&caps), &state, "0.4.0");
        let (body, trailer) = info.rsplit_once("CRC=0x").unwrap();
        let declared = u32::from_str_radix(trailer, 16).unwrap();
        assert_eq!(declared, crc32(body.as_bytes()));
        assert!(body.contains("Freq=14250000"));
        assert!(body.contains("App=wfview"));
        assert!(body.contains("Rig=IC-7300"));
    }

    #[test]
    fn dump_state_shape() {
        let caps = RigCapabilities::for_model(0x94, 0x94);
        let lines = dump_state(&caps, false);

        assert_eq!(lines[0], "1");
        assert_eq!(lines[1], "3073");
        assert_eq!(lines[2], "0");
        // Two band-range delimiters and the step/filter delimiters.
        assert_eq!(lines.iter().filter(|l| *l == "0 0 0 0 0 0 0").count(), 2);
        assert!(lines.iter().filter(|l| *l == "0 0").count() >= 2);
        // No trailer until chk_vfo has run.
        assert!(!lines.iter().any(|l| l.starts_with("vfo_ops=")));
        assert_ne!(lines.last().map(String::as_str), Some("done"));

        let lines = dump_state(&caps, true);
        assert!(lines.iter().any(|l| l == "has_set_vfo=0x1"));
        assert_eq!(lines.last().map(String::as_str), Some("done"));
    }

    #[test]
    fn preamp_and_attenuator_lines() {
        let caps = RigCapabilities::for_model(0x94, 0x94);
        let lines = dump_state(&caps, false);
        // IC-7300: preamps 1 and 2 -> "10 20"; single 0x20 attenuator.
        assert!(lines.contains(&"10 20".to_string()));
        assert!(lines.contains(&"20".to_string()));
    }

    #[test]
    fn mode_bits_families() {
        let caps = RigCapabilities::for_model(0x94, 0x94);
        let all = mode_bits(&caps, None);
        assert!(all & MODE_USB != 0);
        assert!(all & MODE_PKTUSB != 0);
        assert!(all & MODE_PSK == 0);

        let ssb = mode_bits(&caps, Some("SB"));
        assert!(ssb & MODE_USB != 0);
        assert!(ssb & MODE_LSB != 0);
        assert!(ssb & MODE_CW == 0);

        let psk = mode_bits(&caps, Some("PSK"));
        assert_eq!(psk, 0);
    }
}
