//! CTCSS / DTCS tone encoding
//!
//! CI-V carries tones as one invert-flag byte followed by two BCD digit
//! bytes. A CTCSS frequency is written in tenths of hertz (127.3 Hz =
//! `1273`), a DTCS code as its plain decimal value. The invert bits only
//! matter for DTCS.
//!
//! ```text
//! index:  00 01  02 03 04
//! CTCSS:  1B 01  00 12 73   = PL 127.3
//! D(T)CS: 1B 01  TR 01 23   = T/R invert bits + DCS code 123
//! ```

use crate::bcd::{u16_from_bcd, u16_to_bcd};
use crate::error::ParseError;

/// A CTCSS tone or DTCS code with its invert flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tone {
    /// CTCSS hertz x 10, or the DTCS code
    pub value: u16,
    /// TX invert (DTCS only)
    pub tx_invert: bool,
    /// RX invert (DTCS only)
    pub rx_invert: bool,
}

impl Tone {
    /// A plain CTCSS tone with no inversion
    pub fn ctcss(value: u16) -> Self {
        Self {
            value,
            tx_invert: false,
            rx_invert: false,
        }
    }

    /// A DTCS code with invert flags
    pub fn dtcs(value: u16, tx_invert: bool, rx_invert: bool) -> Self {
        Self {
            value,
            tx_invert,
            rx_invert,
        }
    }

    /// Encode to the three wire bytes
    pub fn encode(&self) -> [u8; 3] {
        let mut invert = 0u8;
        if self.tx_invert {
            invert |= 0x01;
        }
        if self.rx_invert {
            invert |= 0x10;
        }

        let [hi, lo] = u16_to_bcd(self.value);
        [invert, hi, lo]
    }

    /// Decode from the three wire bytes
    pub fn decode(wire: &[u8]) -> Result<Self, ParseError> {
        if wire.len() < 3 {
            return Err(ParseError::TruncatedPayload {
                needed: 3,
                have: wire.len(),
            });
        }

        let tx_invert = wire[0] & 0x01 == 0x01;
        let rx_invert = wire[0] & 0x10 == 0x10;
        let value = u16_from_bcd(wire[1], wire[2])?;

        Ok(Self {
            value,
            tx_invert,
            rx_invert,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ctcss_reference() {
        // PL 127.3
        let tone = Tone::ctcss(1273);
        assert_eq!(tone.encode(), [0x00, 0x12, 0x73]);
        assert_eq!(Tone::decode(&[0x00, 0x12, 0x73]).unwrap(), tone);
    }

    #[test]
    fn dtcs_invert_bits() {
        let tone = Tone::dtcs(123, true, false);
        assert_eq!(tone.encode(), [0x01, 0x01, 0x23]);

        let tone = Tone::dtcs(123, false, true);
        assert_eq!(tone.encode(), [0x10, 0x01, 0x23]);
    }

    #[test]
    fn short_payload_rejected() {
        assert!(Tone::decode(&[0x00, 0x12]).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip(value in 0u16..=9999, tx: bool, rx: bool) {
            let tone = Tone::dtcs(value, tx, rx);
            let wire = tone.encode();
            prop_assert_eq!(Tone::decode(&wire).unwrap(), tone);
        }
    }
}
