//! Panadapter line reassembly
//!
//! Scope data arrives as `27 00` fragments. Fragment 1 carries the wave
//! information (scope mode, edge frequencies, out-of-range flag) and no
//! pixels; fragments 2..N-1 carry 50 pixel bytes each; fragment N carries
//! the final 25. Over the native LAN the radio ships the whole line in a
//! single oversized fragment instead.
//!
//! Layout of fragment 1 (payload indexes, `27 00` at 0..1):
//!
//! ```text
//! [2]      VFO (BCD; 1 = sub receiver, discarded)
//! [3]      sequence number (BCD)
//! [4]      sequence max (BCD)
//! [5]      scope mode: 00 center, 01 fixed, 02/03 scroll
//! [6..11]  first frequency, little-endian BCD
//! [11..16] second frequency, little-endian BCD
//! [16]     out-of-range flag
//! ```
//!
//! In fixed mode the two frequencies are the edges; in center mode they
//! are center and half-span, converted here so consumers always see
//! start/end.

use crate::bcd::{byte_from_bcd, freq_from_bcd};
use crate::command::SpectrumMode;

/// One assembled scope line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumLine {
    pub start_hz: u64,
    pub end_hz: u64,
    pub pixels: Vec<u8>,
}

/// Side events surfaced while assembling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    Line(SpectrumLine),
    ModeChanged(SpectrumMode),
    OutOfRange(bool),
}

/// Reassembles multi-fragment scope frames for the primary receiver
///
/// Any fragment arriving out of order throws away the line in progress;
/// accumulation restarts at the next fragment 1.
pub struct SpectrumAssembler {
    seq_max: u8,
    len_max: usize,
    pixels: Vec<u8>,
    start_hz: u64,
    end_hz: u64,
    next_seq: u8,
    mode: Option<SpectrumMode>,
    out_of_range: bool,
}

impl SpectrumAssembler {
    /// Build an assembler from the model's spectrum parameters
    pub fn new(seq_max: u8, len_max: u16) -> Self {
        Self {
            seq_max,
            len_max: len_max as usize,
            pixels: Vec::with_capacity(len_max as usize),
            start_hz: 0,
            end_hz: 0,
            next_seq: 0,
            mode: None,
            out_of_range: false,
        }
    }

    /// Feed one `27 00` payload; returns whatever became observable
    pub fn push_fragment(&mut self, payload: &[u8]) -> Vec<ScopeEvent> {
        let mut events = Vec::new();

        if self.seq_max == 0 || payload.len() < 5 {
            return events;
        }

        let Ok(vfo) = byte_from_bcd(payload[2]) else {
            self.reset();
            return events;
        };
        if vfo == 1 {
            // Sub receiver; only the primary feeds the waterfall.
            return events;
        }

        let Ok(sequence) = byte_from_bcd(payload[3]) else {
            self.reset();
            return events;
        };

        if sequence == 1 {
            self.begin_line(payload, &mut events);
        } else if sequence == self.next_seq && sequence <= self.seq_max {
            self.append_pixels(&payload[5..]);
            if sequence == self.seq_max {
                events.push(ScopeEvent::Line(self.take_line()));
            } else {
                self.next_seq = sequence + 1;
            }
        } else {
            // Missing or duplicated fragment: drop the partial line.
            self.reset();
        }

        events
    }

    fn begin_line(&mut self, payload: &[u8], events: &mut Vec<ScopeEvent>) {
        self.pixels.clear();
        self.next_seq = 0;

        if payload.len() < 16 {
            return;
        }

        if let Some(mode) = SpectrumMode::from_code(payload[5]) {
            if self.mode != Some(mode) {
                self.mode = Some(mode);
                events.push(ScopeEvent::ModeChanged(mode));
            }
        }

        let out_of_range = payload.get(16).copied().unwrap_or(0) != 0;
        if out_of_range != self.out_of_range {
            self.out_of_range = out_of_range;
            events.push(ScopeEvent::OutOfRange(out_of_range));
        }

        let (Ok(first), Ok(second)) = (
            freq_from_bcd(&payload[6..11]),
            freq_from_bcd(&payload[11..16]),
        ) else {
            return;
        };

        if self.mode == Some(SpectrumMode::Center) {
            // First is the center, second the half-span.
            self.start_hz = first.saturating_sub(second);
            self.end_hz = first + second;
        } else {
            self.start_hz = first;
            self.end_hz = second;
        }

        if payload.len() > 400 {
            // Native-LAN form: the entire line follows the wave information.
            self.append_pixels(&payload[17..]);
            events.push(ScopeEvent::Line(self.take_line()));
        } else {
            self.next_seq = 2;
        }
    }

    fn append_pixels(&mut self, data: &[u8]) {
        let room = self.len_max.saturating_sub(self.pixels.len());
        self.pixels.extend_from_slice(&data[..data.len().min(room)]);
    }

    fn take_line(&mut self) -> SpectrumLine {
        self.next_seq = 0;
        SpectrumLine {
            start_hz: self.start_hz,
            end_hz: self.end_hz,
            pixels: std::mem::take(&mut self.pixels),
        }
    }

    fn reset(&mut self) {
        self.pixels.clear();
        self.next_seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bcd::freq_to_bcd;

    fn first_fragment(mode: u8, f1: u64, f2: u64, seq_max: u8) -> Vec<u8> {
        let mut p = vec![0x27, 0x00, 0x00, 0x01, crate::bcd::byte_to_bcd(seq_max), mode];
        p.extend(freq_to_bcd(f1, 5));
        p.extend(freq_to_bcd(f2, 5));
        p.push(0x00); // in range
        p
    }

    fn pixel_fragment(seq: u8, count: usize, fill: u8) -> Vec<u8> {
        let mut p = vec![0x27, 0x00, 0x00, crate::bcd::byte_to_bcd(seq), 0x11];
        p.extend(std::iter::repeat(fill).take(count));
        p
    }

    #[test]
    fn eleven_fragment_center_mode_line() {
        let mut asm = SpectrumAssembler::new(11, 475);

        // center 14.2 MHz, half-span 50 kHz
        let events = asm.push_fragment(&first_fragment(0x00, 14_200_000, 50_000, 11));
        assert!(events
            .iter()
            .any(|e| matches!(e, ScopeEvent::ModeChanged(SpectrumMode::Center))));

        for seq in 2..11 {
            assert!(asm.push_fragment(&pixel_fragment(seq, 50, seq)).is_empty());
        }
        let events = asm.push_fragment(&pixel_fragment(11, 25, 0xAA));

        let line = events
            .iter()
            .find_map(|e| match e {
                ScopeEvent::Line(line) => Some(line),
                _ => None,
            })
            .expect("line emitted on final fragment");

        assert_eq!(line.start_hz, 14_150_000);
        assert_eq!(line.end_hz, 14_250_000);
        assert_eq!(line.pixels.len(), 475);
    }

    #[test]
    fn fixed_mode_edges_pass_through() {
        let mut asm = SpectrumAssembler::new(11, 475);
        asm.push_fragment(&first_fragment(0x01, 14_000_000, 14_350_000, 11));

        for seq in 2..11 {
            asm.push_fragment(&pixel_fragment(seq, 50, 0));
        }
        let events = asm.push_fragment(&pixel_fragment(11, 25, 0));
        match &events[0] {
            ScopeEvent::Line(line) => {
                assert_eq!(line.start_hz, 14_000_000);
                assert_eq!(line.end_hz, 14_350_000);
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn missing_fragment_discards_line() {
        let mut asm = SpectrumAssembler::new(11, 475);
        asm.push_fragment(&first_fragment(0x01, 14_000_000, 14_350_000, 11));
        asm.push_fragment(&pixel_fragment(2, 50, 0));
        // Fragment 3 lost; 4 arrives.
        assert!(asm.push_fragment(&pixel_fragment(4, 50, 0)).is_empty());

        // The rest of the pass produces nothing.
        for seq in 5..=11 {
            assert!(asm.push_fragment(&pixel_fragment(seq, 50, 0)).is_empty());
        }
    }

    #[test]
    fn sub_receiver_fragments_ignored() {
        let mut asm = SpectrumAssembler::new(11, 475);
        let mut frag = first_fragment(0x01, 14_000_000, 14_350_000, 11);
        frag[2] = 0x01; // sub receiver
        assert!(asm.push_fragment(&frag).is_empty());
    }

    #[test]
    fn lan_single_fragment_emits_immediately() {
        let mut asm = SpectrumAssembler::new(11, 475);
        let mut frag = first_fragment(0x00, 14_200_000, 50_000, 11);
        frag.extend(std::iter::repeat(0x30).take(475));

        let events = asm.push_fragment(&frag);
        let line = events
            .iter()
            .find_map(|e| match e {
                ScopeEvent::Line(line) => Some(line),
                _ => None,
            })
            .expect("single-datagram line");
        assert_eq!(line.pixels.len(), 475);
        assert_eq!(line.start_hz, 14_150_000);
    }

    #[test]
    fn out_of_range_flag_edges() {
        let mut asm = SpectrumAssembler::new(11, 475);
        let mut frag = first_fragment(0x01, 14_000_000, 14_350_000, 11);
        frag[16] = 0x01;

        let events = asm.push_fragment(&frag);
        assert!(events.contains(&ScopeEvent::OutOfRange(true)));

        // Unchanged flag stays quiet.
        let events = asm.push_fragment(&frag);
        assert!(!events.contains(&ScopeEvent::OutOfRange(true)));
    }
}
