//! Audio subchannel buffering
//!
//! Incoming audio packets carry a monotonically increasing sample
//! timestamp. The jitter buffer holds them back for a configurable
//! latency (default 150 ms) so network jitter does not reach the
//! soundcard; packets that arrive behind the read position are dropped,
//! and a read against an empty buffer is an underrun, played silent and
//! counted.
//!
//! Level metering is separate from playout on purpose: a fixed 4-slot
//! ring of peak and RMS values per direction feeds the UI regardless of
//! the latency setting.

use std::collections::BTreeMap;

/// One audio packet as it travels the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Sample-count timestamp, monotonically increasing
    pub timestamp: u32,
    /// Raw sample bytes
    pub samples: Vec<u8>,
}

/// Fixed-size ring of recent amplitude readings
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelRing {
    peaks: [u8; Self::SIZE],
    rms: [u8; Self::SIZE],
    position: usize,
}

impl LevelRing {
    const SIZE: usize = 4;

    pub fn push(&mut self, peak: u8, rms: u8) {
        self.peaks[self.position] = peak;
        self.rms[self.position] = rms;
        self.position = (self.position + 1) % Self::SIZE;
    }

    /// Highest recent peak
    pub fn peak(&self) -> u8 {
        self.peaks.iter().copied().max().unwrap_or(0)
    }

    /// Mean of the recent RMS readings
    pub fn mean_rms(&self) -> u8 {
        (self.rms.iter().map(|&v| v as u32).sum::<u32>() / Self::SIZE as u32) as u8
    }
}

/// Reorder/jitter buffer for the playout path
pub struct JitterBuffer {
    /// Pending packets keyed by timestamp
    queue: BTreeMap<u32, Vec<u8>>,
    /// Next timestamp the consumer expects
    read_pos: u32,
    /// Target depth in samples
    latency_samples: u32,
    /// Samples per millisecond of the negotiated stream
    samples_per_ms: u32,
    /// Underruns observed since creation
    underruns: u32,
    started: bool,
    in_underrun: bool,
}

impl JitterBuffer {
    /// Default playout latency
    pub const DEFAULT_LATENCY_MS: u16 = 150;

    pub fn new(latency_ms: u16, samples_per_ms: u32) -> Self {
        Self {
            queue: BTreeMap::new(),
            read_pos: 0,
            latency_samples: latency_ms as u32 * samples_per_ms,
            samples_per_ms,
            underruns: 0,
            started: false,
            in_underrun: false,
        }
    }

    /// Retune the buffer depth; takes effect for subsequent reads
    pub fn change_latency(&mut self, latency_ms: u16) {
        self.latency_samples = latency_ms as u32 * self.samples_per_ms;
    }

    pub fn underruns(&self) -> u32 {
        self.underruns
    }

    /// Queue a received packet
    ///
    /// Packets behind the read position are late and dropped. During an
    /// underrun the packet is accepted for immediate playout instead of
    /// waiting out the full latency again.
    pub fn push(&mut self, frame: AudioFrame) {
        if self.started && frame.timestamp < self.read_pos {
            tracing::trace!(
                "late audio packet ts {} < read {}, dropped",
                frame.timestamp,
                self.read_pos
            );
            return;
        }
        self.queue.insert(frame.timestamp, frame.samples);
    }

    /// Pull the next packet for playout, if the buffer has matured
    ///
    /// Returns `None` on underrun (and counts it) once the stream has
    /// started. The first packet after an underrun plays immediately
    /// instead of waiting out the full latency again.
    pub fn pop(&mut self) -> Option<AudioFrame> {
        let Some(&newest) = self.queue.keys().next_back() else {
            if self.started && !self.in_underrun {
                self.underruns += 1;
                self.in_underrun = true;
            }
            return None;
        };

        if !self.started {
            // Hold the very first packets until the latency target is
            // covered, then open the tap.
            let oldest = *self.queue.keys().next()?;
            if newest.saturating_sub(oldest) < self.latency_samples {
                return None;
            }
            self.started = true;
            self.read_pos = oldest;
        }

        let ts = self.queue.keys().next().copied()?;
        let mature = ts <= self.read_pos
            || newest.saturating_sub(ts) >= self.latency_samples
            || self.in_underrun;

        if !mature {
            if !self.in_underrun {
                self.underruns += 1;
                self.in_underrun = true;
            }
            return None;
        }

        self.in_underrun = false;
        let samples = self.queue.remove(&ts).unwrap_or_default();
        self.read_pos = ts.saturating_add((samples.len() as u32).max(1));
        Some(AudioFrame {
            timestamp: ts,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: u32, len: usize) -> AudioFrame {
        AudioFrame {
            timestamp: ts,
            samples: vec![0x55; len],
        }
    }

    #[test]
    fn buffer_holds_until_latency_covered() {
        // 150 ms at 8 samples/ms = 1200 samples of depth.
        let mut jb = JitterBuffer::new(150, 8);

        jb.push(frame(0, 160));
        assert!(jb.pop().is_none());

        jb.push(frame(160, 160));
        assert!(jb.pop().is_none());

        // Enough material queued; playout starts at the oldest packet.
        for ts in (320..1440).step_by(160) {
            jb.push(frame(ts, 160));
        }
        let first = jb.pop().expect("buffer matured");
        assert_eq!(first.timestamp, 0);
    }

    #[test]
    fn late_packets_dropped() {
        let mut jb = JitterBuffer::new(10, 8);
        for ts in (0..400).step_by(80) {
            jb.push(frame(ts, 80));
        }
        let first = jb.pop().unwrap();
        assert_eq!(first.timestamp, 0);

        // Behind the read position now.
        jb.push(frame(0, 80));
        let second = jb.pop().unwrap();
        assert_eq!(second.timestamp, 80);
    }

    #[test]
    fn underrun_counted_once_per_gap() {
        let mut jb = JitterBuffer::new(5, 8);
        for ts in (0..200).step_by(40) {
            jb.push(frame(ts, 40));
        }
        while jb.pop().is_some() {}
        assert_eq!(jb.underruns(), 1);

        // Still dry: the same gap is not recounted.
        assert!(jb.pop().is_none());
        assert_eq!(jb.underruns(), 1);

        // A packet arriving mid-underrun plays immediately.
        jb.push(frame(400, 40));
        assert_eq!(jb.pop().unwrap().timestamp, 400);
    }

    #[test]
    fn change_latency_takes_effect() {
        let mut jb = JitterBuffer::new(150, 8);
        jb.push(frame(0, 160));
        jb.push(frame(160, 160));
        assert!(jb.pop().is_none());

        // Dropping the target lets the same queue mature immediately.
        jb.change_latency(10);
        assert!(jb.pop().is_some());
    }

    #[test]
    fn level_ring_tracks_peak_and_mean() {
        let mut ring = LevelRing::default();
        ring.push(10, 8);
        ring.push(200, 100);
        ring.push(50, 40);
        ring.push(60, 52);

        assert_eq!(ring.peak(), 200);
        assert_eq!(ring.mean_rms(), 50);

        // Fifth push evicts the first reading.
        ring.push(0, 0);
        assert_eq!(ring.peak(), 200);
    }
}
