use crate::detectors::rr::RrVerdict;
use serde::{Deserialize, Serialize};

/// One raw amplitude reading as delivered by the sampling front end.
pub type Sample = u16;

/// Ceiling of the 10-bit converter the detector was tuned for.
pub const ADC_MAX: Sample = 1023;

/// Which part of the cardiac cycle the detector believes is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum BeatPhase {
    Qrs = 0,
    T = 1,
}

impl BeatPhase {
    /// Single-byte encoding used on the serial line.
    pub fn symbol(self) -> u8 {
        self as u8
    }

    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            0 => Some(BeatPhase::Qrs),
            1 => Some(BeatPhase::T),
            _ => None,
        }
    }
}

/// A confirmed beat evaluation, emitted once per dual-channel agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatEvent {
    /// Zero-based index of the sample that completed the detection
    pub sample_index: u64,
    /// Ticks since the previous agreed beat
    pub rr_interval: u32,
    pub rr_verdict: RrVerdict,
    pub phase: BeatPhase,
    /// Derivative filter output at the detection tick
    pub amplitude: i32,
}

/// Aggregate over a processed stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    pub samples: u64,
    pub beats: usize,
    pub qrs: usize,
    pub t_waves: usize,
    /// Mean of confirmed RR intervals, in samples
    pub mean_rr: Option<f64>,
    #[serde(skip)]
    confirmed_rr_total: u64,
    #[serde(skip)]
    confirmed_rr_count: u64,
}

impl StreamSummary {
    pub fn record_sample(&mut self) {
        self.samples += 1;
    }

    pub fn record_event(&mut self, event: &BeatEvent) {
        self.beats += 1;
        match event.phase {
            BeatPhase::Qrs => self.qrs += 1,
            BeatPhase::T => self.t_waves += 1,
        }
        if event.rr_verdict == RrVerdict::Confirmed {
            self.confirmed_rr_total += u64::from(event.rr_interval);
            self.confirmed_rr_count += 1;
            self.mean_rr = Some(self.confirmed_rr_total as f64 / self.confirmed_rr_count as f64);
        }
    }

    pub fn from_events(samples: u64, events: &[BeatEvent]) -> Self {
        let mut summary = Self {
            samples,
            ..Self::default()
        };
        for event in events {
            summary.record_event(event);
        }
        summary
    }

    /// Heart rate implied by the mean confirmed RR interval.
    pub fn bpm(&self, sample_rate_hz: f64) -> Option<f64> {
        self.mean_rr
            .filter(|rr| *rr > 0.0)
            .map(|rr| 60.0 * sample_rate_hz / rr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(phase: BeatPhase, rr_interval: u32, rr_verdict: RrVerdict) -> BeatEvent {
        BeatEvent {
            sample_index: 0,
            rr_interval,
            rr_verdict,
            phase,
            amplitude: 0,
        }
    }

    #[test]
    fn symbols_round_trip_through_bytes() {
        assert_eq!(BeatPhase::Qrs.symbol(), 0);
        assert_eq!(BeatPhase::T.symbol(), 1);
        assert_eq!(BeatPhase::from_symbol(1), Some(BeatPhase::T));
        assert_eq!(BeatPhase::from_symbol(7), None);
    }

    #[test]
    fn summary_averages_confirmed_intervals_only() {
        let events = [
            event(BeatPhase::Qrs, 45, RrVerdict::Missed),
            event(BeatPhase::Qrs, 160, RrVerdict::Confirmed),
            event(BeatPhase::T, 20, RrVerdict::Rejected),
            event(BeatPhase::Qrs, 200, RrVerdict::Confirmed),
        ];
        let summary = StreamSummary::from_events(1000, &events);
        assert_eq!(summary.beats, 4);
        assert_eq!(summary.qrs, 3);
        assert_eq!(summary.t_waves, 1);
        assert_eq!(summary.mean_rr, Some(180.0));
        let bpm = summary.bpm(200.0).expect("bpm");
        assert!((bpm - 66.666).abs() < 1e-2);
    }

    #[test]
    fn summary_without_confirmed_beats_has_no_rate() {
        let summary = StreamSummary::from_events(10, &[]);
        assert_eq!(summary.mean_rr, None);
        assert_eq!(summary.bpm(200.0), None);
    }

    #[test]
    fn beat_event_serializes_lowercase_phase() {
        let js = serde_json::to_string(&event(BeatPhase::Qrs, 160, RrVerdict::Confirmed))
            .expect("serialize");
        assert!(js.contains("\"phase\":\"qrs\""));
        assert!(js.contains("\"rr_verdict\":\"confirmed\""));
    }
}
