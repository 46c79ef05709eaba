use crate::signal::BeatPhase;
use serde::{Deserialize, Serialize};

/// Phase the state machine starts in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialPhase {
    /// Stay silent until the first beat with a valid RR interval.
    #[default]
    Unknown,
    Qrs,
    T,
}

/// QRS / T-wave arbitration over confirmed dual-channel detections.
#[derive(Debug, Clone)]
pub struct BeatStateMachine {
    phase: Option<BeatPhase>,
    last_qrs_amplitude: i32,
}

impl BeatStateMachine {
    pub fn new(initial: InitialPhase) -> Self {
        let phase = match initial {
            InitialPhase::Unknown => None,
            InitialPhase::Qrs => Some(BeatPhase::Qrs),
            InitialPhase::T => Some(BeatPhase::T),
        };
        Self {
            phase,
            last_qrs_amplitude: 0,
        }
    }

    /// Advance on one agreed detection and return the phase to emit, if any.
    ///
    /// `amplitude` is the derivative filter output at the detection tick.
    pub fn evaluate(&mut self, rr_valid: bool, amplitude: i32) -> Option<BeatPhase> {
        match self.phase {
            None | Some(BeatPhase::T) if rr_valid => {
                self.last_qrs_amplitude = amplitude;
                self.phase = Some(BeatPhase::Qrs);
            }
            Some(BeatPhase::Qrs) if amplitude <= self.last_qrs_amplitude >> 1 => {
                self.phase = Some(BeatPhase::T);
            }
            _ => {}
        }
        self.phase
    }

    pub fn phase(&self) -> Option<BeatPhase> {
        self.phase
    }

    pub fn last_qrs_amplitude(&self) -> i32 {
        self.last_qrs_amplitude
    }
}

impl Default for BeatStateMachine {
    fn default() -> Self {
        Self::new(InitialPhase::default())
    }
}
