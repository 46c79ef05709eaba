pub mod beat;
pub mod peak;
pub mod qrs;
pub mod rr;

pub use beat::{BeatStateMachine, InitialPhase};
pub use peak::{PeakClassifier, PeakDetector, PeakKind, Slope};
pub use qrs::{detect_beats, DetectorConfig, QrsDetector};
pub use rr::{RrLimits, RrValidator, RrVerdict};
