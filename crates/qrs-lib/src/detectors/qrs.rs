use crate::{
    detectors::{
        beat::{BeatStateMachine, InitialPhase},
        peak::{PeakClassifier, PeakKind},
        rr::RrValidator,
    },
    filters::{level, FilterChain, DERIVATIVE_WINDOW, INTEGRATION_WINDOW},
    signal::{BeatEvent, Sample},
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Runtime knobs of the streaming detector. Filter windows are fixed at
/// compile time and are not part of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Phase before the first valid beat.
    pub initial_phase: InitialPhase,
    /// Drop events produced during the first N samples. Filters and
    /// classifiers still adapt during this time.
    pub warmup_holdoff: u32,
    /// Ticks a bandpass signal peak stays pending while the integrated
    /// channel catches up. 0 demands both channels fire on the same tick.
    pub agreement_window: u32,
    /// History samples the bandpass classifier may scan during searchback.
    pub bandpass_searchback: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            initial_phase: InitialPhase::Unknown,
            warmup_holdoff: 0,
            agreement_window: INTEGRATION_WINDOW as u32,
            bandpass_searchback: DERIVATIVE_WINDOW,
        }
    }
}

/// Sample-by-sample Pan-Tompkins QRS detector.
///
/// Every call to [`process`](QrsDetector::process) does a bounded amount of
/// work and never allocates.
#[derive(Debug, Clone)]
pub struct QrsDetector {
    config: DetectorConfig,
    filters: FilterChain,
    integrated: PeakClassifier,
    bandpass: PeakClassifier,
    rr: RrValidator,
    beat: BeatStateMachine,
    time: u32,
    prev_beat: u32,
    pending_bandpass: Option<u32>,
    samples: u64,
}

impl QrsDetector {
    pub fn new(config: DetectorConfig) -> Self {
        debug!("qrs detector configured: {:?}", config);
        Self {
            config,
            filters: FilterChain::new(),
            integrated: PeakClassifier::new(INTEGRATION_WINDOW),
            bandpass: PeakClassifier::new(config.bandpass_searchback),
            rr: RrValidator::new(),
            beat: BeatStateMachine::new(config.initial_phase),
            time: 0,
            prev_beat: 0,
            pending_bandpass: None,
            samples: 0,
        }
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        debug!("qrs detector reset after {} samples", self.samples);
        *self = Self::new(self.config);
    }

    /// Run one tick. Returns an event whenever an agreed beat is evaluated.
    pub fn process(&mut self, sample: Sample) -> Option<BeatEvent> {
        self.time = self.time.wrapping_add(1);
        self.samples += 1;

        self.filters.push(sample);

        let integrated_kind = self.integrated.classify(
            level(self.filters.integrated()),
            self.filters.integrated_history(),
        );
        let bandpass_kind = self
            .bandpass
            .classify(self.filters.bandpass(), self.filters.bandpass_history());

        if bandpass_kind == PeakKind::Signal {
            self.pending_bandpass = Some(self.time);
        }
        if integrated_kind != PeakKind::Signal || !self.take_pending_bandpass() {
            return None;
        }

        let rr_interval = self.time.wrapping_sub(self.prev_beat);
        self.prev_beat = self.time;
        let rr_verdict = self.rr.validate(rr_interval);

        let amplitude = self.filters.derivative();
        let phase = self.beat.evaluate(rr_verdict.is_valid(), amplitude)?;

        if self.samples <= u64::from(self.config.warmup_holdoff) {
            return None;
        }

        Some(BeatEvent {
            sample_index: self.samples - 1,
            rr_interval,
            rr_verdict,
            phase,
            amplitude,
        })
    }

    /// Consume a bandpass signal peak if one is still inside the agreement
    /// window.
    fn take_pending_bandpass(&mut self) -> bool {
        match self.pending_bandpass {
            Some(at) if self.time.wrapping_sub(at) <= self.config.agreement_window => {
                self.pending_bandpass = None;
                true
            }
            _ => false,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn rr_validator(&self) -> &RrValidator {
        &self.rr
    }

    pub fn phase(&self) -> Option<crate::signal::BeatPhase> {
        self.beat.phase()
    }

    /// Samples processed since construction or the last reset.
    pub fn samples_processed(&self) -> u64 {
        self.samples
    }
}

impl Default for QrsDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

/// Run a whole recording through a fresh detector.
pub fn detect_beats(samples: &[Sample], config: DetectorConfig) -> Vec<BeatEvent> {
    let mut detector = QrsDetector::new(config);
    samples
        .iter()
        .filter_map(|&sample| detector.process(sample))
        .collect()
}
