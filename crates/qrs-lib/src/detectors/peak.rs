/// Direction of the last step in the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slope {
    Rising,
    Flat,
    Falling,
}

/// Flags slope reversals in a scalar stream.
///
/// A peak is reported on the sample right after the turn: rising→falling,
/// falling→rising, or a plateau that was entered rising and left falling.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    slope: Slope,
    last_nonflat: Slope,
    last_value: i32,
}

impl PeakDetector {
    pub fn new() -> Self {
        Self {
            slope: Slope::Flat,
            last_nonflat: Slope::Flat,
            last_value: 0,
        }
    }

    pub fn identify(&mut self, value: i32) -> bool {
        let next = match value.cmp(&self.last_value) {
            std::cmp::Ordering::Greater => Slope::Rising,
            std::cmp::Ordering::Less => Slope::Falling,
            std::cmp::Ordering::Equal => Slope::Flat,
        };

        let is_peak = match (self.slope, next) {
            (Slope::Rising, Slope::Falling) | (Slope::Falling, Slope::Rising) => true,
            (Slope::Flat, Slope::Falling) => self.last_nonflat == Slope::Rising,
            _ => false,
        };

        if self.slope != Slope::Flat {
            self.last_nonflat = self.slope;
        }
        self.slope = next;
        self.last_value = value;

        is_peak
    }

    pub fn slope(&self) -> Slope {
        self.slope
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of feeding one sample to a [`PeakClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakKind {
    Signal,
    Noise,
    NoPeak,
}

/// Adaptive two-threshold peak classifier with searchback.
///
/// Signal and noise peak estimates are exponentially weighted; thresholds are
/// only recomputed when the wrapped detector reports a peak.
#[derive(Debug, Clone)]
pub struct PeakClassifier {
    detector: PeakDetector,
    signal_peak: i32,
    noise_peak: i32,
    threshold1: i32,
    threshold2: i32,
    searchback_depth: usize,
}

impl PeakClassifier {
    /// `searchback_depth` bounds how many history samples a searchback
    /// may inspect.
    pub fn new(searchback_depth: usize) -> Self {
        Self::with_estimates(searchback_depth, 0, 0)
    }

    pub fn with_estimates(searchback_depth: usize, signal_peak: i32, noise_peak: i32) -> Self {
        Self {
            detector: PeakDetector::new(),
            signal_peak,
            noise_peak,
            threshold1: 0,
            threshold2: 0,
            searchback_depth,
        }
    }

    /// Feed the waveform's latest value. `history` is the waveform's buffer,
    /// newest first, consulted only for searchback.
    pub fn classify<I>(&mut self, value: i32, history: I) -> PeakKind
    where
        I: IntoIterator<Item = i32>,
    {
        if !self.detector.identify(value) {
            return PeakKind::NoPeak;
        }
        self.assess_peak(value, history)
    }

    /// Classify a value already known to be a peak.
    pub fn assess_peak<I>(&mut self, value: i32, history: I) -> PeakKind
    where
        I: IntoIterator<Item = i32>,
    {
        self.threshold1 = self.noise_peak + ((self.signal_peak - self.noise_peak) >> 2);
        self.threshold2 = self.threshold1 >> 1;

        if value > self.threshold1 {
            self.signal_peak = (value + 7 * self.signal_peak) >> 3;
            return PeakKind::Signal;
        }

        if self.search_back(history) {
            // marginal peak, adapt faster
            self.signal_peak = (value + 3 * self.signal_peak) >> 2;
            PeakKind::Signal
        } else {
            self.noise_peak = (value + 7 * self.noise_peak) >> 3;
            PeakKind::Noise
        }
    }

    fn search_back<I>(&self, history: I) -> bool
    where
        I: IntoIterator<Item = i32>,
    {
        let mut detector = PeakDetector::new();
        let threshold2 = self.threshold2;
        history
            .into_iter()
            .take(self.searchback_depth)
            .any(|sample| detector.identify(sample) && sample > threshold2)
    }

    pub fn signal_peak(&self) -> i32 {
        self.signal_peak
    }

    pub fn noise_peak(&self) -> i32 {
        self.noise_peak
    }

    /// `(threshold1, threshold2)` as of the last detected peak.
    pub fn thresholds(&self) -> (i32, i32) {
        (self.threshold1, self.threshold2)
    }

    pub fn searchback_depth(&self) -> usize {
        self.searchback_depth
    }
}
