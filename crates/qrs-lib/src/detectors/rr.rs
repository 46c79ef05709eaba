use crate::buffer::RunningAverage;
use serde::{Deserialize, Serialize};

pub const RR_WINDOW: usize = 8;

/// How an RR interval compares with the recent beat rhythm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RrVerdict {
    /// Inside the low/high limits; folded into the confirmed average.
    Confirmed,
    /// Beyond the missed-beat limit; accepted as recovery from a dropped beat.
    Missed,
    Rejected,
}

impl RrVerdict {
    pub fn is_valid(self) -> bool {
        !matches!(self, RrVerdict::Rejected)
    }
}

/// Acceptance limits derived from an average interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrLimits {
    /// 15/16 of the average
    pub low: u64,
    /// 9/8 of the average
    pub high: u64,
    /// 13/8 of the average
    pub missed: u64,
}

impl RrLimits {
    pub fn from_average(avg: u64) -> Self {
        Self {
            low: (15 * avg) >> 4,
            high: (avg + (avg << 3)) >> 3,
            missed: (avg + (avg << 2) + (avg << 3)) >> 3,
        }
    }

    pub fn judge(&self, interval: u32) -> RrVerdict {
        let interval = u64::from(interval);
        if interval >= self.low && interval <= self.high {
            RrVerdict::Confirmed
        } else if interval > self.missed {
            RrVerdict::Missed
        } else {
            RrVerdict::Rejected
        }
    }
}

/// Tracks typical beat-to-beat spacing and screens new intervals against it.
///
/// Averages run over `u64` so eight full-range `u32` intervals cannot
/// overflow the sum.
#[derive(Debug, Clone, Default)]
pub struct RrValidator {
    short_term: RunningAverage<u64, RR_WINDOW>,
    confirmed: RunningAverage<u64, RR_WINDOW>,
    limits: RrLimits,
}

impl RrValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator whose averages already sit at `avg`.
    pub fn primed(avg: u32) -> Self {
        let mut validator = Self::new();
        validator.short_term.reset(u64::from(avg));
        validator.confirmed.reset(u64::from(avg));
        validator.limits = RrLimits::from_average(u64::from(avg));
        validator
    }

    pub fn validate(&mut self, interval: u32) -> RrVerdict {
        self.short_term.input(u64::from(interval));
        self.limits = RrLimits::from_average(self.short_term.last_output());

        let verdict = self.limits.judge(interval);
        if verdict == RrVerdict::Confirmed {
            self.confirmed.input(u64::from(interval));
        }
        verdict
    }

    pub fn limits(&self) -> RrLimits {
        self.limits
    }

    pub fn short_term_average(&self) -> u64 {
        self.short_term.last_output()
    }

    pub fn confirmed_average(&self) -> u64 {
        self.confirmed.last_output()
    }
}
