//! Integer Pan-Tompkins filter cascade.
//!
//! Window lengths are fixed: the shift-based scalings below only hold for
//! these sizes.

use crate::buffer::{RingBuffer, RunningSum};
use crate::signal::Sample;

pub const LOWPASS_WINDOW: usize = 6;
pub const HIGHPASS_WINDOW: usize = 32;
pub const DERIVATIVE_WINDOW: usize = 5;
pub const INTEGRATION_WINDOW: usize = 30;

/// Ceiling applied to the squared derivative before integration.
pub const SQUARE_CEILING: u32 = 255;

/// Two cascaded moving sums.
#[derive(Debug, Clone, Default)]
pub struct Lowpass {
    first: RunningSum<u32, LOWPASS_WINDOW>,
    second: RunningSum<u32, LOWPASS_WINDOW>,
}

impl Lowpass {
    pub fn push(&mut self, value: Sample) {
        self.first.input(u32::from(value));
        self.second.input(self.first.last_output());
    }

    pub fn output(&self) -> u32 {
        self.second.last_output()
    }
}

/// `y[n] = y[n-1] - x[n]/32 + x[n-16] - x[n-17] + x[n-32]/32`
#[derive(Debug, Clone, Default)]
pub struct Highpass {
    buf: RingBuffer<u32, HIGHPASS_WINDOW>,
    output: i32,
}

impl Highpass {
    pub fn push(&mut self, value: u32) {
        let x32 = self.buf.oldest();
        self.buf.push(value);
        let x0 = self.buf.newest();
        let x16 = self.buf.nth_oldest(16);
        let x17 = self.buf.nth_oldest(17);

        let t1 = level(x0 >> 5) + level(x17);
        let t2 = level(x32 >> 5) + level(x16);
        self.output += t2 - t1;
    }

    pub fn output(&self) -> i32 {
        self.output
    }

    /// Lowpass outputs held by this stage, newest first.
    pub fn history(&self) -> impl Iterator<Item = u32> + '_ {
        self.buf.iter_newest_first()
    }
}

/// Five-point derivative scaled by 1/8.
#[derive(Debug, Clone, Default)]
pub struct Derivative {
    buf: RingBuffer<i32, DERIVATIVE_WINDOW>,
}

impl Derivative {
    pub fn push(&mut self, value: i32) {
        self.buf.push(value);
    }

    pub fn output(&self) -> i32 {
        let x0 = self.buf.newest();
        let x1 = self.buf.nth_oldest(1);
        let x3 = self.buf.nth_oldest(3);
        let x4 = self.buf.oldest();
        ((x0 << 1) + x1 - (x3 + (x4 << 1))) >> 3
    }
}

pub fn square_clamp(value: i32) -> u32 {
    let magnitude = value.unsigned_abs();
    magnitude.saturating_mul(magnitude).min(SQUARE_CEILING)
}

/// Moving-window integrator with gain correction.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    sum: RunningSum<u32, INTEGRATION_WINDOW>,
}

impl Integrator {
    pub fn push(&mut self, value: u32) {
        self.sum.input(value);
    }

    pub fn output(&self) -> u32 {
        let f30 = self.sum.last_output();
        let f32 = f30 + (f30 >> 4);
        f32 >> 5
    }

    /// Squared samples inside the integration window, newest first.
    pub fn history(&self) -> impl Iterator<Item = u32> + '_ {
        self.sum.buffer().iter_newest_first()
    }
}

/// The whole cascade, advanced one sample at a time.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    lowpass: Lowpass,
    highpass: Highpass,
    derivative: Derivative,
    integrator: Integrator,
    derivative_out: i32,
    squared: u32,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.lowpass.push(sample);
        self.highpass.push(self.lowpass.output());
        self.derivative.push(self.highpass.output());
        self.derivative_out = self.derivative.output();
        self.squared = square_clamp(self.derivative_out);
        self.integrator.push(self.squared);
    }

    pub fn lowpass(&self) -> u32 {
        self.lowpass.output()
    }

    /// Band-passed waveform (highpass stage output).
    pub fn bandpass(&self) -> i32 {
        self.highpass.output()
    }

    pub fn derivative(&self) -> i32 {
        self.derivative_out
    }

    pub fn squared(&self) -> u32 {
        self.squared
    }

    pub fn integrated(&self) -> u32 {
        self.integrator.output()
    }

    pub fn bandpass_history(&self) -> impl Iterator<Item = i32> + '_ {
        self.highpass.history().map(level)
    }

    pub fn integrated_history(&self) -> impl Iterator<Item = i32> + '_ {
        self.integrator.history().map(level)
    }
}

/// Widen an unsigned stage value into the signed domain the classifiers use.
pub(crate) fn level(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_settles_at_window_squared_gain() {
        let mut lp = Lowpass::default();
        for _ in 0..(2 * LOWPASS_WINDOW) {
            lp.push(100);
        }
        assert_eq!(lp.output(), 100 * 36);
    }

    #[test]
    fn lowpass_holds_full_scale_without_overflow() {
        let mut lp = Lowpass::default();
        for _ in 0..50 {
            lp.push(Sample::MAX);
        }
        assert_eq!(lp.output(), u32::from(Sample::MAX) * 36);
    }

    #[test]
    fn highpass_rejects_a_constant_level() {
        let mut hp = Highpass::default();
        for _ in 0..200 {
            hp.push(3200);
        }
        assert_eq!(hp.output(), 0);
    }

    #[test]
    fn highpass_step_response_follows_difference_equation() {
        let mut hp = Highpass::default();
        hp.push(3200);
        // -x[n]/32 on the first sample
        assert_eq!(hp.output(), -100);
        for _ in 1..16 {
            hp.push(3200);
        }
        assert_eq!(hp.output(), -1600);
        hp.push(3200);
        // x[n-16] enters
        assert_eq!(hp.output(), -1700 + 3200);
    }

    #[test]
    fn derivative_of_a_ramp_is_constant() {
        let mut d = Derivative::default();
        for v in (0..10).map(|i| i * 8) {
            d.push(v);
        }
        // (2*72 + 64 - (48 + 2*40)) / 8
        assert_eq!(d.output(), 10);
    }

    #[test]
    fn derivative_shift_keeps_sign() {
        let mut d = Derivative::default();
        for v in [0, 0, 0, 0, -9] {
            d.push(v);
        }
        assert_eq!(d.output(), -3);
    }

    #[test]
    fn square_saturates_at_ceiling() {
        assert_eq!(square_clamp(0), 0);
        assert_eq!(square_clamp(-15), 225);
        assert_eq!(square_clamp(16), 255);
        assert_eq!(square_clamp(i32::MIN), 255);
    }

    #[test]
    fn integrator_applies_gain_correction() {
        let mut integ = Integrator::default();
        for _ in 0..INTEGRATION_WINDOW {
            integ.push(255);
        }
        // sum 7650 -> 7650 + 478 = 8128 -> 254
        assert_eq!(integ.output(), 254);
        assert_eq!(integ.history().count(), INTEGRATION_WINDOW);
    }

    #[test]
    fn chain_stays_quiet_on_zero_input() {
        let mut chain = FilterChain::new();
        for _ in 0..100 {
            chain.push(0);
        }
        assert_eq!(chain.bandpass(), 0);
        assert_eq!(chain.derivative(), 0);
        assert_eq!(chain.integrated(), 0);
    }

    #[test]
    fn chain_keeps_startup_transient() {
        let mut chain = FilterChain::new();
        let mut peak = 0;
        for _ in 0..120 {
            chain.push(512);
            peak = peak.max(chain.integrated());
        }
        // The zero-filled history turns a constant input into a step.
        assert!(peak > 0);
        assert_eq!(chain.lowpass(), 512 * 36);
        assert_eq!(chain.squared(), 0);
    }

    #[test]
    fn searchback_history_visits_write_cursor_last() {
        let mut integrator = Integrator::default();
        for v in 1..=31u32 {
            integrator.push(v);
        }
        let history: Vec<u32> = integrator.history().collect();
        assert_eq!(history.len(), INTEGRATION_WINDOW);
        assert_eq!(history.first(), Some(&31));
        // the slot under the write cursor is the oldest and comes last
        assert_eq!(history.last(), Some(&2));
        assert!(history.windows(2).all(|w| w[0] == w[1] + 1));
    }
}
