//! Synthetic single-lead recordings for exercising the detector.

use crate::signal::{Sample, ADC_MAX};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Periodic triangular QRS spikes on a flat baseline, with optional T bumps
/// and uniform noise. Output is clipped to the 10-bit converter range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeTrain {
    pub beats: usize,
    /// Samples between spike centres; the first spike sits one period in.
    pub period: usize,
    pub amplitude: u16,
    pub baseline: u16,
    /// Half-width of each spike in samples
    pub width: usize,
    pub t_amplitude: u16,
    /// Offset of the T bump after its spike
    pub t_delay: usize,
    pub t_width: usize,
    /// Peak magnitude of uniform noise; 0 disables it
    pub noise: u16,
    pub seed: u64,
}

impl Default for SpikeTrain {
    fn default() -> Self {
        Self {
            beats: 10,
            period: 160,
            amplitude: 300,
            baseline: 512,
            width: 4,
            t_amplitude: 0,
            t_delay: 40,
            t_width: 12,
            noise: 0,
            seed: 0,
        }
    }
}

impl SpikeTrain {
    pub fn len(&self) -> usize {
        self.period * (self.beats + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample index of every spike peak.
    pub fn centers(&self) -> impl Iterator<Item = usize> + '_ {
        (1..=self.beats).map(move |b| b * self.period)
    }

    pub fn generate(&self) -> Vec<Sample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let noise = i64::from(self.noise);
        (0..self.len())
            .map(|i| {
                let mut value = i64::from(self.baseline);
                for center in self.centers() {
                    value += triangle(i, center, self.width, self.amplitude);
                    if self.t_amplitude > 0 {
                        value += triangle(i, center + self.t_delay, self.t_width, self.t_amplitude);
                    }
                }
                if noise > 0 {
                    value += rng.gen_range(-noise..=noise);
                }
                value.clamp(0, i64::from(ADC_MAX)) as Sample
            })
            .collect()
    }
}

fn triangle(i: usize, center: usize, width: usize, amplitude: u16) -> i64 {
    let distance = i.abs_diff(center);
    if distance >= width {
        return 0;
    }
    i64::from(amplitude) * (width - distance) as i64 / width as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spikes_sit_on_the_baseline() {
        let train = SpikeTrain {
            beats: 2,
            period: 50,
            ..SpikeTrain::default()
        };
        let samples = train.generate();
        assert_eq!(samples.len(), 150);
        assert_eq!(train.centers().collect::<Vec<_>>(), vec![50, 100]);
        assert_eq!(samples[0], 512);
        assert_eq!(samples[50], 812);
        assert_eq!(samples[51], 737);
        assert_eq!(samples[54], 512);
    }

    #[test]
    fn output_is_clipped_to_converter_range() {
        let train = SpikeTrain {
            beats: 1,
            amplitude: 900,
            ..SpikeTrain::default()
        };
        assert_eq!(train.generate().into_iter().max(), Some(ADC_MAX));
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let train = SpikeTrain {
            beats: 3,
            noise: 8,
            seed: 7,
            ..SpikeTrain::default()
        };
        let a = train.generate();
        assert_eq!(a, train.generate());
        assert!(a.iter().take(100).all(|&v| (504..=520).contains(&v)));
        let other = SpikeTrain { seed: 8, ..train };
        assert_ne!(a, other.generate());
    }

    #[test]
    fn t_wave_follows_each_spike() {
        let train = SpikeTrain {
            beats: 1,
            period: 100,
            t_amplitude: 60,
            ..SpikeTrain::default()
        };
        let samples = train.generate();
        assert_eq!(samples[140], 572);
    }
}
