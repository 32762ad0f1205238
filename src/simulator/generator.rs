//! Synthetic EEG sample generation.
//!
//! Each sample draws one Gaussian noise value shared by all five bands and adds it to the
//! active mode's base profile. The generator keeps an explicit stream clock that advances by
//! `1 / sampling_rate` per sample and can only be rewound through [`SampleGenerator::reset_time`].

use crate::simulator::types::{BandProfile, Mode, Sample};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

/// Scale of the shared per-sample noise.
pub const NOISE_SCALE: f64 = 0.5;

/// Errors a sample source can report for one batch.
#[derive(Debug)]
pub enum SourceError {
    /// The source could not produce samples right now
    Unavailable(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(e) => write!(f, "Sample source unavailable: {e}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Anything the stream loop can pull batches of samples from.
pub trait SampleSource: Send {
    /// Produce `duration_secs` worth of samples under `mode`.
    fn next_batch(&mut self, mode: Mode, duration_secs: f64) -> Result<Vec<Sample>, SourceError>;
}

/// Simulated EEG generator.
pub struct SampleGenerator {
    sampling_rate: u32,
    time: f64,
    noise: Normal,
    rng: StdRng,
}

impl SampleGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new(sampling_rate: u32) -> Self {
        Self::with_rng(sampling_rate, StdRng::from_entropy())
    }

    /// Create a reproducible generator.
    pub fn with_seed(sampling_rate: u32, seed: u64) -> Self {
        Self::with_rng(sampling_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(sampling_rate: u32, rng: StdRng) -> Self {
        Self {
            sampling_rate,
            time: 0.0,
            noise: Normal::standard(),
            rng,
        }
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Current stream time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Rewind the stream clock to zero.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Generate one sample at the current stream time. Does not advance the clock.
    pub fn generate(&mut self, mode: Mode) -> Sample {
        self.generate_with_profile(&mode.profile())
    }

    /// Generate one sample for a wire mode name; unknown names use the flat profile.
    pub fn generate_named(&mut self, mode_name: &str) -> Sample {
        self.generate_with_profile(&BandProfile::for_mode_name(mode_name))
    }

    fn generate_with_profile(&mut self, profile: &BandProfile) -> Sample {
        let noise = self.noise.sample(&mut self.rng) * NOISE_SCALE;
        Sample::floored(self.time, profile.bands().map(|base| base + noise))
    }

    /// Lazily generate `duration_secs` worth of samples, advancing the clock after each one.
    pub fn stream(&mut self, mode: Mode, duration_secs: f64) -> SampleStream<'_> {
        let remaining = sample_count(self.sampling_rate, duration_secs);
        SampleStream {
            generator: self,
            mode,
            remaining,
        }
    }
}

impl SampleSource for SampleGenerator {
    fn next_batch(&mut self, mode: Mode, duration_secs: f64) -> Result<Vec<Sample>, SourceError> {
        Ok(self.stream(mode, duration_secs).collect())
    }
}

/// Number of samples covering `duration_secs`, truncated.
pub fn sample_count(sampling_rate: u32, duration_secs: f64) -> usize {
    if duration_secs <= 0.0 {
        return 0;
    }
    (sampling_rate as f64 * duration_secs) as usize
}

/// Finite sample iterator returned by [`SampleGenerator::stream`].
pub struct SampleStream<'a> {
    generator: &'a mut SampleGenerator,
    mode: Mode,
    remaining: usize,
}

impl Iterator for SampleStream<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let sample = self.generator.generate(self.mode);
        self.generator.time += 1.0 / self.generator.sampling_rate as f64;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SampleStream<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::types::POWER_FLOOR;

    #[test]
    fn test_floor_holds_for_every_mode() {
        let mut generator = SampleGenerator::with_seed(256, 7);
        for mode in Mode::ALL {
            for sample in generator.stream(mode, 4.0) {
                assert!(sample.bands().iter().all(|&p| p >= POWER_FLOOR));
            }
        }
    }

    #[test]
    fn test_stream_length_and_clock() {
        let mut generator = SampleGenerator::with_seed(256, 1);
        let samples: Vec<Sample> = generator.stream(Mode::Focused, 0.25).collect();

        assert_eq!(samples.len(), 64);
        assert_eq!(samples[0].timestamp, 0.0);
        assert!((samples[63].timestamp - 63.0 / 256.0).abs() < 1e-9);
        assert!((generator.time() - 0.25).abs() < 1e-9);
        assert!(samples.windows(2).all(|w| w[1].timestamp > w[0].timestamp));
    }

    #[test]
    fn test_generate_does_not_advance_clock() {
        let mut generator = SampleGenerator::with_seed(256, 1);
        generator.generate(Mode::Relaxed);
        assert_eq!(generator.time(), 0.0);
    }

    #[test]
    fn test_reset_time() {
        let mut generator = SampleGenerator::with_seed(128, 3);
        let _ = generator.stream(Mode::Sleepy, 1.0).count();
        assert!((generator.time() - 1.0).abs() < 1e-9);

        generator.reset_time();
        let first = generator.stream(Mode::Sleepy, 0.1).next().unwrap();
        assert_eq!(first.timestamp, 0.0);
    }

    #[test]
    fn test_noise_is_shared_across_bands() {
        let mut generator = SampleGenerator::with_seed(256, 42);
        let sample = generator.generate(Mode::Relaxed);
        let profile = Mode::Relaxed.profile();

        // No band of the relaxed profile is near the floor, so the offset is identical.
        let offsets: Vec<f64> = sample
            .bands()
            .iter()
            .zip(profile.bands())
            .map(|(value, base)| value - base)
            .collect();
        assert!(offsets.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-9));
    }

    #[test]
    fn test_unknown_mode_name_uses_flat_profile() {
        let mut generator = SampleGenerator::with_seed(256, 5);
        let sample = generator.generate_named("hyperactive");
        let first = sample.delta;
        assert!(sample.bands().iter().all(|&b| (b - first).abs() < 1e-9));
        assert!((first - 5.0).abs() < 5.0);
    }

    #[test]
    fn test_same_seed_same_samples() {
        let a: Vec<Sample> = SampleGenerator::with_seed(256, 9)
            .next_batch(Mode::Stressed, 0.5)
            .unwrap();
        let b: Vec<Sample> = SampleGenerator::with_seed(256, 9)
            .next_batch(Mode::Stressed, 0.5)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_count_truncates() {
        assert_eq!(sample_count(256, 2.0), 512);
        assert_eq!(sample_count(256, 0.25), 64);
        assert_eq!(sample_count(100, 0.015), 1);
        assert_eq!(sample_count(256, 0.0), 0);
    }
}
