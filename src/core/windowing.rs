//! Sliding window buffer for collecting samples into overlapping analysis windows.
//!
//! Samples accumulate until a full window (default 512 samples = 2 s at 256 Hz) is available.
//! Taking a window trims the buffer down to the most recent `hop_length` samples, which seed the
//! next window so consecutive windows overlap.

use crate::simulator::types::Sample;

/// An ordered, fixed-length run of samples handed to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSamples {
    samples: Vec<Sample>,
}

impl WindowSamples {
    /// Wrap an arbitrary run of samples (mostly useful for tests and one-shot analysis).
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the last sample (window end), if any.
    pub fn end_time(&self) -> Option<f64> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// Accumulates samples and hands out overlapping windows.
///
/// Owned exclusively by the stream loop.
#[derive(Debug)]
pub struct WindowBuffer {
    /// Samples per window
    window_length: usize,
    /// Samples retained after a window is taken
    hop_length: usize,
    /// Working sequence, oldest first
    samples: Vec<Sample>,
}

impl WindowBuffer {
    /// Create a buffer. `hop_length` must be smaller than `window_length`; callers validate
    /// this through the stream configuration.
    pub fn new(window_length: usize, hop_length: usize) -> Self {
        Self {
            window_length,
            hop_length,
            samples: Vec::with_capacity(window_length + window_length / 2),
        }
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append one sample.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Append a batch of samples.
    pub fn extend<I: IntoIterator<Item = Sample>>(&mut self, samples: I) {
        self.samples.extend(samples);
    }

    /// Whether a full window is available.
    pub fn is_window_ready(&self) -> bool {
        self.samples.len() >= self.window_length
    }

    /// Take the most recent full window, then keep only the last `hop_length` samples.
    ///
    /// Returns `None` when a full window is not yet available; the buffer is left untouched.
    pub fn take_window(&mut self) -> Option<WindowSamples> {
        if !self.is_window_ready() {
            return None;
        }

        let start = self.samples.len() - self.window_length;
        let window = self.samples[start..].to_vec();

        let keep_from = self.samples.len() - self.hop_length;
        self.samples.drain(..keep_from);

        Some(WindowSamples::new(window))
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
