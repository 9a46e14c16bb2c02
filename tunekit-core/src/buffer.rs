//! # Sample Buffer Module
//!
//! A frame of time-domain audio handed to the pitch estimator, together
//! with the rate it was captured at.

use crate::error::{self, Result};
use crate::pitch;

/// One captured frame of mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl SampleBuffer {
    /// Wraps captured samples.
    ///
    /// # Arguments
    /// * `samples` - Amplitudes, nominally in [-1, 1]
    /// * `sample_rate` - Capture rate in Hz
    ///
    /// # Returns
    /// * `Err(TunerError::InvalidSampleRate)` - Rate is zero, negative or not finite
    ///
    /// Empty sample vectors are accepted; the estimator treats them as silence.
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Result<Self> {
        let sample_rate = error::validate_sample_rate(sample_rate)?;
        Ok(Self { samples, sample_rate })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root-mean-square amplitude of the frame.
    pub fn rms(&self) -> f32 {
        pitch::rms(&self.samples)
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_bad_sample_rate() {
        assert!(SampleBuffer::new(vec![0.0; 16], 0.0).is_err());
        assert!(SampleBuffer::new(vec![0.0; 16], -8000.0).is_err());
        assert!(SampleBuffer::new(vec![0.0; 16], f32::NAN).is_err());
    }

    #[test]
    fn empty_buffer_is_allowed() {
        let buffer = SampleBuffer::new(Vec::new(), 44100.0).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.rms(), 0.0);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = SampleBuffer::new(vec![0.5; 4410], 44100.0).unwrap();
        assert_relative_eq!(buffer.duration_secs(), 0.1, epsilon = 1e-6);
        assert_relative_eq!(buffer.rms(), 0.5, epsilon = 1e-6);
    }
}
