//! # Pitch Detection Module
//!
//! This module implements the time-domain autocorrelation pitch detector
//! used by the tuner. It trades sub-Hz precision for a small, predictable
//! amount of work per frame; the median filter in
//! [`crate::stabilizer`] and the ±50 cent display range absorb the rest.
//!
//! ## Features
//! - RMS noise gate to skip silent frames
//! - Plain lag-domain autocorrelation (no FFT, no interpolation)
//! - DC offset removal and zero-lag lobe skipping
//! - Minimum lag bound against implausibly high pitches
//! - Never panics on empty, silent or short frames

use log::trace;

use crate::buffer::SampleBuffer;
use crate::error::{self, Result, TunerError};

/// Smallest lag (in samples) considered a period.
///
/// At 44.1 kHz this caps detection at roughly 1.8 kHz.
pub const DEFAULT_MIN_LAG: usize = 24;

/// Default RMS amplitude below which a frame counts as silence.
pub const DEFAULT_NOISE_THRESHOLD: f32 = 0.01;

/// Outcome of a single estimation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    /// Fundamental frequency in Hz.
    Pitch(f32),
    /// Frame RMS was under the noise threshold.
    NoSignal,
    /// No positive autocorrelation peak inside the lag window.
    NoPeriodicity,
}

impl Estimate {
    pub fn frequency(&self) -> Option<f32> {
        match *self {
            Estimate::Pitch(freq) => Some(freq),
            _ => None,
        }
    }

    pub fn is_pitch(&self) -> bool {
        matches!(self, Estimate::Pitch(_))
    }
}

/// Root-mean-square amplitude of a signal. Zero for an empty slice.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32).sqrt()
}

/// Detects the fundamental frequency of a frame by autocorrelation.
///
/// # Arguments
/// * `signal` - Input audio frame
/// * `sample_rate` - Sample rate in Hz (must be positive)
/// * `noise_threshold` - Minimum RMS amplitude for pitch detection
/// * `min_lag` - Shortest period in samples that is searched
///
/// # Returns
/// * `Estimate::Pitch(frequency)` - `sample_rate / best_lag`
/// * `Estimate::NoSignal` - Frame is below the noise gate
/// * `Estimate::NoPeriodicity` - Lag window is empty or no positive peak exists
///
/// The search starts at `min_lag` or at the first lag where the
/// autocorrelation drops to zero, whichever is later.
pub fn detect_pitch_autocorr(
    signal: &[f32],
    sample_rate: f32,
    noise_threshold: f32,
    min_lag: usize,
) -> Estimate {
    let frame_size = signal.len();

    // --- Noise Gate: Calculate RMS to filter out silence/noise ---
    let level = rms(signal);
    if frame_size == 0 || level < noise_threshold {
        trace!("gated frame: rms {level:.5} < {noise_threshold}");
        return Estimate::NoSignal;
    }

    // --- DC offset: correlate around the mean so an offset does not look periodic ---
    let mean = signal.iter().sum::<f32>() / frame_size as f32;

    // --- Skip the zero-lag lobe: neighbouring samples correlate trivially
    // until the signal first decorrelates, which would pin low notes to the
    // smallest lag ---
    let max_lag = frame_size / 2;
    let mut lobe_end = 1;
    while lobe_end < max_lag && lagged_product(signal, mean, lobe_end) > 0.0 {
        lobe_end += 1;
    }

    // --- Lag search: at least two periods must fit in the frame ---
    let mut best_lag = 0;
    let mut best_correlation = 0.0_f32;

    for lag in min_lag.max(lobe_end)..max_lag {
        let correlation = lagged_product(signal, mean, lag);
        if correlation > best_correlation {
            best_correlation = correlation;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        trace!("no periodicity in {frame_size} samples");
        return Estimate::NoPeriodicity;
    }

    Estimate::Pitch(sample_rate / best_lag as f32)
}

/// Unnormalized autocorrelation of the mean-removed signal at one lag.
fn lagged_product(signal: &[f32], mean: f32, lag: usize) -> f32 {
    signal[..signal.len() - lag]
        .iter()
        .zip(&signal[lag..])
        .map(|(a, b)| (a - mean) * (b - mean))
        .sum()
}

/// Lowest and highest frequency the detector can report for a frame size.
///
/// # Returns
/// * `Some((low, high))` - Bounds in Hz
/// * `None` - Frame too short for the lag window
pub fn detectable_range(sample_rate: f32, frame_size: usize, min_lag: usize) -> Option<(f32, f32)> {
    let max_lag = frame_size / 2;
    let min_lag = min_lag.max(1);
    if max_lag <= min_lag {
        return None;
    }
    Some((sample_rate / (max_lag - 1) as f32, sample_rate / min_lag as f32))
}

/// Configured autocorrelation detector.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchEstimator {
    noise_threshold: f32,
    min_lag: usize,
}

impl Default for PitchEstimator {
    fn default() -> Self {
        Self {
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            min_lag: DEFAULT_MIN_LAG,
        }
    }
}

impl PitchEstimator {
    pub fn new(noise_threshold: f32, min_lag: usize) -> Result<Self> {
        let noise_threshold = error::validate_noise_threshold(noise_threshold)?;
        if min_lag == 0 {
            return Err(TunerError::InvalidMinLag);
        }
        Ok(Self { noise_threshold, min_lag })
    }

    pub fn noise_threshold(&self) -> f32 {
        self.noise_threshold
    }

    pub fn min_lag(&self) -> usize {
        self.min_lag
    }

    pub fn set_noise_threshold(&mut self, threshold: f32) -> Result<()> {
        self.noise_threshold = error::validate_noise_threshold(threshold)?;
        Ok(())
    }

    pub fn estimate(&self, buffer: &SampleBuffer) -> Estimate {
        detect_pitch_autocorr(
            buffer.samples(),
            buffer.sample_rate(),
            self.noise_threshold,
            self.min_lag,
        )
    }
}
