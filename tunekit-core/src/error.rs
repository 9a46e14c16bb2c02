//! # Error Module
//!
//! Configuration and I/O errors raised by the tuning pipeline.
//!
//! Silence and unpitched input are not errors: they are reported as
//! [`crate::CycleResult::Idle`]. Everything here is a caller mistake or a
//! file problem and is returned at the point of misuse.

use thiserror::Error;

/// Errors returned by the tunekit core.
#[derive(Debug, Error)]
pub enum TunerError {
    /// Sample rate must be a finite, positive number of Hz.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    /// Reference pitch (A4) must be a finite, positive number of Hz.
    #[error("invalid reference pitch: {0} Hz")]
    InvalidReferencePitch(f32),

    /// Noise threshold is an RMS amplitude and must be finite and non-negative.
    #[error("invalid noise threshold: {0}")]
    InvalidNoiseThreshold(f32),

    #[error("frequency history capacity must be at least 1")]
    InvalidHistoryCapacity,

    #[error("minimum lag must be at least 1 sample")]
    InvalidMinLag,

    #[error("frame size {frame_size} is too small for a minimum lag of {min_lag}")]
    InvalidFrameSize { frame_size: usize, min_lag: usize },

    #[error("tuning table '{0}' has no targets")]
    EmptyTuningTable(String),

    #[error("tuning target '{label}' has an invalid frequency: {frequency} Hz")]
    InvalidTargetFrequency { label: String, frequency: f32 },

    /// A target is lower than the frame size can resolve.
    #[error(
        "tuning target '{label}' ({frequency} Hz) is below the {lowest:.1} Hz floor of a {frame_size}-sample frame"
    )]
    TargetBelowRange { label: String, frequency: f32, lowest: f32, frame_size: usize },

    #[error("unknown tuning preset '{0}'")]
    UnknownPreset(String),

    #[error("cannot parse note name '{0}'")]
    InvalidNoteName(String),

    /// A manual target was selected while no tuning table is loaded.
    #[error("manual target selection requires a tuning table")]
    NoTuningTable,

    #[error("manual target index {index} is out of range for a table of {len} targets")]
    TargetOutOfRange { index: usize, len: usize },

    /// The session worker has stopped and no longer accepts commands.
    #[error("tuner session is no longer running")]
    SessionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TunerError>;

/// Checks that a reference pitch can anchor the note mapping.
pub fn validate_reference_pitch(a4: f32) -> Result<f32> {
    if a4.is_finite() && a4 > 0.0 {
        Ok(a4)
    } else {
        Err(TunerError::InvalidReferencePitch(a4))
    }
}

/// Checks that a noise threshold is a usable RMS cutoff.
pub fn validate_noise_threshold(threshold: f32) -> Result<f32> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(threshold)
    } else {
        Err(TunerError::InvalidNoiseThreshold(threshold))
    }
}

pub fn validate_sample_rate(sample_rate: f32) -> Result<f32> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(sample_rate)
    } else {
        Err(TunerError::InvalidSampleRate(sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_values() {
        assert!(validate_reference_pitch(0.0).is_err());
        assert!(validate_reference_pitch(f32::NAN).is_err());
        assert!(validate_sample_rate(-44100.0).is_err());
        assert!(validate_noise_threshold(-0.1).is_err());
        assert!(validate_noise_threshold(f32::INFINITY).is_err());
    }

    #[test]
    fn accepts_usual_values() {
        assert_eq!(validate_reference_pitch(442.0).unwrap(), 442.0);
        assert_eq!(validate_noise_threshold(0.0).unwrap(), 0.0);
        assert_eq!(validate_sample_rate(48000.0).unwrap(), 48000.0);
    }
}
