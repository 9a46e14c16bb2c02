// tunekit-core/src/lib.rs

//! The core logic for the tunekit tuner.
//! This crate is responsible for audio capture, autocorrelation pitch
//! detection, median stabilization and note / tuning-table mapping. It is
//! completely headless and contains no UI code.

pub mod audio;
pub mod buffer;
pub mod config;
pub mod error;
pub mod mode;
pub mod pitch;
pub mod session;
pub mod stabilizer;
pub mod track;
pub mod tuner;
pub mod tuning;

pub use buffer::SampleBuffer;
pub use config::TunerConfig;
pub use error::{Result, TunerError};
pub use mode::TargetMode;
pub use tuner::Tuner;
pub use tuning::{TuningTable, TuningTarget};

use serde::Serialize;

/// Represents the result of a single tuned frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuneResult {
    /// Note name with octave ("A3") or the tuning target label ("E2").
    pub label: String,
    /// Deviation in cents, rounded and clamped to [-50, 50].
    pub cents: i32,
    /// The stabilized frequency in Hz that was mapped.
    pub frequency_hz: f32,
    /// Deviation in cents before rounding and clamping.
    pub raw_cents: f32,
    /// Index of the tuning target, if a tuning table is active.
    pub target_index: Option<usize>,
}

/// How close a reading is to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    /// Within 5 cents.
    InTune,
    /// Within 20 cents.
    Close,
    Off,
}

impl TuneResult {
    pub fn accuracy(&self) -> Accuracy {
        match self.cents.abs() {
            0..5 => Accuracy::InTune,
            5..20 => Accuracy::Close,
            _ => Accuracy::Off,
        }
    }
}

/// Why a frame produced no reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdleReason {
    /// RMS below the noise threshold.
    NoSignal,
    /// No positive autocorrelation peak.
    NoPeriodicity,
    /// A pitch was found but could not be mapped to a note or target.
    Unmapped,
}

/// Per-frame output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CycleResult {
    Tuned(TuneResult),
    Idle(IdleReason),
}

impl CycleResult {
    pub fn tuned(&self) -> Option<&TuneResult> {
        match self {
            CycleResult::Tuned(result) => Some(result),
            CycleResult::Idle(_) => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CycleResult::Idle(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_cents(cents: i32) -> TuneResult {
        TuneResult {
            label: "A4".into(),
            cents,
            frequency_hz: 440.0,
            raw_cents: cents as f32,
            target_index: None,
        }
    }

    #[test]
    fn accuracy_bands() {
        assert_eq!(result_with_cents(0).accuracy(), Accuracy::InTune);
        assert_eq!(result_with_cents(-4).accuracy(), Accuracy::InTune);
        assert_eq!(result_with_cents(5).accuracy(), Accuracy::Close);
        assert_eq!(result_with_cents(-19).accuracy(), Accuracy::Close);
        assert_eq!(result_with_cents(50).accuracy(), Accuracy::Off);
    }

    #[test]
    fn idle_has_no_reading() {
        let idle = CycleResult::Idle(IdleReason::NoSignal);
        assert!(idle.is_idle());
        assert!(idle.tuned().is_none());
    }
}
