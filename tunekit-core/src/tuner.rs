//! # Tuner Pipeline Module
//!
//! Runs one frame through the full pipeline:
//! 1. Autocorrelation pitch estimate with noise gate
//! 2. Median stabilization over recent valid estimates
//! 3. Mapping to the nearest note, or to a tuning-table target
//!
//! A `Tuner` owns the only state that survives between frames (the
//! frequency history and the target mode). It is meant to be driven by a
//! single loop; see [`crate::session`] for the threaded variant.

use log::debug;

use crate::buffer::SampleBuffer;
use crate::config::TunerConfig;
use crate::error::{self, Result};
use crate::mode::TargetMode;
use crate::pitch::{Estimate, PitchEstimator};
use crate::stabilizer::FrequencyHistory;
use crate::tuning::{self, TuningTable};
use crate::{CycleResult, IdleReason, TuneResult};

#[derive(Debug, Clone)]
pub struct Tuner {
    estimator: PitchEstimator,
    history: FrequencyHistory,
    reference_pitch: f32,
    tuning: Option<TuningTable>,
    mode: TargetMode,
}

impl Tuner {
    /// Creates a tuner from a validated configuration.
    pub fn new(config: &TunerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            estimator: PitchEstimator::new(config.noise_threshold, config.min_lag)?,
            history: FrequencyHistory::new(config.history_capacity)?,
            reference_pitch: config.reference_pitch,
            tuning: config.tuning.clone(),
            mode: config.mode,
        })
    }

    /// Processes one captured frame.
    ///
    /// # Returns
    /// * `CycleResult::Tuned` - Label, clamped cents and stabilized frequency
    /// * `CycleResult::Idle` - Frame was gated or had no detectable period;
    ///   the frequency history is left untouched
    pub fn process(&mut self, buffer: &SampleBuffer) -> CycleResult {
        let raw = match self.estimator.estimate(buffer) {
            Estimate::Pitch(freq) => freq,
            Estimate::NoSignal => return CycleResult::Idle(IdleReason::NoSignal),
            Estimate::NoPeriodicity => return CycleResult::Idle(IdleReason::NoPeriodicity),
        };

        let stabilized = self.history.push(raw);
        self.classify(stabilized)
    }

    fn classify(&self, freq: f32) -> CycleResult {
        match self.map_frequency(freq) {
            Some(result) => CycleResult::Tuned(result),
            None => {
                debug!("could not map {freq} Hz");
                CycleResult::Idle(IdleReason::Unmapped)
            }
        }
    }

    /// Maps a frequency without touching the history.
    pub fn map_frequency(&self, freq: f32) -> Option<TuneResult> {
        match &self.tuning {
            Some(table) => {
                let (index, target) = self.mode.select(table, freq)?;
                let raw_cents = tuning::cents_between(freq, target.frequency);
                Some(TuneResult {
                    label: target.label.clone(),
                    cents: tuning::clamp_cents(raw_cents),
                    frequency_hz: freq,
                    raw_cents,
                    target_index: Some(index),
                })
            }
            None => {
                let reading = tuning::nearest_note(freq, self.reference_pitch)?;
                Some(TuneResult {
                    label: reading.label(),
                    cents: tuning::clamp_cents(reading.cents),
                    frequency_hz: freq,
                    raw_cents: reading.cents,
                    target_index: None,
                })
            }
        }
    }

    pub fn reference_pitch(&self) -> f32 {
        self.reference_pitch
    }

    pub fn set_reference_pitch(&mut self, a4: f32) -> Result<()> {
        self.reference_pitch = error::validate_reference_pitch(a4)?;
        debug!("reference pitch set to {a4} Hz");
        Ok(())
    }

    pub fn noise_threshold(&self) -> f32 {
        self.estimator.noise_threshold()
    }

    pub fn set_noise_threshold(&mut self, threshold: f32) -> Result<()> {
        self.estimator.set_noise_threshold(threshold)?;
        debug!("noise threshold set to {threshold}");
        Ok(())
    }

    pub fn tuning(&self) -> Option<&TuningTable> {
        self.tuning.as_ref()
    }

    /// Replaces the tuning table (or returns to chromatic mode with `None`).
    ///
    /// Resets the mode to auto and clears the frequency history.
    pub fn set_tuning(&mut self, table: Option<TuningTable>) -> Result<()> {
        if let Some(table) = &table {
            table.validate()?;
        }
        debug!(
            "tuning set to {}",
            table.as_ref().map_or("chromatic", |t| t.name.as_str())
        );
        self.tuning = table;
        self.mode = TargetMode::Auto;
        self.history.clear();
        Ok(())
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    /// Pins the target at `index` of the current tuning table.
    pub fn select_target(&mut self, index: usize) -> Result<()> {
        let mode = TargetMode::manual(self.tuning.as_ref(), index)?;
        if mode != self.mode {
            self.history.clear();
        }
        self.mode = mode;
        Ok(())
    }

    pub fn auto_mode(&mut self) {
        if self.mode != TargetMode::Auto {
            self.history.clear();
        }
        self.mode = TargetMode::Auto;
    }

    pub fn history(&self) -> &FrequencyHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
