//! # Configuration Module
//!
//! Tuner settings that the caller may change at any time, plus saving and
//! loading them as a JSON file.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::audio::TARGET_SAMPLE_RATE;
use crate::error::{self, Result, TunerError};
use crate::mode::TargetMode;
use crate::pitch::{self, DEFAULT_MIN_LAG, DEFAULT_NOISE_THRESHOLD};
use crate::stabilizer::DEFAULT_HISTORY_CAPACITY;
use crate::tuning::{self, DEFAULT_REFERENCE_PITCH, TuningTable};

/// Number of samples per analysis frame.
///
/// Larger frames resolve lower pitches but increase latency. At 44.1 kHz
/// 4096 samples reach down to about 21.5 Hz, below the lowest bass string.
pub const DEFAULT_FRAME_SIZE: usize = 4096;

/// Complete tuner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Frequency of A4 in Hz.
    pub reference_pitch: f32,
    /// RMS amplitude below which a frame is treated as silence.
    pub noise_threshold: f32,
    /// Number of estimates in the median filter.
    pub history_capacity: usize,
    /// Shortest period searched, in samples.
    pub min_lag: usize,
    /// Samples per frame delivered by audio capture.
    pub frame_size: usize,
    /// Instrument tuning; `None` means chromatic mode.
    pub tuning: Option<TuningTable>,
    pub mode: TargetMode,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            reference_pitch: DEFAULT_REFERENCE_PITCH,
            noise_threshold: DEFAULT_NOISE_THRESHOLD,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_lag: DEFAULT_MIN_LAG,
            frame_size: DEFAULT_FRAME_SIZE,
            tuning: None,
            mode: TargetMode::Auto,
        }
    }
}

impl TunerConfig {
    /// Default settings with a built-in tuning table.
    pub fn with_preset(name: &str) -> Result<Self> {
        Ok(Self {
            tuning: Some(tuning::preset(name)?),
            ..Self::default()
        })
    }

    /// Checks every field; the first problem found is returned.
    pub fn validate(&self) -> Result<()> {
        error::validate_reference_pitch(self.reference_pitch)?;
        error::validate_noise_threshold(self.noise_threshold)?;
        if self.history_capacity == 0 {
            return Err(TunerError::InvalidHistoryCapacity);
        }
        if self.min_lag == 0 {
            return Err(TunerError::InvalidMinLag);
        }
        if self.frame_size / 2 <= self.min_lag {
            return Err(TunerError::InvalidFrameSize {
                frame_size: self.frame_size,
                min_lag: self.min_lag,
            });
        }
        if let Some(table) = &self.tuning {
            table.validate()?;
            self.check_table_in_range(table)?;
        }
        if let TargetMode::Manual { index } = self.mode {
            TargetMode::manual(self.tuning.as_ref(), index)?;
        }
        Ok(())
    }

    /// Every target must lie above the lowest frequency a frame can resolve,
    /// otherwise an in-tune string reads as far sharp.
    fn check_table_in_range(&self, table: &TuningTable) -> Result<()> {
        let Some((lowest, _)) =
            pitch::detectable_range(TARGET_SAMPLE_RATE as f32, self.frame_size, self.min_lag)
        else {
            return Err(TunerError::InvalidFrameSize {
                frame_size: self.frame_size,
                min_lag: self.min_lag,
            });
        };
        match table.targets.iter().find(|t| t.frequency < lowest) {
            Some(target) => Err(TunerError::TargetBelowRange {
                label: target.label.clone(),
                frequency: target.frequency,
                lowest,
                frame_size: self.frame_size,
            }),
            None => Ok(()),
        }
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: TunerConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::debug!("loaded tuner config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
