//! # Pitch Track Module
//!
//! Offline pitch timeline for recorded audio. The signal is cut into
//! consecutive frames, an evenly spaced subset of frames is run through the
//! pitch estimator, and each voiced frame becomes one [`PitchPoint`].

use serde::{Deserialize, Serialize};

use crate::config::TunerConfig;
use crate::error::{self, Result};
use crate::pitch::{self, Estimate};
use crate::tuning;

/// Default number of points in a pitch track.
pub const DEFAULT_TRACK_POINTS: usize = 100;

/// One voiced point of a pitch timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchPoint {
    /// Start of the frame in seconds.
    pub time_sec: f32,
    /// Note name without octave, e.g. "C#".
    pub note: String,
    pub frequency_hz: f32,
}

/// Extracts a pitch timeline from a mono signal.
///
/// # Arguments
/// * `samples` - Mono signal
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Frame size, noise gate, minimum lag and reference pitch
/// * `max_points` - Upper bound on analysed frames (`0` means every frame)
///
/// # Returns
/// * Voiced points in time order; unvoiced frames are skipped
pub fn extract_pitch_track(
    samples: &[f32],
    sample_rate: f32,
    config: &TunerConfig,
    max_points: usize,
) -> Result<Vec<PitchPoint>> {
    let sample_rate = error::validate_sample_rate(sample_rate)?;
    config.validate()?;

    let frame_size = config.frame_size;
    let total_frames = samples.len() / frame_size;
    let step = if max_points == 0 {
        1
    } else {
        (total_frames / max_points).max(1)
    };

    let points: Vec<PitchPoint> = (0..total_frames)
        .step_by(step)
        .filter_map(|index| {
            let start = index * frame_size;
            let frame = &samples[start..start + frame_size];
            let Estimate::Pitch(freq) = pitch::detect_pitch_autocorr(
                frame,
                sample_rate,
                config.noise_threshold,
                config.min_lag,
            ) else {
                return None;
            };
            let reading = tuning::nearest_note(freq, config.reference_pitch)?;
            Some(PitchPoint {
                time_sec: start as f32 / sample_rate,
                note: reading.name.to_string(),
                frequency_hz: freq,
            })
        })
        .collect();

    log::debug!(
        "pitch track: {} voiced of {} frames (step {step})",
        points.len(),
        total_frames
    );
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn tone(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 44100.0).sin())
            .collect()
    }

    fn short_frames() -> TunerConfig {
        TunerConfig { frame_size: 2048, ..Default::default() }
    }

    #[test]
    fn tracks_a_two_note_phrase() {
        let mut signal = tone(220.0, 2048 * 4);
        signal.extend(vec![0.0; 2048 * 2]);
        signal.extend(tone(329.63, 2048 * 4));

        let points = extract_pitch_track(&signal, 44100.0, &short_frames(), 0).unwrap();
        assert_eq!(points.len(), 8);
        assert!(points[..4].iter().all(|p| p.note == "A"));
        assert!(points[4..].iter().all(|p| p.note == "E"));
        assert_relative_eq!(points[4].time_sec, 2048.0 * 6.0 / 44100.0, epsilon = 1e-4);
    }

    #[test]
    fn limits_number_of_points() {
        let signal = tone(440.0, 2048 * 50);
        let points = extract_pitch_track(&signal, 44100.0, &short_frames(), 10).unwrap();
        assert_eq!(points.len(), 10);
    }

    #[test]
    fn short_or_silent_input_is_empty() {
        let config = TunerConfig::default();
        assert!(extract_pitch_track(&[0.1; 100], 44100.0, &config, 10).unwrap().is_empty());
        assert!(extract_pitch_track(&vec![0.0; 8192], 44100.0, &config, 10).unwrap().is_empty());
        assert!(extract_pitch_track(&[], 0.0, &config, 10).is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let point = PitchPoint {
            time_sec: 1.5,
            note: "G".into(),
            frequency_hz: 196.0,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["timeSec"], 1.5);
        assert_eq!(json["frequencyHz"], 196.0);
    }
}
