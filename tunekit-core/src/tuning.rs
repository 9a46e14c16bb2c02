//! # Musical Tuning Module
//!
//! This module maps detected frequencies onto musical targets. It handles
//! equal-tempered note lookup relative to a movable A4, cent deviation
//! measurements, and instrument tuning tables (standard and alternate
//! tunings).
//!
//! ## Features
//! - Nearest equal-tempered note with octave (MIDI convention, A4 = 69)
//! - Cent deviation against any target frequency
//! - Display clamping to the ±50 cent meter range
//! - Tuning tables built from frequencies or note names
//! - Built-in presets for guitar, bass and ukulele

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{self, Result, TunerError};

/// Chromatic note names, indexed from C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// Default concert pitch for A4.
pub const DEFAULT_REFERENCE_PITCH: f32 = 440.0;

/// Widest deviation the cent meter can show, in either direction.
pub const DISPLAY_CENTS_LIMIT: i32 = 50;

/// Pitch class for every accepted spelling, sharps and flats.
static PITCH_CLASSES: Lazy<BTreeMap<&'static str, i32>> = Lazy::new(|| {
    const FLATS: [(&str, i32); 7] = [
        ("Cb", -1),
        ("Db", 1),
        ("Eb", 3),
        ("Fb", 4),
        ("Gb", 6),
        ("Ab", 8),
        ("Bb", 10),
    ];
    NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i as i32))
        .chain(FLATS)
        .chain([("E#", 5), ("B#", 12)])
        .collect()
});

/// Equal-tempered reading of a frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteReading {
    /// Note name without octave, e.g. "A#".
    pub name: &'static str,
    /// Scientific pitch octave (C4 is middle C).
    pub octave: i32,
    /// MIDI note number.
    pub midi: i32,
    /// Deviation from the note in cents, unclamped and unrounded.
    pub cents: f32,
}

impl NoteReading {
    /// Name with octave, e.g. "A3".
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.octave)
    }
}

/// Finds the equal-tempered note closest to a frequency.
///
/// # Arguments
/// * `freq` - Input frequency in Hz
/// * `reference_pitch` - Frequency of A4 in Hz
///
/// # Returns
/// * `Some(reading)` - Note, octave and cent deviation
/// * `None` - Frequency or reference is not a finite positive number
pub fn nearest_note(freq: f32, reference_pitch: f32) -> Option<NoteReading> {
    if !(freq.is_finite() && freq > 0.0 && reference_pitch.is_finite() && reference_pitch > 0.0) {
        return None;
    }
    let semitones = 12.0 * (freq / reference_pitch).log2();
    let offset = semitones.round();
    let midi = offset as i32 + A4_MIDI;

    Some(NoteReading {
        name: NOTE_NAMES[midi.rem_euclid(12) as usize],
        octave: midi.div_euclid(12) - 1,
        midi,
        cents: 100.0 * (semitones - offset),
    })
}

/// Equal-tempered frequency of a MIDI note number.
pub fn midi_to_frequency(midi: i32, reference_pitch: f32) -> f32 {
    reference_pitch * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Parses a note name such as "E2", "C#3", "Bb2" or "C-1".
///
/// # Returns
/// * MIDI note number, or `None` if the name is not recognised
pub fn parse_note_name(name: &str) -> Option<i32> {
    let name = name.trim();
    let split = name
        .char_indices()
        .find(|(i, c)| *i > 0 && (c.is_ascii_digit() || *c == '-'))
        .map(|(i, _)| i)?;
    let (pitch, octave) = name.split_at(split);

    let mut pitch = pitch.to_string();
    if let Some(first) = pitch.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    let pitch_class = PITCH_CLASSES.get(pitch.as_str())?;
    let octave: i32 = octave.parse().ok()?;
    Some((octave + 1) * 12 + pitch_class)
}

/// Frequency of a named note at the given reference pitch.
pub fn note_frequency(name: &str, reference_pitch: f32) -> Option<f32> {
    parse_note_name(name).map(|midi| midi_to_frequency(midi, reference_pitch))
}

/// Calculates the deviation from a target frequency in cents.
///
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn cents_between(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

/// Rounds a raw deviation and clamps it to the meter range.
pub fn clamp_cents(raw: f32) -> i32 {
    if raw.is_nan() {
        return 0;
    }
    let limit = DISPLAY_CENTS_LIMIT as f32;
    raw.round().clamp(-limit, limit) as i32
}

/// A named reference such as a guitar string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTarget {
    pub label: String,
    pub frequency: f32,
}

impl TuningTarget {
    pub fn new(label: impl Into<String>, frequency: f32) -> Self {
        Self {
            label: label.into(),
            frequency,
        }
    }
}

/// Ordered list of tuning targets for one instrument tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTable {
    pub name: String,
    pub targets: Vec<TuningTarget>,
}

impl TuningTable {
    /// Builds a table, rejecting empty lists and non-positive frequencies.
    pub fn new(name: impl Into<String>, targets: Vec<TuningTarget>) -> Result<Self> {
        let table = Self {
            name: name.into(),
            targets,
        };
        table.validate()?;
        Ok(table)
    }

    /// Builds a table from note names, e.g. `["D2", "A2", ...]`, at the given A4.
    pub fn from_notes(name: impl Into<String>, notes: &[&str], reference_pitch: f32) -> Result<Self> {
        let reference_pitch = error::validate_reference_pitch(reference_pitch)?;
        let targets = notes
            .iter()
            .map(|note| {
                note_frequency(note, reference_pitch)
                    .map(|freq| TuningTarget::new(note.trim(), freq))
                    .ok_or_else(|| TunerError::InvalidNoteName(note.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(name, targets)
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(TunerError::EmptyTuningTable(self.name.clone()));
        }
        if let Some(bad) = self
            .targets
            .iter()
            .find(|t| !(t.frequency.is_finite() && t.frequency > 0.0))
        {
            return Err(TunerError::InvalidTargetFrequency {
                label: bad.label.clone(),
                frequency: bad.frequency,
            });
        }
        Ok(())
    }

    /// Finds the target closest to a frequency by absolute Hz difference.
    ///
    /// Equidistant targets resolve to the one listed first.
    pub fn nearest(&self, freq: f32) -> Option<(usize, &TuningTarget)> {
        let mut best: Option<(usize, &TuningTarget)> = None;
        let mut best_diff = f32::INFINITY;
        for (i, target) in self.targets.iter().enumerate() {
            let diff = (target.frequency - freq).abs();
            if diff < best_diff {
                best_diff = diff;
                best = Some((i, target));
            }
        }
        best
    }

    pub fn get(&self, index: usize) -> Option<&TuningTarget> {
        self.targets.get(index)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn table(name: &str, targets: &[(&str, f32)]) -> TuningTable {
    TuningTable {
        name: name.to_string(),
        targets: targets
            .iter()
            .map(|&(label, frequency)| TuningTarget::new(label, frequency))
            .collect(),
    }
}

/// Built-in tunings, keyed by preset name.
static PRESETS: Lazy<BTreeMap<&'static str, TuningTable>> = Lazy::new(|| {
    let mut presets = BTreeMap::new();
    presets.insert(
        "guitar-standard",
        table(
            "guitar-standard",
            &[
                ("E2", 82.41),
                ("A2", 110.00),
                ("D3", 146.83),
                ("G3", 196.00),
                ("B3", 246.94),
                ("E4", 329.63),
            ],
        ),
    );
    presets.insert(
        "guitar-drop-d",
        table(
            "guitar-drop-d",
            &[
                ("D2", 73.42),
                ("A2", 110.00),
                ("D3", 146.83),
                ("G3", 196.00),
                ("B3", 246.94),
                ("E4", 329.63),
            ],
        ),
    );
    presets.insert(
        "bass-standard",
        table(
            "bass-standard",
            &[("E1", 41.20), ("A1", 55.00), ("D2", 73.42), ("G2", 98.00)],
        ),
    );
    presets.insert(
        "ukulele-standard",
        table(
            "ukulele-standard",
            &[("G4", 392.00), ("C4", 261.63), ("E4", 329.63), ("A4", 440.00)],
        ),
    );
    presets
});

/// Looks up a built-in tuning by name.
pub fn preset(name: &str) -> Result<TuningTable> {
    PRESETS
        .get(name)
        .cloned()
        .ok_or_else(|| TunerError::UnknownPreset(name.to_string()))
}

pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.keys().copied()
}
