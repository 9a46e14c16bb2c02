//! End-to-end checks of the frame -> frequency -> (label, cents) pipeline.

use approx::assert_relative_eq;
use std::f32::consts::PI;

use tunekit_core::pitch::{self, DEFAULT_MIN_LAG, Estimate};
use tunekit_core::stabilizer::FrequencyHistory;
use tunekit_core::tuning::{self, TuningTable, TuningTarget};
use tunekit_core::{CycleResult, IdleReason, SampleBuffer, TargetMode, Tuner, TunerConfig};

const SAMPLE_RATE: f32 = 44100.0;

fn sine(freq: f32, amplitude: f32, len: usize) -> SampleBuffer {
    let samples = (0..len)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE).sin())
        .collect();
    SampleBuffer::new(samples, SAMPLE_RATE).unwrap()
}

#[test]
fn a3_burst_reads_as_a3() {
    let buffer = sine(220.0, 0.7, 2048);
    let freq = pitch::detect_pitch_autocorr(buffer.samples(), SAMPLE_RATE, 0.01, DEFAULT_MIN_LAG)
        .frequency()
        .unwrap();
    assert_relative_eq!(freq, 220.0, max_relative = 0.02);

    let reading = tuning::nearest_note(freq, 440.0).unwrap();
    assert_eq!(reading.name, "A");
    assert_eq!(reading.octave, 3);
    assert!(reading.cents.abs() < 10.0);
}

#[test]
fn guitar_low_e_slightly_flat() {
    let mut tuner = Tuner::new(&TunerConfig::with_preset("guitar-standard").unwrap()).unwrap();
    assert_eq!(tuner.mode(), TargetMode::Auto);
    let result = tuner.map_frequency(82.0).unwrap();
    assert_eq!(result.label, "E2");
    assert_relative_eq!(result.raw_cents, -8.6, epsilon = 0.1);
    assert_eq!(result.cents, -9);

    // Same reading through the whole pipeline with a real frame.
    let frame = sine(82.41, 0.5, 4096);
    let CycleResult::Tuned(result) = tuner.process(&frame) else {
        panic!("low E should be detected");
    };
    assert_eq!(result.label, "E2");
    assert_eq!(result.target_index, Some(0));
}

#[test]
fn every_preset_string_is_detected_at_the_default_frame() {
    for name in tuning::preset_names() {
        let config = TunerConfig::with_preset(name).unwrap();
        let table = config.tuning.clone().unwrap();
        for (index, target) in table.targets.iter().enumerate() {
            let mut tuner = Tuner::new(&config).unwrap();
            let frame = sine(target.frequency, 0.5, config.frame_size);
            let CycleResult::Tuned(result) = tuner.process(&frame) else {
                panic!("{name} {} should be detected", target.label);
            };
            assert_eq!(result.target_index, Some(index), "{name} {}", target.label);
            // Integer lags cost a few cents on the highest strings.
            assert!(result.cents.abs() < 10, "{name} {}: {} cents", target.label, result.cents);
        }
    }
}

#[test]
fn negligible_signal_is_idle_despite_periodicity() {
    let config = TunerConfig { noise_threshold: 0.02, ..Default::default() };
    let mut tuner = Tuner::new(&config).unwrap();
    let frame = sine(440.0, 0.001 * 2.0_f32.sqrt(), 2048);
    assert_relative_eq!(frame.rms(), 0.001, max_relative = 0.01);
    assert_eq!(tuner.process(&frame), CycleResult::Idle(IdleReason::NoSignal));
    assert!(tuner.history().is_empty());
}

#[test]
fn median_absorbs_an_octave_glitch() {
    let mut tuner = Tuner::new(&TunerConfig::default()).unwrap();
    for _ in 0..3 {
        tuner.process(&sine(220.0, 0.7, 2048));
    }
    let CycleResult::Tuned(result) = tuner.process(&sine(440.0, 0.7, 2048)) else {
        panic!("expected a reading");
    };
    assert_eq!(result.label, "A3");
}

#[test]
fn history_keeps_last_n_in_arrival_order() {
    let mut history = FrequencyHistory::new(8).unwrap();
    for f in 1..=9 {
        history.push(f as f32 * 10.0);
    }
    assert_eq!(history.len(), 8);
    assert_eq!(history.values().next(), Some(20.0));
    // Even count: mean of the two middle values (50, 60).
    assert_eq!(history.median(), Some(55.0));
}

#[test]
fn exact_target_frequency_is_zero_cents() {
    for name in tuning::preset_names() {
        let table = tuning::preset(name).unwrap();
        let config = TunerConfig { tuning: Some(table.clone()), ..Default::default() };
        let tuner = Tuner::new(&config).unwrap();
        for target in &table.targets {
            let result = tuner.map_frequency(target.frequency).unwrap();
            assert_eq!(result.label, target.label);
            assert!(result.raw_cents.abs() < 1.0);
        }
    }
}

#[test]
fn far_frequency_is_clamped_both_ways() {
    let table = TuningTable::new("single", vec![TuningTarget::new("A2", 110.0)]).unwrap();
    let tuner = Tuner::new(&TunerConfig { tuning: Some(table), ..Default::default() }).unwrap();
    assert_eq!(tuner.map_frequency(220.0).unwrap().cents, 50);
    assert_eq!(tuner.map_frequency(55.0).unwrap().cents, -50);
}

#[test]
fn midpoint_between_targets_is_deterministic() {
    let table = TuningTable::new(
        "fifth",
        vec![TuningTarget::new("A2", 110.0), TuningTarget::new("E3", 165.0)],
    )
    .unwrap();
    let tuner = Tuner::new(&TunerConfig { tuning: Some(table), ..Default::default() }).unwrap();
    for _ in 0..3 {
        assert_eq!(tuner.map_frequency(137.5).unwrap().label, "A2");
    }
}

#[test]
fn isolated_click_has_no_periodicity() {
    let mut samples = vec![0.0; 2048];
    samples[0] = 1.0;
    assert_eq!(
        pitch::detect_pitch_autocorr(&samples, SAMPLE_RATE, 0.0, DEFAULT_MIN_LAG),
        Estimate::NoPeriodicity
    );
}
