//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform Audio Library).
//! It selects an input device and configuration, slices the incoming stream into
//! fixed-size frames and hands each frame to the tuner as a [`SampleBuffer`].
//!
//! ## Features
//! - Default input device selection
//! - Prefers mono 32-bit float at 44.1 kHz, downmixes multi-channel input otherwise
//! - Non-blocking hand-off: frames are dropped rather than stalling the audio callback

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use log::{info, warn};

use crate::buffer::SampleBuffer;

/// Capture rate requested from the device when it supports it.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `sender` - Channel for delivering frames to the tuner session
/// * `frame_size` - Samples per delivered frame
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Running stream handle and its sample rate;
///   capture stops when the stream is dropped
/// * `Err(e)` - No device, no usable f32 configuration, or stream setup failure
pub fn start_audio_capture(
    sender: Sender<SampleBuffer>,
    frame_size: usize,
) -> Result<(cpal::Stream, u32)> {
    if frame_size == 0 {
        return Err(anyhow!("Frame size must be positive"));
    }

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let sample_rate = nearest_rate(&supported_config, TARGET_SAMPLE_RATE);
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let channels = config.channels().max(1) as usize;
    let config: cpal::StreamConfig = config.into();

    info!("Selected sample rate: {sample_rate} Hz, {channels} channel(s)");

    let err_fn = |err| warn!("An error occurred on the audio stream: {err}");

    // This buffer accumulates mono samples from the callback.
    let mut audio_buffer: Vec<f32> = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if channels == 1 {
                audio_buffer.extend_from_slice(data);
            } else {
                audio_buffer.extend(
                    data.chunks_exact(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                );
            }

            while audio_buffer.len() >= frame_size {
                let frame: Vec<f32> = audio_buffer.drain(..frame_size).collect();
                // Rate was validated by the device config; a failure here means zero Hz.
                if let Ok(buffer) = SampleBuffer::new(frame, sample_rate as f32) {
                    // Drop the frame if the consumer is behind.
                    let _ = sender.try_send(buffer);
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Only 32-bit float configurations qualify. Mono wins over multi-channel,
/// then the range closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let rate_diff = target_rate.abs_diff(nearest_rate(c, target_rate));
            (c.channels() != 1, rate_diff)
        })
}

/// Clamps the target rate into the range a configuration supports.
fn nearest_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}
