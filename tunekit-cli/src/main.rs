//! # tunekit - Command-line Tuner
//!
//! Front end for the tunekit core.
//!
//! ## Architecture
//! - **Audio Thread**: CPAL callback slicing microphone input into frames
//! - **Session Thread**: tuner pipeline fed through crossbeam channels
//! - **Main Thread**: prints one line per frame until the time limit or Ctrl-C

mod wav;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tunekit_core::track::{self, DEFAULT_TRACK_POINTS};
use tunekit_core::{CycleResult, IdleReason, TargetMode, TunerConfig, audio, session, tuning};

#[derive(Debug, Parser)]
#[command(name = "tunekit", version, about = "Autocorrelation tuner and pitch tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tune from the default microphone.
    Listen {
        #[command(flatten)]
        settings: Settings,
        /// Pin a tuning target by its index in the table (0 = first).
        #[arg(long)]
        string: Option<usize>,
        /// Stop after this many seconds.
        #[arg(long)]
        seconds: Option<u64>,
        /// Print each frame as a JSON line.
        #[arg(long)]
        json: bool,
    },
    /// Print a pitch timeline of a WAV file.
    Track {
        path: PathBuf,
        #[command(flatten)]
        settings: Settings,
        /// Maximum number of analysed frames.
        #[arg(long, default_value_t = DEFAULT_TRACK_POINTS)]
        points: usize,
        /// Print the timeline as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// List built-in tuning tables.
    Presets,
    /// Write a default configuration file.
    InitConfig {
        path: PathBuf,
        /// Tuning preset to include.
        #[arg(long)]
        tuning: Option<String>,
    },
}

/// Options shared by the analysis commands; they override the config file.
#[derive(Debug, clap::Args)]
struct Settings {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference pitch for A4 in Hz.
    #[arg(long)]
    reference: Option<f32>,
    /// RMS noise gate.
    #[arg(long)]
    threshold: Option<f32>,
    /// Tuning preset name (see `tunekit presets`).
    #[arg(long)]
    tuning: Option<String>,
}

impl Settings {
    fn resolve(&self) -> Result<TunerConfig> {
        let mut config = match &self.config {
            Some(path) => TunerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TunerConfig::default(),
        };
        if let Some(reference) = self.reference {
            config.reference_pitch = reference;
        }
        if let Some(threshold) = self.threshold {
            config.noise_threshold = threshold;
        }
        if let Some(name) = &self.tuning {
            config.tuning = Some(tuning::preset(name)?);
            config.mode = TargetMode::Auto;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Listen { settings, string, seconds, json } => {
            let mut config = settings.resolve()?;
            if let Some(index) = string {
                config.mode = TargetMode::manual(config.tuning.as_ref(), index)?;
            }
            listen(&config, seconds.map(Duration::from_secs), json)
        }
        Command::Track { path, settings, points, json } => {
            let config = settings.resolve()?;
            print_track(&path, &config, points, json)
        }
        Command::Presets => {
            for name in tuning::preset_names() {
                let table = tuning::preset(name)?;
                let targets: Vec<String> = table
                    .targets
                    .iter()
                    .map(|t| format!("{} {:.2}", t.label, t.frequency))
                    .collect();
                println!("{name}: {}", targets.join(", "));
            }
            Ok(())
        }
        Command::InitConfig { path, tuning } => {
            let config = match tuning {
                Some(name) => TunerConfig::with_preset(&name)?,
                None => TunerConfig::default(),
            };
            config.save(&path)?;
            info!("wrote {}", path.display());
            Ok(())
        }
    }
}

/// Runs live capture until `limit` elapses or the audio stream stops.
fn listen(config: &TunerConfig, limit: Option<Duration>, json: bool) -> Result<()> {
    let (frame_tx, frame_rx) = crossbeam_channel::bounded(8);
    let (stream, sample_rate) = audio::start_audio_capture(frame_tx, config.frame_size)?;
    let session = session::spawn(config, frame_rx)?;

    if let Some((low, high)) =
        tunekit_core::pitch::detectable_range(sample_rate as f32, config.frame_size, config.min_lag)
    {
        info!("listening at {sample_rate} Hz, detectable range {low:.1}-{high:.1} Hz");
    }

    let deadline = limit.map(crossbeam_channel::after).unwrap_or_else(crossbeam_channel::never);
    let mut last_idle: Option<IdleReason> = None;
    loop {
        crossbeam_channel::select! {
            recv(session.results()) -> msg => match msg {
                Ok(result) => print_cycle(&result, json, &mut last_idle)?,
                Err(_) => {
                    warn!("session ended");
                    break;
                }
            },
            recv(deadline) -> _ => break,
        }
    }

    drop(stream);
    session.shutdown();
    Ok(())
}

fn print_cycle(result: &CycleResult, json: bool, last_idle: &mut Option<IdleReason>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(result)?);
        return Ok(());
    }
    match result {
        CycleResult::Tuned(tuned) => {
            *last_idle = None;
            println!(
                "{:<4} {:+3} cents  {:8.2} Hz  {:?}",
                tuned.label,
                tuned.cents,
                tuned.frequency_hz,
                tuned.accuracy()
            );
        }
        // Only report the change into silence, not every silent frame.
        CycleResult::Idle(reason) => {
            if *last_idle != Some(*reason) {
                println!("--   ({reason:?})");
                *last_idle = Some(*reason);
            }
        }
    }
    Ok(())
}

fn print_track(path: &Path, config: &TunerConfig, points: usize, json: bool) -> Result<()> {
    let (samples, sample_rate) =
        wav::read_mono(path).with_context(|| format!("reading {}", path.display()))?;
    let track = track::extract_pitch_track(&samples, sample_rate as f32, config, points)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&track)?);
    } else {
        for point in &track {
            let minutes = (point.time_sec / 60.0).floor() as u32;
            let seconds = point.time_sec % 60.0;
            println!("{minutes}:{seconds:05.2}  {:<3} {:8.2} Hz", point.note, point.frequency_hz);
        }
    }
    Ok(())
}
