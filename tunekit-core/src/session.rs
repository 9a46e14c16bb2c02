//! # Tuner Session Module
//!
//! Confines a [`Tuner`] to one worker thread per capture session. Frames
//! arrive on one channel, configuration changes on another, and every frame
//! produces exactly one [`CycleResult`] on the outbound channel. No state is
//! shared with the caller.
//!
//! ## Architecture
//! - **Capture thread**: audio callback sends `SampleBuffer`s (see [`crate::audio`])
//! - **Worker thread**: runs the pipeline frame by frame
//! - **Caller**: polls results and sends commands through a [`SessionHandle`]

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, info, trace, warn};
use std::thread::{self, JoinHandle};

use crate::buffer::SampleBuffer;
use crate::config::TunerConfig;
use crate::error::{self, Result, TunerError};
use crate::mode::TargetMode;
use crate::tuner::Tuner;
use crate::tuning::TuningTable;
use crate::CycleResult;

/// Results buffered for a caller that is not reading; newer ones are
/// dropped once it is full.
pub const RESULT_CAPACITY: usize = 64;

/// Configuration changes applied by the worker before its next frame.
#[derive(Debug, Clone)]
enum Command {
    SetReferencePitch(f32),
    SetNoiseThreshold(f32),
    SetTuning(Option<TuningTable>),
    SelectTarget(usize),
    AutoMode,
}

/// Caller-side handle of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: Sender<Command>,
    results: Receiver<CycleResult>,
    shutdown_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
    // Mirrors the worker's table so manual selections can be checked here.
    tuning: Option<TuningTable>,
}

/// Spawns a session worker for a stream of frames.
///
/// # Arguments
/// * `config` - Initial tuner configuration (validated before spawning)
/// * `frames` - Receiver fed by audio capture
///
/// # Returns
/// * `Ok(handle)` - Worker is running
/// * `Err(e)` - Configuration is invalid
pub fn spawn(config: &TunerConfig, frames: Receiver<SampleBuffer>) -> Result<SessionHandle> {
    let tuner = Tuner::new(config)?;
    let (command_tx, command_rx) = crossbeam_channel::unbounded();
    let (result_tx, result_rx) = crossbeam_channel::bounded(RESULT_CAPACITY);
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let thread_handle = thread::Builder::new()
        .name("tunekit-session".into())
        .spawn(move || run_worker(tuner, frames, command_rx, result_tx, shutdown_rx))?;

    Ok(SessionHandle {
        commands: command_tx,
        results: result_rx,
        shutdown_tx,
        thread_handle: Some(thread_handle),
        tuning: config.tuning.clone(),
    })
}

fn run_worker(
    mut tuner: Tuner,
    frames: Receiver<SampleBuffer>,
    commands: Receiver<Command>,
    results: Sender<CycleResult>,
    shutdown_rx: Receiver<()>,
) {
    info!("session worker started");
    loop {
        crossbeam_channel::select! {
            recv(commands) -> msg => match msg {
                Ok(command) => apply(&mut tuner, command),
                Err(_) => {
                    debug!("command channel closed");
                    break;
                }
            },
            recv(frames) -> msg => match msg {
                Ok(frame) => {
                    // Commands sent before this frame take effect on it.
                    while let Ok(command) = commands.try_recv() {
                        apply(&mut tuner, command);
                    }
                    match results.try_send(tuner.process(&frame)) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => trace!("result queue full, dropping result"),
                        Err(TrySendError::Disconnected(_)) => {
                            debug!("result receiver dropped");
                            break;
                        }
                    }
                }
                Err(_) => {
                    debug!("frame channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                debug!("received shutdown signal");
                break;
            },
        }
    }
    info!("session worker finished");
}

fn apply(tuner: &mut Tuner, command: Command) {
    let outcome = match command {
        Command::SetReferencePitch(a4) => tuner.set_reference_pitch(a4),
        Command::SetNoiseThreshold(threshold) => tuner.set_noise_threshold(threshold),
        Command::SetTuning(table) => tuner.set_tuning(table),
        Command::SelectTarget(index) => tuner.select_target(index),
        Command::AutoMode => {
            tuner.auto_mode();
            Ok(())
        }
    };
    // Commands are validated by the handle; this only fires on a logic error.
    if let Err(e) = outcome {
        warn!("session rejected command: {e}");
    }
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TunerError::SessionClosed)
    }

    pub fn set_reference_pitch(&self, a4: f32) -> Result<()> {
        self.send(Command::SetReferencePitch(error::validate_reference_pitch(a4)?))
    }

    pub fn set_noise_threshold(&self, threshold: f32) -> Result<()> {
        self.send(Command::SetNoiseThreshold(error::validate_noise_threshold(threshold)?))
    }

    /// Switches tuning table; the worker also returns to auto mode.
    pub fn set_tuning(&mut self, table: Option<TuningTable>) -> Result<()> {
        if let Some(table) = &table {
            table.validate()?;
        }
        self.send(Command::SetTuning(table.clone()))?;
        self.tuning = table;
        Ok(())
    }

    pub fn select_target(&self, index: usize) -> Result<()> {
        TargetMode::manual(self.tuning.as_ref(), index)?;
        self.send(Command::SelectTarget(index))
    }

    pub fn auto_mode(&self) -> Result<()> {
        self.send(Command::AutoMode)
    }

    /// Results produced so far, without blocking.
    ///
    /// At most [`RESULT_CAPACITY`] are held; frames processed while the
    /// queue is full do not produce a result.
    pub fn try_results(&self) -> impl Iterator<Item = CycleResult> + '_ {
        self.results.try_iter()
    }

    /// Receiver for blocking or `select!`-based consumption.
    pub fn results(&self) -> &Receiver<CycleResult> {
        &self.results
    }

    /// Stops the worker and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("session worker panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
