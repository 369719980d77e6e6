//! Transport controls for the playback worker

use super::transport::{Command, JobParams, TransportState};
use super::{Backend, PlaybackSettings, PlaybackWorker};
use crate::speech::VoiceInfo;
use crate::{ClipspeakError, Result};
use crossbeam_channel::{bounded, unbounded, Sender};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Play, pause, stop and seek for one piece of text at a time
///
/// All methods are called from one thread. Playback itself runs on a worker
/// thread that is started by [`play`](Self::play) and joined by
/// [`stop`](Self::stop) or the next [`read`](Self::read).
pub struct PlaybackController {
    backend: Arc<dyn Backend>,
    settings: PlaybackSettings,

    /// Parameters applied to text passed to `read`
    defaults: JobParams,

    transport: Arc<TransportState>,

    /// Command channel of the current worker
    commands: Option<Sender<Command>>,

    worker: Option<JoinHandle<()>>,
}

impl PlaybackController {
    /// Create a controller with default settings and job parameters
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_settings(backend, PlaybackSettings::default(), JobParams::default())
    }

    /// Create a controller with explicit timing and job defaults
    pub fn with_settings(
        backend: Arc<dyn Backend>,
        settings: PlaybackSettings,
        defaults: JobParams,
    ) -> Self {
        Self {
            backend,
            settings,
            defaults,
            transport: Arc::new(TransportState::new()),
            commands: None,
            worker: None,
        }
    }

    /// Load `text` with the default job parameters
    ///
    /// Stops anything playing, then starts a paused worker. Call
    /// [`play`](Self::play) to hear it; seeking before that is allowed.
    pub fn read(&mut self, text: &str) -> Result<()> {
        let job = self.defaults.clone().with_text(text);
        self.read_job(job)
    }

    /// Load a job with explicit parameters, paused
    pub fn read_job(&mut self, job: JobParams) -> Result<()> {
        self.stop();

        debug!("Loading {} bytes of text", job.text.len());
        self.transport.reset(job);

        // The worker must see `paused` before its first iteration
        self.transport.set_paused(true);
        self.play()
    }

    /// Start the worker, or resume it if paused
    ///
    /// Does nothing while already playing unpaused.
    pub fn play(&mut self) -> Result<()> {
        if !self.transport.is_playing() {
            self.reap_worker();

            let (tx, rx) = unbounded();
            self.transport.set_playing(true);
            let worker = PlaybackWorker::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.transport),
                rx,
                self.settings.clone(),
            );

            match worker.spawn() {
                Ok(handle) => {
                    info!("Playback started");
                    self.worker = Some(handle);
                    self.commands = Some(tx);
                    Ok(())
                }
                Err(e) => {
                    self.transport.set_playing(false);
                    Err(e)
                }
            }
        } else if self.transport.is_paused() {
            debug!("Resuming playback");
            self.transport.set_paused(false);
            self.send(Command::Resume);
            Ok(())
        } else {
            debug!("Already playing");
            Ok(())
        }
    }

    /// Pause playback; the worker closes the audio device
    pub fn pause(&mut self) {
        if self.transport.is_playing() {
            debug!("Pausing playback");
            self.transport.set_paused(true);
        } else {
            debug!("Nothing to pause");
        }
    }

    /// Stop playback and wait for the worker to exit
    pub fn stop(&mut self) {
        if !self.transport.is_playing() {
            // The worker may have finished on its own
            self.reap_worker();
            return;
        }

        info!("Stopping playback");
        self.transport.set_playing(false);
        self.send(Command::Shutdown);
        self.reap_worker();
        self.transport.set_paused(false);
    }

    /// Current position in the audio, in bytes
    pub fn position(&mut self) -> Result<usize> {
        let commands = self.live_commands("get position")?;

        let (reply_tx, reply_rx) = bounded(1);
        commands
            .send(Command::GetPosition(reply_tx))
            .map_err(|_| ClipspeakError::Worker("playback worker has exited".to_string()))?;
        reply_rx.recv().map_err(|_| {
            ClipspeakError::Worker("playback worker exited before replying".to_string())
        })
    }

    /// Seek to `position` bytes, clamped to the audio synthesized so far
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        let commands = self.live_commands("set position")?;

        commands
            .send(Command::SetPosition(position))
            .map_err(|_| ClipspeakError::Worker("playback worker has exited".to_string()))
    }

    /// Bytes of audio synthesized so far for the current text
    pub fn length(&self) -> usize {
        self.transport.length()
    }

    /// Check if a job is loaded, paused or not
    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Check if the loaded job is paused
    pub fn is_paused(&self) -> bool {
        self.transport.is_paused()
    }

    /// Text of the current job
    pub fn text(&self) -> String {
        self.transport.job().text
    }

    /// Default parameters used by `read`
    pub fn defaults(&self) -> &JobParams {
        &self.defaults
    }

    /// Replace the parameters used by `read`
    pub fn set_defaults(&mut self, defaults: JobParams) {
        self.defaults = defaults;
    }

    /// Voices offered by a fresh engine from the backend
    pub fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        let mut engine = self.backend.create_engine()?;
        engine.initialize()?;
        let voices = engine.list_voices();
        if let Err(e) = engine.terminate() {
            debug!("Failed to release voice listing engine: {}", e);
        }
        voices
    }

    /// The worker's command channel, if a worker is playing
    fn live_commands(&self, action: &str) -> Result<&Sender<Command>> {
        match &self.commands {
            Some(commands) if self.transport.is_playing() => Ok(commands),
            _ => {
                warn!("Cannot {}: nothing is playing", action);
                Err(ClipspeakError::NotPlaying)
            }
        }
    }

    fn send(&self, command: Command) {
        if let Some(commands) = &self.commands {
            if commands.send(command).is_err() {
                debug!("Playback worker is gone");
            }
        }
    }

    /// Join a worker that has exited or been told to
    fn reap_worker(&mut self) {
        // Dropping the sender also wakes a worker blocked on commands
        self.commands = None;
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Playback worker panicked");
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}
