//! Playback worker
//!
//! Runs one job on its own thread: synthesizes the job's text into a
//! [`SynthesisStream`] and copies the stream to an audio device until the
//! audio runs out or the controller stops it. The device is only held while
//! audio is actually playing; pausing closes it.

use super::transport::{Command, JobParams, TransportState};
use super::{Backend, PlaybackSettings};
use crate::audio::{AudioDevice, AudioFormat};
use crate::speech::buffer::BUFFER_CHUNKS;
use crate::speech::{SentenceBuffer, SynthesisStream, Wake};
use crate::{ClipspeakError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use log::{debug, error, info};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Where the worker is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Paused,
    Draining,
    Stopped,
}

/// Clears `playing` when the worker thread ends, even by panic
struct PlayingGuard(Arc<TransportState>);

impl Drop for PlayingGuard {
    fn drop(&mut self) {
        self.0.set_playing(false);
    }
}

/// The audio device, opened on demand and closed on pause or exit
struct DeviceSlot {
    backend: Arc<dyn Backend>,
    format: AudioFormat,
    device: Option<Box<dyn AudioDevice>>,
}

impl DeviceSlot {
    fn new(backend: Arc<dyn Backend>, format: AudioFormat) -> Self {
        Self {
            backend,
            format,
            device: None,
        }
    }

    /// Open the device unless it is already open
    fn acquire(&mut self) -> Result<&mut Box<dyn AudioDevice>> {
        let reopen = self.device.as_ref().map_or(true, |d| d.is_closed());
        if reopen {
            debug!("Opening audio device");
            self.device = Some(self.backend.open_device(self.format)?);
        }

        self.device
            .as_mut()
            .ok_or_else(|| ClipspeakError::Device("audio device unavailable".to_string()))
    }

    /// Close the device if it is open
    fn release(&mut self) -> Result<()> {
        if let Some(mut device) = self.device.take() {
            if !device.is_closed() {
                debug!("Closing audio device");
                device.close()?;
            }
        }
        Ok(())
    }
}

impl Drop for DeviceSlot {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            error!("Failed to close audio device: {}", e);
        }
    }
}

/// Plays the job held in the shared [`TransportState`]
pub struct PlaybackWorker {
    backend: Arc<dyn Backend>,
    transport: Arc<TransportState>,
    commands: Receiver<Command>,
    settings: PlaybackSettings,
    state: WorkerState,
}

impl PlaybackWorker {
    pub fn new(
        backend: Arc<dyn Backend>,
        transport: Arc<TransportState>,
        commands: Receiver<Command>,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            backend,
            transport,
            commands,
            settings,
            state: WorkerState::Idle,
        }
    }

    /// Run the worker on a new thread
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("clipspeak-playback".to_string())
            .spawn(move || self.run())
            .map_err(|e| ClipspeakError::Worker(format!("Failed to start playback thread: {}", e)))
    }

    /// Play the current job to completion or until told to stop
    pub fn run(mut self) {
        let _playing = PlayingGuard(Arc::clone(&self.transport));
        info!("Playback worker started");

        if let Err(e) = self.play() {
            error!("Playback stopped: {}", e);
        }

        self.enter(WorkerState::Stopped);
        info!("Playback worker finished");
    }

    fn play(&mut self) -> Result<()> {
        let job = self.transport.job();
        let mut stream = self.open_stream(&job)?;
        let mut device = DeviceSlot::new(
            Arc::clone(&self.backend),
            AudioFormat::mono(stream.sample_rate()),
        );
        let mut repeats_left = job.repeats;

        self.enter(WorkerState::Running);
        self.publish_length(&stream);

        while self.transport.is_playing() {
            if self.transport.is_paused() {
                self.enter(WorkerState::Paused);
                device.release()?;

                // Synthesis keeps going while paused
                stream.pump();
                self.publish_length(&stream);

                match self.commands.recv_timeout(self.settings.pause_interval) {
                    Ok(command) => {
                        if !Self::service(command, &mut stream) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                continue;
            }
            self.enter(WorkerState::Running);

            if stream.is_exhausted() {
                if repeats_left == 0 {
                    debug!("End of audio");
                    break;
                }
                repeats_left -= 1;
                debug!("Playing again, {} repeats left", repeats_left);
                stream.set_position(0);
            }

            if !stream.has_unread() && !stream.is_done() {
                match stream.wait_ready(&self.commands, self.settings.frame_wait) {
                    Wake::Message(command) => {
                        if !Self::service(command, &mut stream) {
                            break;
                        }
                    }
                    Wake::Disconnected => break,
                    Wake::Frames | Wake::Timeout => {}
                }
                self.publish_length(&stream);
                continue;
            }

            let output = device.acquire()?;
            let buf = stream.read(output.buffer_size());
            let written = output.write(&buf)?;
            self.publish_length(&stream);

            if buf.is_empty() && written == 0 {
                break;
            }

            match self.commands.try_recv() {
                Ok(command) => {
                    if !Self::service(command, &mut stream) {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => break,
            }
        }

        self.enter(WorkerState::Draining);
        device.release()?;
        stream.close();
        Ok(())
    }

    /// Start synthesizing the job's text
    fn open_stream(&self, job: &JobParams) -> Result<SynthesisStream> {
        let engine = self.backend.create_engine()?;
        let mut sentences = SentenceBuffer::new(&job.text, &job.sentence_endings);

        if !job.split_sentences {
            let mut text = sentences.take_all();
            if !sentences.remainder().is_empty() {
                text.push(' ');
                text.push_str(sentences.remainder());
            }
            return SynthesisStream::new(engine, &text, &job.speech);
        }

        let mut stream = SynthesisStream::new(engine, &sentences.take(BUFFER_CHUNKS), &job.speech)?;
        while !sentences.is_finished() {
            stream.append(&sentences.take(BUFFER_CHUNKS))?;
        }
        if !sentences.remainder().is_empty() {
            stream.append(sentences.remainder())?;
        }
        Ok(stream)
    }

    /// Handle one controller command; false means leave the loop
    fn service(command: Command, stream: &mut SynthesisStream) -> bool {
        match command {
            Command::GetPosition(reply) => {
                if reply.send(stream.position()).is_err() {
                    debug!("Position requested but nobody is waiting");
                }
                true
            }
            Command::SetPosition(position) => {
                stream.set_position(position);
                true
            }
            Command::Resume => true,
            Command::Shutdown => {
                debug!("Shutdown requested");
                false
            }
        }
    }

    fn publish_length(&self, stream: &SynthesisStream) {
        if self.transport.length() != stream.length() {
            self.transport.set_length(stream.length());
        }
    }

    fn enter(&mut self, state: WorkerState) {
        if self.state != state {
            debug!("Playback worker {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}
