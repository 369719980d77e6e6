//! Incrementally filled buffer of synthesized audio
//!
//! The engine pushes sample batches through a callback, possibly from its own
//! thread. The callback only forwards them over a channel; the stream folds
//! them into a buffer it owns whenever it is read, so playback can start
//! before synthesis has finished.

use crate::speech::synth::{
    CallbackAction, FrameCallback, Parameter, SpeechParams, SynthEngine, VoiceInfo,
};
use crate::{ClipspeakError, Result};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use log::{debug, error, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the frame callback forwards to the stream
enum Delivery {
    /// Little-endian 16-bit samples
    Frames(Vec<u8>),
    /// The engine has no more data for the submitted text
    End,
}

/// Outcome of [`SynthesisStream::wait_ready`]
#[derive(Debug, PartialEq, Eq)]
pub enum Wake<T> {
    /// New audio (or the end of synthesis) arrived
    Frames,
    /// A message arrived on the other channel
    Message(T),
    /// The other channel has no senders left
    Disconnected,
    /// Nothing happened before the timeout
    Timeout,
}

/// Synthesized audio for one piece of text
pub struct SynthesisStream {
    /// Engine owned for the lifetime of the stream
    engine: Box<dyn SynthEngine>,

    /// Voice requested for this stream
    voice: String,

    /// Output sample rate reported by the engine
    sample_rate: u32,

    /// Audio received so far
    data: Vec<u8>,

    /// Read cursor into `data`
    position: usize,

    /// Engine reported the end of all submitted text
    done: bool,

    /// Cleared to ask the engine to stop delivering
    speaking: Arc<AtomicBool>,

    closed: bool,

    /// Appended text waiting for the current synthesis to end
    pending: VecDeque<String>,

    deliveries_tx: Sender<Delivery>,
    deliveries: Receiver<Delivery>,
}

impl SynthesisStream {
    /// Initialize `engine`, apply `params` and start synthesizing `text`
    ///
    /// Voice and parameter failures are logged and leave the engine's
    /// defaults in place; only failing to initialize or submit is an error.
    pub fn new(mut engine: Box<dyn SynthEngine>, text: &str, params: &SpeechParams) -> Result<Self> {
        let sample_rate = engine.initialize()?;
        debug!("Speech engine initialized at {} Hz", sample_rate);

        let (deliveries_tx, deliveries) = unbounded();
        let mut stream = Self {
            engine,
            voice: params.voice.clone(),
            sample_rate,
            data: Vec::new(),
            position: 0,
            done: false,
            speaking: Arc::new(AtomicBool::new(false)),
            closed: false,
            pending: VecDeque::new(),
            deliveries_tx,
            deliveries,
        };

        if stream.set_voice(&params.voice).is_err() {
            warn!("Using the engine's default voice instead of {}", params.voice);
        }
        for (param, value) in params.numeric() {
            stream.set_parameter(param, value).ok();
        }

        stream.submit(text)?;
        Ok(stream)
    }

    /// Hand `text` to the engine with a fresh frame callback
    fn submit(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        self.speaking.store(true, Ordering::SeqCst);
        self.done = false;

        let tx = self.deliveries_tx.clone();
        let speaking = Arc::clone(&self.speaking);
        let on_frames: FrameCallback = Box::new(move |frames| match frames {
            Some(samples) if !samples.is_empty() => {
                let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
                if tx.send(Delivery::Frames(bytes)).is_err() {
                    return CallbackAction::Stop;
                }
                if speaking.load(Ordering::SeqCst) {
                    CallbackAction::Continue
                } else {
                    CallbackAction::Stop
                }
            }
            _ => {
                speaking.store(false, Ordering::SeqCst);
                let _ = tx.send(Delivery::End);
                CallbackAction::Stop
            }
        });

        debug!("Submitting {} bytes of text for synthesis", text.len());
        self.engine.synthesize(text, on_frames).map_err(|e| {
            error!("Synthesis failed: {}", e);
            e
        })
    }

    /// Queue more text to be spoken after what was already submitted
    pub fn append(&mut self, text: &str) -> Result<()> {
        if self.closed {
            warn!("Ignoring text appended to a closed stream");
            return Ok(());
        }

        self.pump();
        if self.done {
            self.submit(text)
        } else {
            self.pending.push_back(text.to_string());
            Ok(())
        }
    }

    /// Fold audio delivered so far into the buffer
    ///
    /// Returns the number of bytes added.
    pub fn pump(&mut self) -> usize {
        let before = self.data.len();
        while let Ok(delivery) = self.deliveries.try_recv() {
            self.accept(delivery);
        }
        self.data.len() - before
    }

    fn accept(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Frames(bytes) => {
                if !self.closed {
                    self.data.extend_from_slice(&bytes);
                }
            }
            Delivery::End => self.end_submission(),
        }
    }

    fn end_submission(&mut self) {
        if self.closed {
            self.done = true;
            return;
        }

        match self.pending.pop_front() {
            Some(next) => {
                if self.submit(&next).is_err() {
                    self.pending.clear();
                    self.done = true;
                }
            }
            None => {
                debug!("Synthesis finished with {} bytes of audio", self.data.len());
                self.done = true;
            }
        }
    }

    /// Block until audio arrives, a message arrives on `other`, or `timeout`
    pub fn wait_ready<T>(&mut self, other: &Receiver<T>, timeout: Duration) -> Wake<T> {
        enum Selected<T> {
            Delivery(Delivery),
            Message(T),
            Disconnected,
            Timeout,
        }

        let selected = select! {
            recv(self.deliveries) -> msg => match msg {
                Ok(delivery) => Selected::Delivery(delivery),
                Err(_) => Selected::Timeout,
            },
            recv(other) -> msg => match msg {
                Ok(message) => Selected::Message(message),
                Err(_) => Selected::Disconnected,
            },
            default(timeout) => Selected::Timeout,
        };

        match selected {
            Selected::Delivery(delivery) => {
                self.accept(delivery);
                self.pump();
                Wake::Frames
            }
            Selected::Message(message) => Wake::Message(message),
            Selected::Disconnected => Wake::Disconnected,
            Selected::Timeout => Wake::Timeout,
        }
    }

    /// Read up to `size` bytes from the cursor
    ///
    /// Never blocks. Once synthesis is done and the cursor reaches the end,
    /// the result is padded with silence to exactly `size` bytes; the cursor
    /// only counts real audio.
    pub fn read(&mut self, size: usize) -> Vec<u8> {
        self.pump();

        let start = self.position.min(self.data.len());
        let end = start.saturating_add(size).min(self.data.len());
        let mut buf = self.data[start..end].to_vec();
        self.position = end;

        if self.done && self.position == self.data.len() && buf.len() < size {
            buf.resize(size, 0);
        }

        buf
    }

    /// Current read position in bytes
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the read position, clamped to the audio received so far
    pub fn set_position(&mut self, position: usize) {
        self.pump();
        self.position = position.min(self.data.len());
        debug!("Stream position set to {}", self.position);
    }

    /// Bytes of audio received so far
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// Check if there is audio past the cursor
    pub fn has_unread(&self) -> bool {
        self.position < self.data.len()
    }

    /// Check if all text has been synthesized
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Check if synthesis is done and every byte has been read
    pub fn is_exhausted(&self) -> bool {
        self.done && self.position >= self.data.len()
    }

    /// Check if the engine is still producing audio
    pub fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    /// Check if the stream has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Sample rate of the audio in the buffer
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stop synthesis and release the engine
    ///
    /// Safe to call more than once; only the first call reaches the engine.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }

        self.speaking.store(false, Ordering::SeqCst);
        self.pending.clear();

        if let Err(e) = self.engine.cancel() {
            error!("Failed to cancel synthesis: {}", e);
        }
        if let Err(e) = self.engine.terminate() {
            error!("Failed to terminate speech engine: {}", e);
        }

        self.closed = true;
        debug!("Synthesis stream closed");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ClipspeakError::Engine("synthesis stream is closed".to_string()))
        } else {
            Ok(())
        }
    }

    /// Current value of an engine parameter
    pub fn parameter(&self, param: Parameter) -> Result<i32> {
        self.ensure_open()?;
        self.engine.parameter(param)
    }

    /// Change an engine parameter for text submitted from now on
    pub fn set_parameter(&mut self, param: Parameter, value: i32) -> Result<()> {
        self.ensure_open()?;
        self.engine.set_parameter(param, value).map_err(|e| {
            error!("Failed to set {} to {}: {}", param, value, e);
            e
        })
    }

    pub fn pitch(&self) -> Result<i32> {
        self.parameter(Parameter::Pitch)
    }

    pub fn set_pitch(&mut self, value: i32) -> Result<()> {
        self.set_parameter(Parameter::Pitch, value)
    }

    pub fn rate(&self) -> Result<i32> {
        self.parameter(Parameter::Rate)
    }

    pub fn set_rate(&mut self, value: i32) -> Result<()> {
        self.set_parameter(Parameter::Rate, value)
    }

    pub fn volume(&self) -> Result<i32> {
        self.parameter(Parameter::Volume)
    }

    pub fn set_volume(&mut self, value: i32) -> Result<()> {
        self.set_parameter(Parameter::Volume, value)
    }

    /// Inflection range
    pub fn range(&self) -> Result<i32> {
        self.parameter(Parameter::Range)
    }

    pub fn set_range(&mut self, value: i32) -> Result<()> {
        self.set_parameter(Parameter::Range, value)
    }

    /// Voice the engine is using
    pub fn voice(&self) -> String {
        if self.closed {
            return self.voice.clone();
        }
        self.engine
            .current_voice()
            .unwrap_or_else(|| self.voice.clone())
    }

    /// Select a voice by name; unknown names are reported and returned as errors
    pub fn set_voice(&mut self, name: &str) -> Result<()> {
        self.ensure_open()?;
        self.voice = name.to_string();
        self.engine.set_voice_by_name(name).map_err(|e| {
            error!("Failed to select voice {}: {}", name, e);
            e
        })
    }

    /// Voices available from the engine
    pub fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        self.ensure_open()?;
        self.engine.list_voices()
    }
}

impl Drop for SynthesisStream {
    fn drop(&mut self) {
        self.close();
    }
}
