//! State and messages shared by the controller and the playback worker

use crate::speech::buffer::DEFAULT_SENTENCE_ENDINGS;
use crate::speech::SpeechParams;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Everything the worker needs to play one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    /// Text to read
    pub text: String,

    /// Voice and engine parameters
    pub speech: SpeechParams,

    /// Extra times to play the audio after the first pass
    pub repeats: u32,

    /// Characters that end a sentence
    pub sentence_endings: String,

    /// Submit one sentence at a time instead of the whole text
    pub split_sentences: bool,
}

impl JobParams {
    /// Same parameters for different text
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

impl Default for JobParams {
    fn default() -> Self {
        Self {
            text: String::new(),
            speech: SpeechParams::default(),
            repeats: 0,
            sentence_endings: DEFAULT_SENTENCE_ENDINGS.to_string(),
            split_sentences: false,
        }
    }
}

/// Transport flags and the current job, shared with the worker
///
/// The controller writes `playing` and `paused`; the worker writes `length`
/// and clears `playing` when it exits.
pub struct TransportState {
    playing: AtomicBool,
    paused: AtomicBool,

    /// Bytes of audio synthesized so far
    length: AtomicUsize,

    job: Mutex<JobParams>,
}

impl TransportState {
    pub fn new() -> Self {
        Self {
            playing: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            length: AtomicUsize::new(0),
            job: Mutex::new(JobParams::default()),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn length(&self) -> usize {
        self.length.load(Ordering::SeqCst)
    }

    pub fn set_length(&self, length: usize) {
        self.length.store(length, Ordering::SeqCst);
    }

    /// Copy of the current job
    pub fn job(&self) -> JobParams {
        self.job.lock().clone()
    }

    /// Start over with a new job
    pub fn reset(&self, job: JobParams) {
        *self.job.lock() = job;
        self.length.store(0, Ordering::SeqCst);
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests from the controller to the worker
#[derive(Debug)]
pub enum Command {
    /// Reply with the stream position in bytes
    GetPosition(Sender<usize>),
    /// Move the stream position
    SetPosition(usize),
    /// Wake up after `paused` was cleared
    Resume,
    /// Leave the playback loop
    Shutdown,
}
