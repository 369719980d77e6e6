//! Error types for clipspeak

use std::io;
use thiserror::Error;

/// Main error type for clipspeak
#[derive(Error, Debug)]
pub enum ClipspeakError {
    #[error("Speech synthesis error: {0}")]
    Engine(String),

    #[error("Audio device error: {0}")]
    Device(String),

    /// Transport command issued while nothing is playing
    #[error("Nothing is playing")]
    NotPlaying,

    #[error("Playback worker error: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("WAV stream error: {0}")]
    Wav(#[from] hound::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for clipspeak operations
pub type Result<T> = std::result::Result<T, ClipspeakError>;

impl From<String> for ClipspeakError {
    fn from(s: String) -> Self {
        ClipspeakError::Other(s)
    }
}

impl From<&str> for ClipspeakError {
    fn from(s: &str) -> Self {
        ClipspeakError::Other(s.to_string())
    }
}
