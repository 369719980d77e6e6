//! clipspeak - read text aloud with transport controls
//!
//! Text is split into sentences, synthesized by a speech engine into an
//! incrementally filled audio buffer, and played on an audio device by a
//! worker thread. A controller in the caller's thread exposes play, pause,
//! stop and seek.

pub mod audio;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod input;
pub mod platform;
pub mod playback;
pub mod speech;

pub use error::{ClipspeakError, Result};
pub use playback::{PlaybackController, PlaybackWorker};
pub use speech::{SentenceBuffer, SynthesisStream};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "clipspeak";
