//! Audio output devices
//!
//! Devices take raw little-endian 16-bit PCM in the format they were opened
//! with. Writes block while the device is full, which paces playback.

pub mod pipe;

pub use pipe::{PipeDevice, Player};

use crate::Result;

/// Sample rate playback devices are opened with by default
pub const SAMPLE_RATE: u32 = 22050;

/// Synthesized speech is mono
pub const CHANNELS: u16 = 1;

/// Bytes written to the device per playback iteration
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Format an audio device is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    /// Mono audio at `sample_rate`
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: CHANNELS,
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::mono(SAMPLE_RATE)
    }
}

/// An open audio output
pub trait AudioDevice: Send {
    /// Write PCM bytes, returning how many were consumed
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Play out anything buffered and release the device
    fn close(&mut self) -> Result<()>;

    /// Check if the device has been closed
    fn is_closed(&self) -> bool;

    /// Preferred number of bytes per write
    fn buffer_size(&self) -> usize;
}
