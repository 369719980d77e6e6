//! Factory for the engine and audio device used by a playback worker
//!
//! The worker creates both on its own thread, so neither is ever shared
//! between jobs.

use crate::audio::{AudioDevice, AudioFormat, PipeDevice, Player};
use crate::speech::backends::EspeakEngine;
use crate::speech::SynthEngine;
use crate::{ClipspeakError, Result};
use log::info;
use std::sync::Arc;

/// Source of speech engines and audio devices
pub trait Backend: Send + Sync {
    /// Create a fresh engine for one job
    fn create_engine(&self) -> Result<Box<dyn SynthEngine>>;

    /// Open an audio device for `format`
    fn open_device(&self, format: AudioFormat) -> Result<Box<dyn AudioDevice>>;
}

/// espeak-ng for speech, paplay or aplay for output
pub struct SystemBackend {
    espeak_path: String,
    player: Player,
    buffer_size: usize,
}

impl SystemBackend {
    pub fn new(espeak_path: impl Into<String>, player: Player, buffer_size: usize) -> Self {
        Self {
            espeak_path: espeak_path.into(),
            player,
            buffer_size,
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }
}

impl Backend for SystemBackend {
    fn create_engine(&self) -> Result<Box<dyn SynthEngine>> {
        Ok(Box::new(EspeakEngine::with_path(self.espeak_path.clone())))
    }

    fn open_device(&self, format: AudioFormat) -> Result<Box<dyn AudioDevice>> {
        Ok(Box::new(PipeDevice::open(
            self.player,
            format,
            self.buffer_size,
        )?))
    }
}

/// Find espeak-ng and an audio player on this system
///
/// `player` forces a specific player; otherwise paplay is preferred over
/// aplay.
pub fn create_backend(player: Option<Player>, buffer_size: usize) -> Result<Arc<dyn Backend>> {
    info!("Looking for espeak-ng...");
    let espeak_path = EspeakEngine::find_espeak().map_err(|e| {
        info!("✗ espeak-ng unavailable: {}", e);
        e
    })?;
    info!("✓ Using espeak-ng at {}", espeak_path);

    let player = match player {
        Some(player) if player.is_available() => player,
        Some(player) => {
            return Err(ClipspeakError::Device(format!(
                "Configured audio player {} is not installed",
                player.program()
            )))
        }
        None => Player::detect()?,
    };
    info!("✓ Using {} for audio output", player.program());

    Ok(Arc::new(SystemBackend::new(espeak_path, player, buffer_size)))
}
