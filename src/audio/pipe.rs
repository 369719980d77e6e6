//! Audio device backed by a command line player
//!
//! Raw PCM is piped into `paplay` (PulseAudio, including WSLg) or `aplay`
//! (ALSA). Writes block once the pipe is full, so the player paces playback.
//! Closing the pipe lets the player finish what it has buffered and exit.
//!
//! Dependencies:
//! - pulseaudio-utils (paplay) or alsa-utils (aplay)

use super::{AudioDevice, AudioFormat};
use crate::platform::{is_wsl, wslg_pulse_server, WSLG_PULSE_PATH};
use crate::{ClipspeakError, Result};
use log::{debug, error, info, warn};
use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Player program fed by a [`PipeDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    /// PulseAudio's paplay
    Paplay,
    /// ALSA's aplay
    Aplay,
}

impl Player {
    /// Parse a configured player name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "paplay" | "pulseaudio" | "pulse" => Some(Player::Paplay),
            "aplay" | "alsa" => Some(Player::Aplay),
            _ => None,
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Player::Paplay => "paplay",
            Player::Aplay => "aplay",
        }
    }

    /// Arguments for raw signed 16-bit little-endian input in `format`
    pub fn args(&self, format: AudioFormat) -> Vec<String> {
        match self {
            Player::Paplay => vec![
                "--raw".to_string(),
                format!("--rate={}", format.sample_rate),
                format!("--channels={}", format.channels),
                "--format=s16le".to_string(),
            ],
            Player::Aplay => vec![
                "-q".to_string(),
                "-t".to_string(),
                "raw".to_string(),
                "-f".to_string(),
                "S16_LE".to_string(),
                "-r".to_string(),
                format.sample_rate.to_string(),
                "-c".to_string(),
                format.channels.to_string(),
            ],
        }
    }

    /// Check if the player program can be run
    pub fn is_available(&self) -> bool {
        Command::new(self.program())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Pick the first available player, preferring PulseAudio
    pub fn detect() -> Result<Self> {
        for player in [Player::Paplay, Player::Aplay] {
            if player.is_available() {
                info!("✓ Found audio player {}", player.program());
                return Ok(player);
            }
            info!("✗ Audio player {} unavailable", player.program());
        }

        Err(ClipspeakError::Device(
            "No audio player found. Install pulseaudio-utils (paplay) or alsa-utils (aplay)"
                .to_string(),
        ))
    }
}

/// Setup PulseAudio server environment
///
/// Auto-detects the WSLg PulseAudio server and sets PULSE_SERVER if needed.
pub fn setup_pulseaudio() -> Result<()> {
    if std::env::var("PULSE_SERVER").is_ok() {
        debug!("PULSE_SERVER already set via environment");
        return Ok(());
    }

    if let Some(server) = wslg_pulse_server() {
        info!("Auto-detected WSLG PulseAudio server at {}", server.display());
        std::env::set_var("PULSE_SERVER", &server);
        return Ok(());
    }

    if is_wsl() {
        warn!("WSLG PulseAudio server not found at {}", WSLG_PULSE_PATH);
        warn!("Make sure WSLg is installed and running, or set PULSE_SERVER");
        return Err(ClipspeakError::Device(
            "PulseAudio server not found. Install WSLg or set PULSE_SERVER environment variable."
                .to_string(),
        ));
    }

    // Native Linux: paplay connects through the default socket
    debug!("PulseAudio will use default configuration");
    Ok(())
}

/// Audio device writing into a player's stdin
pub struct PipeDevice {
    player: Player,

    /// Running player process; None once closed
    child: Option<Child>,

    /// Pipe into the player
    stdin: Option<ChildStdin>,

    buffer_size: usize,
}

impl PipeDevice {
    /// Start `player` for `format`
    pub fn open(player: Player, format: AudioFormat, buffer_size: usize) -> Result<Self> {
        if player == Player::Paplay {
            setup_pulseaudio()?;
        }

        let mut child = Command::new(player.program())
            .args(player.args(format))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("Failed to spawn {}: {}", player.program(), e);
                ClipspeakError::Device(format!("Failed to start {}: {}", player.program(), e))
            })?;

        let stdin = child.stdin.take();
        debug!(
            "Opened {} at {} Hz, {} channel(s)",
            player.program(),
            format.sample_rate,
            format.channels
        );

        Ok(Self {
            player,
            child: Some(child),
            stdin,
            buffer_size,
        })
    }
}

impl AudioDevice for PipeDevice {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let program = self.player.program();
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ClipspeakError::Device("audio device is closed".to_string()))?;

        if data.is_empty() {
            return Ok(0);
        }

        stdin.write_all(data).map_err(|e| {
            ClipspeakError::Device(format!("{} stopped accepting audio: {}", program, e))
        })?;
        Ok(data.len())
    }

    fn close(&mut self) -> Result<()> {
        // EOF tells the player to drain and exit
        drop(self.stdin.take());

        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            debug!("{} exited with {}", self.player.program(), status);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.child.is_none()
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Drop for PipeDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("Failed to close {}: {}", self.player.program(), e);
        }
    }
}
