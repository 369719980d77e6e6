//! Configuration management

use crate::audio::{Player, DEFAULT_BUFFER_SIZE};
use crate::clipboard::FALLBACK_TEXT;
use crate::playback::{JobParams, PlaybackSettings, FRAME_WAIT, PAUSE_INTERVAL};
use crate::speech::buffer::DEFAULT_SENTENCE_ENDINGS;
use crate::speech::synth::DEFAULT_VOICE;
use crate::speech::SpeechParams;
use crate::{ClipspeakError, Result};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persistent settings for voice, text splitting, audio output and playback
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.clipspeak.cfg by default)
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default path, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| ClipspeakError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| ClipspeakError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| ClipspeakError::Config(format!("Failed to save config: {}", e)))
    }

    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".clipspeak.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("voice", DEFAULT_VOICE)
            .set("rate", "-1")
            .set("pitch", "-1")
            .set("volume", "-1")
            .set("range", "-1");

        ini.with_section(Some("text"))
            .set("sentence_endings", DEFAULT_SENTENCE_ENDINGS)
            .set("split_sentences", "false")
            .set("fallback", FALLBACK_TEXT);

        ini.with_section(Some("audio"))
            .set("player", "auto")
            .set("buffer_size", DEFAULT_BUFFER_SIZE.to_string());

        ini.with_section(Some("playback"))
            .set("repeats", "0")
            .set("pause_interval_ms", PAUSE_INTERVAL.as_millis().to_string())
            .set("frame_wait_ms", FRAME_WAIT.as_millis().to_string());

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Optional engine parameter; negative means engine default
    fn speech_value(&self, key: &str) -> Option<i32> {
        Some(self.get_int("speech", key, -1)).filter(|&v| v >= 0)
    }

    pub fn voice(&self) -> String {
        let voice = self.get_string("speech", "voice", DEFAULT_VOICE);
        if voice.trim().is_empty() {
            DEFAULT_VOICE.to_string()
        } else {
            voice.trim().to_string()
        }
    }

    pub fn rate(&self) -> Option<i32> {
        self.speech_value("rate")
    }

    pub fn pitch(&self) -> Option<i32> {
        self.speech_value("pitch")
    }

    pub fn volume(&self) -> Option<i32> {
        self.speech_value("volume")
    }

    /// Pitch range
    pub fn range(&self) -> Option<i32> {
        self.speech_value("range")
    }

    pub fn sentence_endings(&self) -> String {
        self.get_string("text", "sentence_endings", DEFAULT_SENTENCE_ENDINGS)
    }

    /// Synthesize one sentence at a time?
    pub fn split_sentences(&self) -> bool {
        self.get_bool("text", "split_sentences", false)
    }

    /// Text spoken when there is nothing to read
    pub fn fallback_text(&self) -> String {
        self.get_string("text", "fallback", FALLBACK_TEXT)
    }

    /// Configured audio player; None means pick automatically
    pub fn player(&self) -> Option<Player> {
        let name = self.get_string("audio", "player", "auto");
        if name.trim().eq_ignore_ascii_case("auto") {
            return None;
        }

        let player = Player::from_name(&name);
        if player.is_none() {
            warn!("Unknown audio player {:?}, picking one automatically", name);
        }
        player
    }

    /// Bytes written to the audio device at a time
    pub fn buffer_size(&self) -> usize {
        match usize::try_from(self.get_int("audio", "buffer_size", -1)) {
            Ok(size) if size > 0 => size,
            _ => DEFAULT_BUFFER_SIZE,
        }
    }

    /// Extra times each text is played
    pub fn repeats(&self) -> u32 {
        self.get_int("playback", "repeats", 0).try_into().unwrap_or(0)
    }

    fn millis(&self, key: &str, default: Duration) -> Duration {
        match u64::try_from(self.get_int("playback", key, -1)) {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => default,
        }
    }

    pub fn pause_interval(&self) -> Duration {
        self.millis("pause_interval_ms", PAUSE_INTERVAL)
    }

    pub fn frame_wait(&self) -> Duration {
        self.millis("frame_wait_ms", FRAME_WAIT)
    }

    /// Voice and engine parameters
    pub fn speech_params(&self) -> SpeechParams {
        SpeechParams {
            voice: self.voice(),
            rate: self.rate(),
            volume: self.volume(),
            pitch: self.pitch(),
            range: self.range(),
        }
    }

    /// Job parameters for `text`
    pub fn job_defaults(&self, text: &str) -> JobParams {
        JobParams {
            text: text.to_string(),
            speech: self.speech_params(),
            repeats: self.repeats(),
            sentence_endings: self.sentence_endings(),
            split_sentences: self.split_sentences(),
        }
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            pause_interval: self.pause_interval(),
            frame_wait: self.frame_wait(),
        }
    }
}
