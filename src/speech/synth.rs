//! Speech synthesis engine abstraction
//!
//! An engine turns text into 16-bit mono samples and hands them over in
//! batches through a callback registered per synthesis call. Playback pulls
//! those samples into a [`SynthesisStream`](super::SynthesisStream).

use crate::Result;
use std::fmt;

/// Voice used when none is configured
pub const DEFAULT_VOICE: &str = "en-us";

/// Answer from a frame callback telling the engine whether to go on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep synthesizing
    Continue,
    /// Abort the current synthesis
    Stop,
}

/// Per-batch sample callback
///
/// Called with `Some(samples)` for each batch and with `None` (or an empty
/// batch) once the engine has no more data for the submitted text.
pub type FrameCallback = Box<dyn FnMut(Option<&[i16]>) -> CallbackAction + Send>;

/// Numeric engine parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Speaking rate in words per minute
    Rate,
    /// Output volume
    Volume,
    /// Base pitch
    Pitch,
    /// Inflection (pitch) range
    Range,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Rate => "rate",
            Parameter::Volume => "volume",
            Parameter::Pitch => "pitch",
            Parameter::Range => "range",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A voice the engine can speak with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Language tag, e.g. "en-us"
    pub language: String,
    /// Human readable name
    pub name: String,
    /// Engine-specific identifier (voice file)
    pub identifier: String,
}

impl VoiceInfo {
    /// Check if `name` selects this voice
    ///
    /// Names, identifiers and languages are all accepted, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.language.eq_ignore_ascii_case(name)
            || self.identifier.eq_ignore_ascii_case(name)
    }
}

/// Voice and parameters for one playback job
///
/// Unset parameters keep the engine's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechParams {
    pub voice: String,
    pub rate: Option<i32>,
    pub volume: Option<i32>,
    pub pitch: Option<i32>,
    pub range: Option<i32>,
}

impl SpeechParams {
    /// Parameters that were set, in the order they are applied
    pub fn numeric(&self) -> Vec<(Parameter, i32)> {
        [
            (Parameter::Rate, self.rate),
            (Parameter::Volume, self.volume),
            (Parameter::Pitch, self.pitch),
            (Parameter::Range, self.range),
        ]
        .into_iter()
        .filter_map(|(param, value)| value.map(|v| (param, v)))
        .collect()
    }
}

impl Default for SpeechParams {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            rate: None,
            volume: None,
            pitch: None,
            range: None,
        }
    }
}

/// Speech synthesis engine
///
/// Implementations may run synthesis on their own thread; the callback is
/// `Send` so it can be invoked from there.
pub trait SynthEngine: Send {
    /// Prepare the engine and return its output sample rate
    fn initialize(&mut self) -> Result<u32>;

    /// Start synthesizing `text`, delivering samples through `on_frames`
    fn synthesize(&mut self, text: &str, on_frames: FrameCallback) -> Result<()>;

    /// Set a numeric parameter for subsequent synthesis
    fn set_parameter(&mut self, param: Parameter, value: i32) -> Result<()>;

    /// Current value of a numeric parameter
    fn parameter(&self, param: Parameter) -> Result<i32>;

    /// Select the active voice by name, identifier or language
    fn set_voice_by_name(&mut self, name: &str) -> Result<()>;

    /// Language of the active voice
    fn current_voice(&self) -> Option<String>;

    /// Voices the engine knows about
    fn list_voices(&self) -> Result<Vec<VoiceInfo>>;

    /// Abort any synthesis in progress
    fn cancel(&mut self) -> Result<()>;

    /// Release engine resources; no calls are made afterwards
    fn terminate(&mut self) -> Result<()>;
}

/// Format voices as a table of language, name and identifier
pub fn format_voice_table(voices: &[VoiceInfo]) -> String {
    let mut table = format!("{:<22} {:<22} {}\n", "Language", "Name", "Identifier");
    table.push_str(&"-".repeat(55));
    table.push('\n');
    for voice in voices {
        table.push_str(&format!(
            "{:<22} {:<22} {}\n",
            voice.language, voice.name, voice.identifier
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(language: &str, name: &str, identifier: &str) -> VoiceInfo {
        VoiceInfo {
            language: language.to_string(),
            name: name.to_string(),
            identifier: identifier.to_string(),
        }
    }

    #[test]
    fn test_voice_matches() {
        let v = voice("en-us", "English_(America)", "gmw/en-US");
        assert!(v.matches("en-US"));
        assert!(v.matches("english_(america)"));
        assert!(v.matches("gmw/en-us"));
        assert!(!v.matches("fr"));
    }

    #[test]
    fn test_numeric_params() {
        let params = SpeechParams {
            rate: Some(200),
            range: Some(10),
            ..Default::default()
        };
        assert_eq!(
            params.numeric(),
            vec![(Parameter::Rate, 200), (Parameter::Range, 10)]
        );
        assert!(SpeechParams::default().numeric().is_empty());
    }

    #[test]
    fn test_voice_table() {
        let table = format_voice_table(&[voice("fr-fr", "French", "roa/fr")]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Language"));
        assert!(lines[2].starts_with("fr-fr"));
        assert!(lines[2].ends_with("roa/fr"));
    }
}
