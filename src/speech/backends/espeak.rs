//! espeak-ng synthesis engine
//!
//! Runs `espeak-ng --stdout` for each piece of text and streams the WAV it
//! writes back as sample batches, so audio is available while espeak-ng is
//! still working on the rest of the text.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use crate::speech::synth::{CallbackAction, FrameCallback, Parameter, SynthEngine, VoiceInfo};
use crate::{ClipspeakError, Result};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::io::{self, BufReader, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

/// Sample rate of espeak-ng's output
pub const ESPEAK_SAMPLE_RATE: u32 = 22050;

/// Bytes read from espeak-ng per sample batch
const READ_CHUNK: usize = 4096;

/// A running espeak-ng process and the thread reading its output
struct Synthesis {
    child: Child,
    reader: Option<JoinHandle<()>>,
}

/// espeak-ng engine driven through its command line
pub struct EspeakEngine {
    /// Path to espeak-ng
    espeak_path: String,

    /// Voice passed with `-v`
    voice: String,

    /// Numeric parameters used for the next synthesis
    params: HashMap<Parameter, i32>,

    /// Synthesis in progress, if any
    current: Option<Synthesis>,

    range_warned: bool,
    terminated: bool,
}

impl EspeakEngine {
    /// Create an engine, verifying espeak-ng is installed
    pub fn new() -> Result<Self> {
        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);
        Ok(Self::with_path(espeak_path))
    }

    /// Create an engine using a known espeak-ng executable
    pub fn with_path(espeak_path: impl Into<String>) -> Self {
        let params = [
            Parameter::Rate,
            Parameter::Volume,
            Parameter::Pitch,
            Parameter::Range,
        ]
        .into_iter()
        .map(|p| (p, Self::default_value(p)))
        .collect();

        Self {
            espeak_path: espeak_path.into(),
            voice: crate::speech::synth::DEFAULT_VOICE.to_string(),
            params,
            current: None,
            range_warned: false,
            terminated: false,
        }
    }

    /// Find espeak-ng executable
    pub fn find_espeak() -> Result<String> {
        let paths = vec!["espeak-ng", "/usr/bin/espeak-ng", "espeak"];

        for path in paths {
            if let Ok(output) = Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                if output.success() {
                    return Ok(path.to_string());
                }
            }
        }

        Err(ClipspeakError::Engine(
            "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
        ))
    }

    /// espeak-ng's own default for a parameter
    fn default_value(param: Parameter) -> i32 {
        match param {
            Parameter::Rate => 175,
            Parameter::Volume => 100,
            Parameter::Pitch => 50,
            Parameter::Range => 50,
        }
    }

    /// Accepted values for a parameter
    fn limits(param: Parameter) -> (i32, i32) {
        match param {
            Parameter::Rate => (80, 450),
            Parameter::Volume => (0, 200),
            Parameter::Pitch => (0, 100),
            Parameter::Range => (0, 100),
        }
    }

    /// Command line for one synthesis; the text itself goes to stdin
    fn command_args(&self) -> Vec<String> {
        let value = |p: Parameter| self.params[&p].to_string();
        vec![
            "-v".to_string(),
            self.voice.clone(),
            "-s".to_string(),
            value(Parameter::Rate),
            "-a".to_string(),
            value(Parameter::Volume),
            "-p".to_string(),
            value(Parameter::Pitch),
            "--stdout".to_string(),
            "--stdin".to_string(),
        ]
    }

    /// Kill the running espeak-ng process and wait for its reader
    fn cancel_process(&mut self) {
        if let Some(mut synthesis) = self.current.take() {
            debug!("Killing espeak-ng process");
            if let Err(e) = synthesis.child.kill() {
                debug!("Failed to kill espeak-ng process: {}", e);
            }
            let _ = synthesis.child.wait(); // Clean up zombie

            if let Some(reader) = synthesis.reader.take() {
                if reader.join().is_err() {
                    error!("espeak-ng reader thread panicked");
                }
            }
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.terminated {
            Err(ClipspeakError::Engine("espeak-ng engine was terminated".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SynthEngine for EspeakEngine {
    fn initialize(&mut self) -> Result<u32> {
        self.ensure_running()?;
        Ok(ESPEAK_SAMPLE_RATE)
    }

    fn synthesize(&mut self, text: &str, on_frames: FrameCallback) -> Result<()> {
        self.ensure_running()?;
        self.cancel_process();

        let mut cmd = Command::new(&self.espeak_path);
        cmd.args(self.command_args());
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn espeak-ng: {}", e);
            ClipspeakError::Engine(format!("Failed to start espeak-ng: {}", e))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipspeakError::Engine("espeak-ng stdout not available".to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            let text = text.to_string();
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    debug!("Failed to send text to espeak-ng: {}", e);
                }
            });
        }

        let reader = thread::Builder::new()
            .name("espeak-reader".to_string())
            .spawn(move || read_samples(stdout, on_frames))?;

        debug!("espeak-ng process started");
        self.current = Some(Synthesis {
            child,
            reader: Some(reader),
        });
        Ok(())
    }

    fn set_parameter(&mut self, param: Parameter, value: i32) -> Result<()> {
        let (min, max) = Self::limits(param);
        if value < min || value > max {
            return Err(ClipspeakError::Engine(format!(
                "{} {} out of range ({}-{})",
                param, value, min, max
            )));
        }

        if param == Parameter::Range && !self.range_warned {
            self.range_warned = true;
            warn!("Pitch range is not supported by the espeak-ng command line");
        }

        debug!("Setting {} to {}", param, value);
        self.params.insert(param, value);
        Ok(())
    }

    fn parameter(&self, param: Parameter) -> Result<i32> {
        Ok(self
            .params
            .get(&param)
            .copied()
            .unwrap_or_else(|| Self::default_value(param)))
    }

    fn set_voice_by_name(&mut self, name: &str) -> Result<()> {
        let voices = self.list_voices()?;
        if voices.iter().any(|v| v.matches(name)) {
            debug!("Selecting voice: {}", name);
            self.voice = name.to_string();
            Ok(())
        } else {
            Err(ClipspeakError::Engine(format!("Unknown voice: {}", name)))
        }
    }

    fn current_voice(&self) -> Option<String> {
        Some(self.voice.clone())
    }

    fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        let output = Command::new(&self.espeak_path)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ClipspeakError::Engine(format!("Failed to list voices: {}", e)))?;

        if !output.status.success() {
            return Err(ClipspeakError::Engine(
                "espeak-ng could not list its voices".to_string(),
            ));
        }

        Ok(parse_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.cancel_process();
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.cancel_process();
        self.terminated = true;
        Ok(())
    }
}

impl Drop for EspeakEngine {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng engine");
        self.cancel_process();
    }
}

/// Stream the samples of a WAV read from `source` into `on_frames`
///
/// The header is parsed up front; samples are then forwarded as they
/// arrive. `on_frames(None)` marks the end unless the listener asked to stop.
fn read_samples<R: Read>(source: R, mut on_frames: FrameCallback) {
    let wav = match hound::WavReader::new(BufReader::new(source)) {
        Ok(wav) => wav,
        Err(e) => {
            error!("Unreadable espeak-ng output: {}", e);
            on_frames(None);
            return;
        }
    };

    let spec = wav.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 {
        warn!(
            "Unexpected espeak-ng format: {} channels, {} bits",
            spec.channels, spec.bits_per_sample
        );
    }

    let mut raw = wav.into_inner();
    let mut buf = vec![0u8; READ_CHUNK];
    let mut carry = None;

    loop {
        let n = match raw.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error!("Failed to read espeak-ng output: {}", e);
                break;
            }
        };

        let samples = decode_samples(&mut carry, &buf[..n]);
        if !samples.is_empty() && on_frames(Some(&samples)) == CallbackAction::Stop {
            debug!("Synthesis stopped by listener");
            return;
        }
    }

    on_frames(None);
}

/// Decode little-endian 16-bit samples, keeping an odd trailing byte
fn decode_samples(carry: &mut Option<u8>, bytes: &[u8]) -> Vec<i16> {
    let mut joined = Vec::with_capacity(bytes.len() + 1);
    joined.extend(carry.take());
    joined.extend_from_slice(bytes);

    if joined.len() % 2 == 1 {
        *carry = joined.pop();
    }

    joined
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Parse the table printed by `espeak-ng --voices`
///
/// Columns: priority, language, age/gender, name, file, other languages.
pub fn parse_voices(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            Some(VoiceInfo {
                language: fields[1].to_string(),
                name: fields[3].to_string(),
                identifier: fields[4].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use std::sync::Arc;

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: ESPEAK_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn collector() -> (FrameCallback, Arc<Mutex<Vec<i16>>>, Arc<Mutex<bool>>) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let ended = Arc::new(Mutex::new(false));
        let (s, e) = (Arc::clone(&samples), Arc::clone(&ended));
        let callback: FrameCallback = Box::new(move |frames| {
            match frames {
                Some(batch) => s.lock().extend_from_slice(batch),
                None => *e.lock() = true,
            }
            CallbackAction::Continue
        });
        (callback, samples, ended)
    }

    #[test]
    fn test_read_samples() {
        let (callback, samples, ended) = collector();
        read_samples(Cursor::new(wav_bytes(&[1, -2, 300])), callback);
        assert_eq!(*samples.lock(), vec![1, -2, 300]);
        assert!(*ended.lock());
    }

    #[test]
    fn test_read_samples_bad_header() {
        let (callback, samples, ended) = collector();
        read_samples(Cursor::new(b"not a wav file".to_vec()), callback);
        assert!(samples.lock().is_empty());
        assert!(*ended.lock());
    }

    #[test]
    fn test_decode_samples_carries_odd_byte() {
        let mut carry = None;
        assert_eq!(decode_samples(&mut carry, &[0x01, 0x00, 0x02]), vec![1]);
        assert_eq!(carry, Some(0x02));
        assert_eq!(decode_samples(&mut carry, &[0x01]), vec![0x0102]);
        assert_eq!(carry, None);
    }

    #[test]
    fn test_parse_voices() {
        let output = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";
        let voices = parse_voices(output);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].language, "en-us");
        assert_eq!(voices[1].name, "English_(America)");
        assert_eq!(voices[1].identifier, "gmw/en-US");
    }

    #[test]
    fn test_parameter_limits() {
        let mut engine = EspeakEngine::with_path("espeak-ng");
        assert_eq!(engine.parameter(Parameter::Rate).unwrap(), 175);
        assert!(engine.set_parameter(Parameter::Rate, 300).is_ok());
        assert_eq!(engine.parameter(Parameter::Rate).unwrap(), 300);
        assert!(engine.set_parameter(Parameter::Rate, 10).is_err());
        assert!(engine.set_parameter(Parameter::Volume, 201).is_err());
    }

    #[test]
    fn test_command_args() {
        let mut engine = EspeakEngine::with_path("espeak-ng");
        engine.set_parameter(Parameter::Pitch, 70).unwrap();
        let args = engine.command_args();
        assert_eq!(&args[..2], &["-v", "en-us"]);
        assert!(args.windows(2).any(|w| w == ["-p", "70"]));
        assert!(args.contains(&"--stdout".to_string()));
    }

    #[test]
    fn test_terminated_engine_refuses_work() {
        let mut engine = EspeakEngine::with_path("espeak-ng");
        engine.terminate().unwrap();
        assert!(engine.initialize().is_err());
    }

    #[test]
    fn test_create_espeak_engine() {
        match EspeakEngine::new() {
            Ok(_) => println!("✓ espeak-ng available"),
            Err(e) => println!("⚠ espeak-ng not available: {}", e),
        }
    }
}
