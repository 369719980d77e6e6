//! In-memory speech engine, audio device and backend for tests

#![allow(dead_code)]

use clipspeak::audio::{AudioDevice, AudioFormat};
use clipspeak::playback::Backend;
use clipspeak::speech::{CallbackAction, FrameCallback, Parameter, SynthEngine, VoiceInfo};
use clipspeak::{ClipspeakError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const MOCK_SAMPLE_RATE: u32 = 16000;

/// Engine producing `samples_per_char` samples for every character of text
///
/// With a `batch_delay` the samples are delivered from a thread, one batch
/// per delay, like a real engine; otherwise they arrive before `synthesize`
/// returns.
pub struct MockEngine {
    pub samples_per_char: usize,
    pub batch_samples: usize,
    pub batch_delay: Option<Duration>,
    pub log: Arc<Mutex<Vec<String>>>,
    params: HashMap<Parameter, i32>,
    voice: Option<String>,
    cancelled: Arc<AtomicBool>,
}

impl MockEngine {
    pub fn new(samples_per_char: usize) -> Self {
        Self {
            samples_per_char,
            batch_samples: 256,
            batch_delay: None,
            log: Arc::new(Mutex::new(Vec::new())),
            params: HashMap::new(),
            voice: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn batches(&self, text: &str) -> Vec<Vec<i16>> {
        let total = text.chars().count() * self.samples_per_char;
        let samples: Vec<i16> = (0..total).map(|i| (i % 100) as i16 + 1).collect();
        samples
            .chunks(self.batch_samples.max(1))
            .map(|c| c.to_vec())
            .collect()
    }
}

impl SynthEngine for MockEngine {
    fn initialize(&mut self) -> Result<u32> {
        self.log.lock().push("initialize".to_string());
        Ok(MOCK_SAMPLE_RATE)
    }

    fn synthesize(&mut self, text: &str, mut on_frames: FrameCallback) -> Result<()> {
        self.log.lock().push(format!("synthesize:{}", text));
        let batches = self.batches(text);
        self.cancelled.store(false, Ordering::SeqCst);

        match self.batch_delay {
            None => {
                for batch in &batches {
                    if on_frames(Some(batch.as_slice())) == CallbackAction::Stop {
                        return Ok(());
                    }
                }
                on_frames(None);
            }
            Some(delay) => {
                let cancelled = Arc::clone(&self.cancelled);
                thread::spawn(move || {
                    for batch in &batches {
                        thread::sleep(delay);
                        if cancelled.load(Ordering::SeqCst)
                            || on_frames(Some(batch.as_slice())) == CallbackAction::Stop
                        {
                            return;
                        }
                    }
                    on_frames(None);
                });
            }
        }
        Ok(())
    }

    fn set_parameter(&mut self, param: Parameter, value: i32) -> Result<()> {
        self.log.lock().push(format!("set:{}={}", param, value));
        self.params.insert(param, value);
        Ok(())
    }

    fn parameter(&self, param: Parameter) -> Result<i32> {
        Ok(self.params.get(&param).copied().unwrap_or(50))
    }

    fn set_voice_by_name(&mut self, name: &str) -> Result<()> {
        if self.list_voices()?.iter().any(|v| v.matches(name)) {
            self.voice = Some(name.to_string());
            Ok(())
        } else {
            Err(ClipspeakError::Engine(format!("Unknown voice: {}", name)))
        }
    }

    fn current_voice(&self) -> Option<String> {
        self.voice.clone()
    }

    fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        Ok(vec![
            VoiceInfo {
                language: "en-us".to_string(),
                name: "English_(America)".to_string(),
                identifier: "gmw/en-US".to_string(),
            },
            VoiceInfo {
                language: "de".to_string(),
                name: "German".to_string(),
                identifier: "gmw/de".to_string(),
            },
        ])
    }

    fn cancel(&mut self) -> Result<()> {
        self.log.lock().push("cancel".to_string());
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.log.lock().push("terminate".to_string());
        Ok(())
    }
}

/// What happened to the mock audio devices
#[derive(Default)]
pub struct DeviceLog {
    pub opened: usize,
    pub closed: usize,
    pub written: Vec<u8>,
    pub writes: usize,
}

/// Device that records writes, taking `write_delay` per write
pub struct MockDevice {
    log: Arc<Mutex<DeviceLog>>,
    buffer_size: usize,
    write_delay: Duration,
    fail_writes: bool,
    closed: bool,
}

impl AudioDevice for MockDevice {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(ClipspeakError::Device("closed".to_string()));
        }
        if self.fail_writes {
            return Err(ClipspeakError::Device("write failed".to_string()));
        }
        thread::sleep(self.write_delay);
        let mut log = self.log.lock();
        log.written.extend_from_slice(data);
        log.writes += 1;
        Ok(data.len())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.log.lock().closed += 1;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

/// Backend handing out mock engines and devices, counting both
pub struct MockBackend {
    pub samples_per_char: usize,
    pub batch_delay: Option<Duration>,
    pub buffer_size: usize,
    pub write_delay: Duration,
    pub fail_writes: bool,
    pub fail_open: bool,
    pub engines_created: AtomicUsize,
    pub engine_log: Arc<Mutex<Vec<String>>>,
    pub device_log: Arc<Mutex<DeviceLog>>,
    pub formats: Mutex<Vec<AudioFormat>>,
}

impl MockBackend {
    pub fn new(samples_per_char: usize) -> Self {
        Self {
            samples_per_char,
            batch_delay: None,
            buffer_size: 512,
            write_delay: Duration::from_millis(1),
            fail_writes: false,
            fail_open: false,
            engines_created: AtomicUsize::new(0),
            engine_log: Arc::new(Mutex::new(Vec::new())),
            device_log: Arc::new(Mutex::new(DeviceLog::default())),
            formats: Mutex::new(Vec::new()),
        }
    }

    pub fn engines_created(&self) -> usize {
        self.engines_created.load(Ordering::SeqCst)
    }

    pub fn bytes_written(&self) -> usize {
        self.device_log.lock().written.len()
    }
}

impl Backend for MockBackend {
    fn create_engine(&self) -> Result<Box<dyn SynthEngine>> {
        self.engines_created.fetch_add(1, Ordering::SeqCst);
        let mut engine = MockEngine::new(self.samples_per_char);
        engine.batch_delay = self.batch_delay;
        engine.log = Arc::clone(&self.engine_log);
        Ok(Box::new(engine))
    }

    fn open_device(&self, format: AudioFormat) -> Result<Box<dyn AudioDevice>> {
        self.formats.lock().push(format);
        if self.fail_open {
            return Err(ClipspeakError::Device("no such device".to_string()));
        }
        self.device_log.lock().opened += 1;
        Ok(Box::new(MockDevice {
            log: Arc::clone(&self.device_log),
            buffer_size: self.buffer_size,
            write_delay: self.write_delay,
            fail_writes: self.fail_writes,
            closed: false,
        }))
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
