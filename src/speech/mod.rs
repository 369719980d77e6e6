//! Speech synthesis system

pub mod backends;
pub mod buffer;
pub mod stream;
pub mod synth;

pub use buffer::SentenceBuffer;
pub use stream::{SynthesisStream, Wake};
pub use synth::{
    format_voice_table, CallbackAction, FrameCallback, Parameter, SpeechParams, SynthEngine,
    VoiceInfo,
};
