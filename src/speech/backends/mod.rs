//! Concrete speech engines

// espeak-ng driven through its command line
pub mod espeak;

pub use espeak::EspeakEngine;
