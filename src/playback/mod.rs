//! Playback control
//!
//! A [`PlaybackController`] owns at most one [`PlaybackWorker`] thread at a
//! time. They share a [`TransportState`] for the playing/paused flags and the
//! audio length, and talk over a command channel for everything that needs
//! the worker's stream (position queries and seeks).

pub mod backend;
pub mod controller;
pub mod transport;
pub mod worker;

pub use backend::{create_backend, Backend, SystemBackend};
pub use controller::PlaybackController;
pub use transport::{Command, JobParams, TransportState};
pub use worker::{PlaybackWorker, WorkerState};

use std::time::Duration;

/// How long a paused worker sleeps between checks
pub const PAUSE_INTERVAL: Duration = Duration::from_millis(50);

/// How long a running worker waits for audio before checking again
pub const FRAME_WAIT: Duration = Duration::from_millis(100);

/// Timing of the worker loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSettings {
    pub pause_interval: Duration,
    pub frame_wait: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            pause_interval: PAUSE_INTERVAL,
            frame_wait: FRAME_WAIT,
        }
    }
}
