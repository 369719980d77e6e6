//! Which transport controls make sense right now

use std::fmt;

/// Enabled state of the Play, Pause and Stop controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub play: bool,
    pub pause: bool,
    pub stop: bool,
}

impl MenuState {
    /// Controls for the given transport flags
    pub fn from_transport(playing: bool, paused: bool) -> Self {
        if playing && !paused {
            Self {
                play: false,
                pause: true,
                stop: true,
            }
        } else if paused {
            Self {
                play: true,
                pause: false,
                stop: true,
            }
        } else {
            Self {
                play: true,
                pause: false,
                stop: false,
            }
        }
    }
}

impl fmt::Display for MenuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |enabled: bool| if enabled { "on" } else { "off" };
        write!(
            f,
            "Play: {}  Pause: {}  Stop: {}",
            mark(self.play),
            mark(self.pause),
            mark(self.stop)
        )
    }
}
