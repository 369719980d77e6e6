//! Runs console commands against a playback controller

use super::keymap::{help_text, ConsoleCommand};
use super::menu::MenuState;
use crate::playback::PlaybackController;
use crate::speech::format_voice_table;
use crate::{ClipspeakError, Result};
use log::{debug, warn};
use std::io::Write;
use std::thread;
use std::time::Duration;

/// What the console loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    /// Keep reading commands
    Continue,
    /// Leave the console loop
    Quit,
}

/// Fetches fresh text for `reload`
pub type TextSource = Box<dyn FnMut() -> String>;

/// Console command handler
///
/// Holds the text to read, which `reload` replaces, and plays it through
/// the controller. `play` loads the text again once the previous reading
/// has stopped.
pub struct CommandHandler {
    controller: PlaybackController,
    text: String,
    source: TextSource,
}

impl CommandHandler {
    /// Create a handler that reads `text` and fetches new text from `source`
    pub fn new(controller: PlaybackController, text: String, source: TextSource) -> Self {
        Self {
            controller,
            text,
            source,
        }
    }

    /// Load the current text and start reading it
    pub fn start(&mut self) -> Result<()> {
        self.controller.read(&self.text)?;
        self.controller.play()
    }

    /// Run one command, writing any output to `out`
    pub fn process(&mut self, command: ConsoleCommand, out: &mut dyn Write) -> Result<HandlerAction> {
        debug!("Console command {:?}", command);

        match command {
            ConsoleCommand::Play => {
                if !self.controller.is_playing() {
                    self.controller.read(&self.text)?;
                }
                self.controller.play()?;
            }
            ConsoleCommand::Pause => self.controller.pause(),
            ConsoleCommand::Stop => self.controller.stop(),
            ConsoleCommand::Seek(offset) => match self.controller.set_position(offset) {
                Ok(()) => {}
                Err(ClipspeakError::NotPlaying) => writeln!(out, "Nothing is playing")?,
                Err(e) => return Err(e),
            },
            ConsoleCommand::Position => match self.controller.position() {
                Ok(position) => writeln!(out, "{}", position)?,
                Err(ClipspeakError::NotPlaying) => writeln!(out, "Nothing is playing")?,
                Err(e) => return Err(e),
            },
            ConsoleCommand::Length => writeln!(out, "{}", self.controller.length())?,
            ConsoleCommand::Reload => {
                self.text = (self.source)();
                writeln!(out, "Loaded {} bytes of text", self.text.len())?;
                if !self.controller.is_playing() {
                    self.start()?;
                }
            }
            ConsoleCommand::Voices => match self.controller.list_voices() {
                Ok(voices) => write!(out, "{}", format_voice_table(&voices))?,
                Err(e) => {
                    warn!("Failed to list voices: {}", e);
                    writeln!(out, "Voices unavailable: {}", e)?;
                }
            },
            ConsoleCommand::Status => writeln!(out, "{}", self.menu_state())?,
            ConsoleCommand::Help => writeln!(out, "{}", help_text())?,
            ConsoleCommand::Quit => {
                self.controller.stop();
                return Ok(HandlerAction::Quit);
            }
        }

        Ok(HandlerAction::Continue)
    }

    /// Wait for reading to end once no more commands will arrive
    ///
    /// A paused job can never finish on its own, so it is stopped instead.
    pub fn finish(&mut self, poll: Duration) {
        while self.controller.is_playing() {
            if self.controller.is_paused() {
                debug!("Stopping paused reading at end of input");
                self.controller.stop();
                break;
            }
            thread::sleep(poll);
        }
    }

    /// Which transport controls are available
    pub fn menu_state(&self) -> MenuState {
        MenuState::from_transport(self.controller.is_playing(), self.controller.is_paused())
    }

    /// Text `play` will read
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The controller commands run against
    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Mutable access to the controller
    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }
}
