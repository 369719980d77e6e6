//! Console input
//!
//! Commands are read one line at a time and run against the playback
//! controller by a [`CommandHandler`].

pub mod handler;
pub mod keymap;
pub mod menu;

pub use handler::{CommandHandler, HandlerAction, TextSource};
pub use keymap::{help_text, parse_command, ConsoleCommand};
pub use menu::MenuState;
