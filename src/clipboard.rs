//! Clipboard integration

use crate::{ClipspeakError, Result};
use arboard::Clipboard;
use log::debug;

/// Spoken when there is no text to read
pub const FALLBACK_TEXT: &str = "The clipboard contains no text to read.";

/// Get text from system clipboard
pub fn get_from_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| ClipspeakError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    clipboard
        .get_text()
        .map_err(|e| ClipspeakError::Clipboard(format!("Failed to get from clipboard: {}", e)))
}

/// `text` unless it is blank, else `fallback`
pub fn text_or_fallback(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

/// Clipboard text, or `fallback` when it is empty or unreadable
pub fn clipboard_text(fallback: &str) -> String {
    match get_from_clipboard() {
        Ok(text) => text_or_fallback(&text, fallback),
        Err(e) => {
            debug!("{}", e);
            fallback.to_string()
        }
    }
}
