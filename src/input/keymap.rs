//! Console command names

/// Command typed at the clipspeak prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Start or resume reading; loads the current text when stopped
    Play,
    Pause,
    Stop,
    /// Move to a byte offset in the audio
    Seek(usize),
    /// Print the playback position
    Position,
    /// Print the synthesized audio length
    Length,
    /// Read the clipboard again
    Reload,
    /// List the engine's voices
    Voices,
    /// Show which transport controls are available
    Status,
    Help,
    Quit,
}

/// Command names and what they do, in help order
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("play, p", "start or resume reading"),
    ("pause, <space>", "pause reading"),
    ("stop, s", "stop reading"),
    ("seek <bytes>", "jump to a byte offset in the audio"),
    ("pos", "show the playback position"),
    ("len", "show how much audio has been synthesized"),
    ("reload, r", "read the clipboard again"),
    ("voices", "list available voices"),
    ("status", "show which controls are available"),
    ("help, h", "show this list"),
    ("quit, q", "stop and exit"),
];

/// Parse one line of console input
///
/// A line of only spaces is the pause key. Returns an error message for
/// unknown commands and bad arguments, and `Ok(None)` for an empty line.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() {
        return Ok(None);
    }
    if line.trim().is_empty() {
        return Ok(Some(ConsoleCommand::Pause));
    }

    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default().to_ascii_lowercase();
    let arg = words.next();

    let command = match name.as_str() {
        "play" | "p" => ConsoleCommand::Play,
        "pause" | "space" => ConsoleCommand::Pause,
        "stop" | "s" => ConsoleCommand::Stop,
        "seek" => {
            let arg = arg.ok_or_else(|| "seek needs a byte offset".to_string())?;
            let offset = arg
                .parse()
                .map_err(|_| format!("Not a byte offset: {}", arg))?;
            ConsoleCommand::Seek(offset)
        }
        "pos" | "position" => ConsoleCommand::Position,
        "len" | "length" => ConsoleCommand::Length,
        "reload" | "r" => ConsoleCommand::Reload,
        "voices" => ConsoleCommand::Voices,
        "status" => ConsoleCommand::Status,
        "help" | "h" | "?" => ConsoleCommand::Help,
        "quit" | "q" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(Some(command))
}

/// Help text listing every command
pub fn help_text() -> String {
    COMMAND_HELP
        .iter()
        .map(|(names, description)| format!("  {:<16}{}", names, description))
        .collect::<Vec<_>>()
        .join("\n")
}
