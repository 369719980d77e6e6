//! clipspeak main entry point
//!
//! Reads text from the command line, standard input, or the clipboard and
//! speaks it. While speaking, console commands control playback.

use anyhow::{Context, Result};
use clipspeak::clipboard::{clipboard_text, text_or_fallback};
use clipspeak::config::Config;
use clipspeak::input::{parse_command, CommandHandler, HandlerAction};
use clipspeak::playback::{create_backend, PlaybackController};
use log::{debug, error, info};
use std::io::{self, BufRead, Read, Write};
use std::process;
use std::time::Duration;

/// How often to check whether reading has finished
const FINISH_POLL: Duration = Duration::from_millis(100);

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    if debug_mode {
        // Debug mode: write to clipspeak.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("clipspeak.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open clipspeak.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "clipspeak version {} starting (debug mode, logging to clipspeak.log)",
            clipspeak::VERSION
        );
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args()
        .skip(1)
        .filter(|arg| arg != "--debug" && arg != "-d")
        .collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("Usage: {} [--debug] [--stdin] [TEXT...]", clipspeak::APP_NAME);
        println!("Reads TEXT, standard input, or the clipboard aloud.");
        return Ok(());
    }

    let from_stdin = args.iter().any(|arg| arg == "--stdin");
    let words: Vec<&str> = args
        .iter()
        .filter(|arg| arg.as_str() != "--stdin")
        .map(String::as_str)
        .collect();

    let config = Config::load().context("Failed to load configuration")?;
    info!("Config loaded from {:?}", config.path());
    let fallback = config.fallback_text();

    let text = if from_stdin {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read standard input")?;
        text_or_fallback(&text, &fallback)
    } else if !words.is_empty() {
        text_or_fallback(&words.join(" "), &fallback)
    } else {
        clipboard_text(&fallback)
    };

    let backend = create_backend(config.player(), config.buffer_size())
        .context("No speech backend available")?;
    let controller = PlaybackController::with_settings(
        backend,
        config.playback_settings(),
        config.job_defaults(""),
    );

    let reload_fallback = fallback.clone();
    let mut handler = CommandHandler::new(
        controller,
        text,
        Box::new(move || clipboard_text(&reload_fallback)),
    );
    handler.start().context("Failed to start reading")?;

    if from_stdin {
        // Standard input held the text; there are no commands to read
        handler.finish(FINISH_POLL);
        return Ok(());
    }

    command_loop(&mut handler)
}

fn command_loop(handler: &mut CommandHandler) -> Result<()> {
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        stdout.flush()?;

        let line = match lines.next() {
            Some(line) => line.context("Failed to read command")?,
            None => {
                debug!("End of console input");
                handler.finish(FINISH_POLL);
                return Ok(());
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match handler.process(command, &mut stdout) {
            Ok(HandlerAction::Continue) => {}
            Ok(HandlerAction::Quit) => return Ok(()),
            Err(e) => {
                error!("{:?} failed: {}", command, e);
                println!("Error: {}", e);
            }
        }
    }
}
