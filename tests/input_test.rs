//! Console command tests
//!
//! Parses command lines and runs them through a handler backed by the
//! in-memory engine and device.

mod common;

use clipspeak::input::{parse_command, CommandHandler, ConsoleCommand, HandlerAction, MenuState};
use clipspeak::playback::{Backend, PlaybackController};
use common::{wait_for, MockBackend};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn handler(backend: &Arc<MockBackend>, text: &str, reload: &'static str) -> CommandHandler {
    let backend: Arc<dyn Backend> = Arc::clone(backend) as Arc<dyn Backend>;
    CommandHandler::new(
        PlaybackController::new(backend),
        text.to_string(),
        Box::new(move || reload.to_string()),
    )
}

fn run(handler: &mut CommandHandler, command: ConsoleCommand) -> String {
    let mut out = Vec::new();
    let action = handler.process(command, &mut out).unwrap();
    assert_eq!(action, HandlerAction::Continue);
    String::from_utf8(out).unwrap()
}

#[test]
fn test_parse_commands() {
    assert_eq!(parse_command("play"), Ok(Some(ConsoleCommand::Play)));
    assert_eq!(parse_command("P\n"), Ok(Some(ConsoleCommand::Play)));
    assert_eq!(parse_command(" "), Ok(Some(ConsoleCommand::Pause)));
    assert_eq!(parse_command("stop"), Ok(Some(ConsoleCommand::Stop)));
    assert_eq!(parse_command("seek 4096"), Ok(Some(ConsoleCommand::Seek(4096))));
    assert_eq!(parse_command("pos"), Ok(Some(ConsoleCommand::Position)));
    assert_eq!(parse_command("len"), Ok(Some(ConsoleCommand::Length)));
    assert_eq!(parse_command("r"), Ok(Some(ConsoleCommand::Reload)));
    assert_eq!(parse_command("q"), Ok(Some(ConsoleCommand::Quit)));
    assert_eq!(parse_command(""), Ok(None));
}

#[test]
fn test_parse_errors() {
    assert!(parse_command("seek").is_err());
    assert!(parse_command("seek far").is_err());
    assert!(parse_command("rewind").is_err());
}

#[test]
fn test_menu_follows_transport() {
    let backend = Arc::new(MockBackend::new(1000));
    let mut handler = handler(&backend, "Some text to read. And more.", "Reloaded.");

    assert_eq!(handler.menu_state(), MenuState::from_transport(false, false));

    handler.start().unwrap();
    let state = handler.menu_state();
    assert!(!state.play && state.pause && state.stop);

    run(&mut handler, ConsoleCommand::Pause);
    let state = handler.menu_state();
    assert!(state.play && !state.pause && state.stop);

    run(&mut handler, ConsoleCommand::Stop);
    let state = handler.menu_state();
    assert!(state.play && !state.pause && !state.stop);
}

#[test]
fn test_play_reloads_text_when_stopped() {
    let backend = Arc::new(MockBackend::new(10));
    let mut handler = handler(&backend, "Short.", "Reloaded.");

    run(&mut handler, ConsoleCommand::Play);
    assert!(wait_for(TIMEOUT, || !handler.controller().is_playing()));
    run(&mut handler, ConsoleCommand::Play);
    assert!(wait_for(TIMEOUT, || !handler.controller().is_playing()));

    assert_eq!(backend.engines_created(), 2);
    assert_eq!(handler.controller().text(), "Short.");
}

#[test]
fn test_reload_replaces_text() {
    let backend = Arc::new(MockBackend::new(10));
    let mut handler = handler(&backend, "Old.", "Reloaded.");

    let out = run(&mut handler, ConsoleCommand::Reload);
    assert!(out.contains("9 bytes"));
    assert_eq!(handler.text(), "Reloaded.");
    assert_eq!(handler.controller().text(), "Reloaded.");
    handler.controller_mut().stop();
}

#[test]
fn test_position_when_stopped() {
    let backend = Arc::new(MockBackend::new(10));
    let mut handler = handler(&backend, "Text.", "Text.");

    assert_eq!(run(&mut handler, ConsoleCommand::Position), "Nothing is playing\n");
    assert_eq!(run(&mut handler, ConsoleCommand::Seek(10)), "Nothing is playing\n");
    assert_eq!(run(&mut handler, ConsoleCommand::Length), "0\n");
}

#[test]
fn test_seek_and_position() {
    let backend = Arc::new(MockBackend::new(10));
    let mut handler = handler(&backend, "Seekable.", "Seekable.");

    handler.controller_mut().read("Seekable.").unwrap();
    assert!(wait_for(TIMEOUT, || handler.controller().length() == 180));

    run(&mut handler, ConsoleCommand::Seek(60));
    assert_eq!(run(&mut handler, ConsoleCommand::Position), "60\n");
    handler.controller_mut().stop();
}

#[test]
fn test_voices() {
    let backend = Arc::new(MockBackend::new(10));
    let mut handler = handler(&backend, "Text.", "Text.");

    let out = run(&mut handler, ConsoleCommand::Voices);
    assert!(out.starts_with("Language"));
    assert!(out.contains("German"));
}

#[test]
fn test_quit_stops_playback() {
    let backend = Arc::new(MockBackend::new(1000));
    let mut handler = handler(&backend, "Long enough to still be playing. Really.", "x");
    handler.start().unwrap();

    let mut out = Vec::new();
    let action = handler.process(ConsoleCommand::Quit, &mut out).unwrap();
    assert_eq!(action, HandlerAction::Quit);
    assert!(!handler.controller().is_playing());
}

#[test]
fn test_finish_stops_paused_reading() {
    let backend = Arc::new(MockBackend::new(1000));
    let mut handler = handler(&backend, "Long enough to still be playing. Really.", "x");
    handler.start().unwrap();
    run(&mut handler, ConsoleCommand::Pause);

    handler.finish(Duration::from_millis(5));
    assert!(!handler.controller().is_playing());
    assert!(!handler.controller().is_paused());
}

#[test]
fn test_finish_waits_for_reading_to_end() {
    let backend = Arc::new(MockBackend::new(10));
    let mut handler = handler(&backend, "Short.", "x");
    handler.start().unwrap();

    handler.finish(Duration::from_millis(5));
    assert!(!handler.controller().is_playing());
    assert_eq!(backend.bytes_written(), 512);
}
