//! Sentence splitting tests

use clipspeak::speech::buffer::{SentenceBuffer, BUFFER_CHUNKS};
use regex::Regex;

#[test]
fn test_two_sentences() {
    let buffer = SentenceBuffer::from_text("Hello world. How are you?");
    assert_eq!(buffer.chunks(), &["Hello world.", " How are you?"]);
}

#[test]
fn test_no_terminators() {
    let buffer = SentenceBuffer::from_text("no terminators here");
    assert_eq!(buffer.chunks(), &["no terminators here"]);
}

#[test]
fn test_chunk_count_matches_sentence_pattern() {
    let pattern = Regex::new(r"(?si).*?[.!?]").unwrap();
    let samples = [
        "One. Two! Three?",
        "Wait... what?!",
        "Line one\nline two. And\r\nmore!",
        "Trailing text. without an end",
        "?!.",
    ];

    for text in samples {
        let buffer = SentenceBuffer::from_text(text);
        assert_eq!(
            buffer.len(),
            pattern.find_iter(text).count(),
            "chunk count for {:?}",
            text
        );
    }
}

#[test]
fn test_lines_without_terminators() {
    let buffer = SentenceBuffer::from_text("first line\nsecond line\n");
    assert_eq!(buffer.chunks(), &["first line", "second line"]);
}

#[test]
fn test_empty_text() {
    let mut buffer = SentenceBuffer::from_text("");
    assert!(buffer.chunks().is_empty());
    assert!(buffer.is_empty());
    assert_eq!(buffer.take_all(), "");
}

#[test]
fn test_take_one_at_a_time() {
    let mut buffer = SentenceBuffer::from_text("First.\nSecond! Third?");
    let mut taken = Vec::new();
    while !buffer.is_finished() {
        taken.push(buffer.take(BUFFER_CHUNKS));
    }
    assert_eq!(taken, vec!["First.", " Second!", " Third?"]);
}

#[test]
fn test_take_collapses_newlines() {
    let mut buffer = SentenceBuffer::from_text("Across\ntwo lines. Done.");
    assert_eq!(buffer.take(2), "Across two lines.  Done.");
}
