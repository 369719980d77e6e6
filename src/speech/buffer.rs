//! Sentence buffer for splitting text into speakable chunks

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that end a sentence unless configured otherwise
pub const DEFAULT_SENTENCE_ENDINGS: &str = ".!?";

/// Number of chunks handed out per read when reading one at a time
pub const BUFFER_CHUNKS: usize = 1;

static DEFAULT_SENTENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&sentence_pattern(DEFAULT_SENTENCE_ENDINGS))
        .expect("default sentence pattern is valid")
});

/// Lazy match of anything up to and including one of `endings`
fn sentence_pattern(endings: &str) -> String {
    format!("(?si).*?[{}]", regex::escape(endings))
}

/// Text split into sentences (or lines) that are handed out in order
///
/// Sentences are the successive matches of "anything up to a sentence
/// ending", newlines included. Text without any sentence ending is split
/// into lines instead.
pub struct SentenceBuffer {
    text: String,
    chunks: Vec<String>,

    /// Text after the last sentence ending
    tail: String,

    index: usize,
}

impl SentenceBuffer {
    /// Split `text` using the default sentence endings (`.!?`)
    pub fn from_text(text: &str) -> Self {
        Self::new(text, DEFAULT_SENTENCE_ENDINGS)
    }

    /// Split `text` into sentences ending in any character of `endings`
    pub fn new(text: &str, endings: &str) -> Self {
        let (sentences, end) = if endings.is_empty() {
            (Vec::new(), 0)
        } else if endings == DEFAULT_SENTENCE_ENDINGS {
            find_sentences(&DEFAULT_SENTENCE_REGEX, text)
        } else {
            match Regex::new(&sentence_pattern(endings)) {
                Ok(re) => find_sentences(&re, text),
                Err(e) => {
                    debug!("Unusable sentence endings {:?}: {}", endings, e);
                    (Vec::new(), 0)
                }
            }
        };

        let (chunks, tail) = if !sentences.is_empty() {
            (sentences, text[end..].trim().to_string())
        } else {
            (split_lines(text), String::new())
        };

        debug!("Split {} bytes of text into {} chunks", text.len(), chunks.len());

        Self {
            text: text.to_string(),
            chunks,
            tail,
            index: 0,
        }
    }

    /// Take up to `count` chunks as one line of text
    ///
    /// Chunks are joined by a single space and line breaks become spaces.
    /// The cursor moves `count` chunks forward while any chunks remain.
    pub fn take(&mut self, count: usize) -> String {
        let start = self.index.min(self.chunks.len());
        let end = start.saturating_add(count).min(self.chunks.len());
        let text = join_chunks(&self.chunks[start..end]);

        if self.remaining() > 0 {
            self.index = start.saturating_add(count).min(self.chunks.len());
        }

        text
    }

    /// Take every remaining chunk
    pub fn take_all(&mut self) -> String {
        let start = self.index.min(self.chunks.len());
        self.index = self.chunks.len();
        join_chunks(&self.chunks[start..])
    }

    /// Chunk count, or the byte length of the text when it has no chunks
    pub fn len(&self) -> usize {
        if self.chunks.is_empty() {
            self.text.len()
        } else {
            self.chunks.len()
        }
    }

    /// Check if the buffer holds no text at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunks not yet taken
    pub fn remaining(&self) -> usize {
        self.chunks.len().saturating_sub(self.index)
    }

    /// Check if every chunk has been taken
    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// All chunks, taken or not
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// The text being split
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Trimmed text following the last sentence ending
    ///
    /// Not part of any chunk. Empty when the text was split into lines.
    pub fn remainder(&self) -> &str {
        &self.tail
    }
}

/// Every sentence in `text` and the byte offset just past the last one
fn find_sentences(re: &Regex, text: &str) -> (Vec<String>, usize) {
    let mut end = 0;
    let sentences = re
        .find_iter(text)
        .map(|m| {
            end = m.end();
            m.as_str().to_string()
        })
        .collect();
    (sentences, end)
}

/// Split on every line boundary, treating `\r\n` as one
///
/// A line break at the very end does not start another line.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(text[start..i].to_string());
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                start += 1;
            }
        }
    }

    if start < text.len() {
        lines.push(text[start..].to_string());
    }
    lines
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn join_chunks(chunks: &[String]) -> String {
    chunks.join(" ").replace(['\n', '\r'], " ")
}
