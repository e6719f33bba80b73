//! Text normalization: case folding, alphabet filtering, stop-word removal,
//! stemming and paragraph reflow.

use rust_stemmers::Stemmer;
use std::collections::HashSet;
use tracing::trace;

use super::Language;

/// Characters that end a sentence.
pub(crate) const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Default block length before a paragraph break is inserted.
pub const DEFAULT_REFLOW_THRESHOLD: usize = 500;

/// Language-aware text normalizer.
pub struct Normalizer {
    language: Language,
    stemmer: Stemmer,
    stop_words: HashSet<&'static str>,
    reflow_threshold: usize,
    keep_sentence_punctuation: bool,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("language", &self.language)
            .field("reflow_threshold", &self.reflow_threshold)
            .field("keep_sentence_punctuation", &self.keep_sentence_punctuation)
            .finish()
    }
}

impl Normalizer {
    /// Create a normalizer for a language with default settings.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            stemmer: Stemmer::create(language.stemmer_algorithm()),
            stop_words: language.stop_words().iter().copied().collect(),
            reflow_threshold: DEFAULT_REFLOW_THRESHOLD,
            keep_sentence_punctuation: false,
        }
    }

    /// Set the block length that triggers a paragraph break.
    pub fn with_reflow_threshold(mut self, threshold: usize) -> Self {
        self.reflow_threshold = threshold;
        self
    }

    /// Keep `.`, `!` and `?` so sentence boundaries survive normalization.
    pub fn with_sentence_punctuation(mut self, keep: bool) -> Self {
        self.keep_sentence_punctuation = keep;
        self
    }

    /// Normalize raw text into a cleaned, stemmed string.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let filtered: String = lowered
            .chars()
            .filter(|c| self.keeps(*c))
            .collect();

        let mut tokens: Vec<String> = Vec::new();
        for token in filtered.split_whitespace() {
            let word = token.trim_end_matches(&SENTENCE_TERMINATORS[..]);
            let tail = &token[word.len()..];

            if word.is_empty() || self.stop_words.contains(word) {
                // Stop words vanish but their sentence boundary must not.
                if !tail.is_empty() {
                    if let Some(last) = tokens.last_mut() {
                        last.push_str(tail);
                    }
                }
                continue;
            }

            let mut stemmed = self.stemmer.stem(word).into_owned();
            stemmed.push_str(tail);
            tokens.push(stemmed);
        }

        let joined = tokens.join(" ");
        let reflowed = reflow(&joined, self.reflow_threshold);
        let cleaned = collapse_blank_lines(&reflowed);
        trace!(
            input_len = text.len(),
            output_len = cleaned.len(),
            "Normalized text"
        );
        cleaned
    }

    fn keeps(&self, c: char) -> bool {
        c.is_whitespace()
            || self.language.is_letter(c)
            || (self.keep_sentence_punctuation && SENTENCE_TERMINATORS.contains(&c))
    }
}

/// Insert a blank line after the first sentence terminator (followed by
/// whitespace) once the current line has grown past `threshold` characters.
pub fn reflow(text: &str, threshold: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut block = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        if c == '\n' {
            block = 0;
            i += 1;
            continue;
        }
        block += 1;

        let next_is_space = chars.get(i + 1).is_some_and(|n| n.is_whitespace());
        if block > threshold && SENTENCE_TERMINATORS.contains(&c) && next_is_space {
            out.push_str("\n\n");
            block = 0;
            i += 2;
            continue;
        }
        i += 1;
    }

    out
}

/// Collapse any whitespace run containing two or more newlines into exactly
/// one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;

    while i < chars.len() {
        if chars[i] != '\n' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut last_newline = i;
        let mut j = i + 1;
        while j < chars.len() && chars[j].is_whitespace() {
            if chars[j] == '\n' {
                last_newline = j;
            }
            j += 1;
        }

        if last_newline > i {
            out.push_str("\n\n");
            i = last_newline + 1;
        } else {
            out.push('\n');
            i += 1;
        }
    }

    out
}
