//! Sentence splitting and sentence-aware overlap packing.

use super::normalize::SENTENCE_TERMINATORS;
use super::splitter::char_len;

/// Split text into sentences ending at `.`, `!` or `?` followed by
/// whitespace (or end of input). Sentences are trimmed; empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !SENTENCE_TERMINATORS.contains(&c) {
            continue;
        }
        let at_boundary = match iter.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if at_boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Greedily pack sentences into chunks of roughly `max_chars` characters.
///
/// When the next sentence does not fit, the current chunk is sealed and the
/// next one starts with the last `ceil(overlap / 10)` words of the sealed chunk.
/// A single sentence longer than `max_chars` becomes its own oversized chunk.
pub fn pack_sentences(sentences: &[&str], max_chars: usize, overlap: usize) -> Vec<String> {
    let carry_words = overlap.div_ceil(10);
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for sentence in sentences {
        if !buffer.is_empty() && char_len(&buffer) + char_len(sentence) > max_chars {
            let sealed = buffer.trim().to_string();
            let words: Vec<&str> = sealed.split_whitespace().collect();
            let carried = words[words.len().saturating_sub(carry_words)..].join(" ");

            buffer.clear();
            if !carried.is_empty() {
                buffer.push_str(&carried);
                buffer.push(' ');
            }
            if !sealed.is_empty() {
                chunks.push(sealed);
            }
        }
        buffer.push_str(sentence);
        buffer.push(' ');
    }

    let last = buffer.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }
    chunks
}
