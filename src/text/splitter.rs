//! Fixed-size recursive character splitter.
//!
//! Splits on the coarsest separator present in the text (paragraphs, lines,
//! words, then characters), recursing into pieces that are still too long,
//! and merges small pieces back together with a bounded overlap.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Separator hierarchy, coarsest first. The empty separator splits into
/// individual characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive splitter with a hard chunk-size bound.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter. `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Target chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into chunks of at most `chunk_size` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate.as_str();
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    /// Greedily pack pieces into chunks, keeping a tail of at most
    /// `chunk_overlap` characters as the head of the next chunk.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);

                loop {
                    let joiner = if window.is_empty() { 0 } else { sep_len };
                    let overflows = total > 0 && total + len + joiner > self.chunk_size;
                    if total <= self.chunk_overlap && !overflows {
                        break;
                    }
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    let dropped_joiner = if window.is_empty() { 0 } else { sep_len };
                    total -= char_len(front) + dropped_joiner;
                }
            }

            let joiner = if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
            total += len + joiner;
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(total_chars: usize) -> String {
        let mut text = String::new();
        let mut i = 0;
        while text.len() < total_chars {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&format!("w{:04}", i));
            i += 1;
        }
        text.truncate(total_chars);
        text
    }

    fn shared_overlap(prev: &str, next: &str) -> usize {
        let max = prev.len().min(next.len());
        (1..=max)
            .rev()
            .find(|&n| prev.ends_with(&next[..n]))
            .unwrap_or(0)
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(RecursiveSplitter::new(100, 100).is_err());
        assert!(RecursiveSplitter::new(0, 0).is_err());
        assert!(RecursiveSplitter::new(100, 20).is_ok());
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let splitter = RecursiveSplitter::new(1000, 200).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n ").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveSplitter::new(1000, 200).unwrap();
        assert_eq!(splitter.split("hola mundo"), vec!["hola mundo".to_string()]);
    }

    #[test]
    fn test_2500_chars_bounded_chunks_with_overlap() {
        let text = numbered_words(2500);
        assert_eq!(text.chars().count(), 2500);

        let splitter = RecursiveSplitter::new(1000, 200).unwrap();
        let chunks = splitter.split(&text);

        assert!(chunks.len() >= 3, "expected at least 3 chunks, got {}", chunks.len());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let overlap = shared_overlap(&pair[0], &pair[1]);
            assert!(overlap > 0, "consecutive chunks should overlap");
            assert!(overlap <= 200, "overlap {} exceeds 200", overlap);
        }
        assert!(text.starts_with(chunks[0].as_str()));
        assert!(text.ends_with(chunks[chunks.len() - 1].as_str()));
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let para_a = "a".repeat(40);
        let para_b = "b".repeat(40);
        let text = format!("{}\n\n{}", para_a, para_b);
        let splitter = RecursiveSplitter::new(50, 10).unwrap();
        let chunks = splitter.split(&text);
        assert_eq!(chunks, vec![para_a, para_b]);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(250);
        let splitter = RecursiveSplitter::new(100, 20).unwrap();
        let chunks = splitter.split(&text);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let text = "ñandú ".repeat(50);
        let splitter = RecursiveSplitter::new(60, 12).unwrap();
        for chunk in splitter.split(&text) {
            assert!(chunk.chars().count() <= 60);
        }
    }
}
