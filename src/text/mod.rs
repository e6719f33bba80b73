//! Text preparation for embedding.
//!
//! Normalizes raw text (case folding, alphabet filtering, stop words,
//! stemming, paragraph reflow) and splits it into bounded chunks using one of
//! three strategies:
//!
//! - **Recursive**: separator hierarchy with a hard size bound and a fixed
//!   character overlap ([`RecursiveSplitter`]).
//! - **Sentence**: greedy sentence packing, carrying the last words of each
//!   sealed chunk into the next ([`pack_sentences`]).
//! - **Semantic**: cuts where embedding distance between neighbouring
//!   sentences spikes ([`SemanticChunker`]).

mod normalize;
mod semantic;
mod sentence;
mod splitter;
mod stopwords;

pub use normalize::{collapse_blank_lines, reflow, Normalizer, DEFAULT_REFLOW_THRESHOLD};
pub use semantic::{percentile, SemanticChunker, DEFAULT_BREAKPOINT_PERCENTILE};
pub use sentence::{pack_sentences, split_sentences};
pub use splitter::{RecursiveSplitter, DEFAULT_SEPARATORS};

use serde::{Deserialize, Serialize};

use crate::config::TextConfig;
use crate::error::{Error, Result};
use crate::search::Embedder;

/// Natural language used for stop words and stemming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Spanish (default).
    #[default]
    Spanish,
    /// English.
    English,
}

impl Language {
    /// Letters outside `a-z` that belong to the alphabet.
    pub fn accented_letters(&self) -> &'static str {
        match self {
            Language::Spanish => "áéíóúñü",
            Language::English => "",
        }
    }

    /// True when `c` (already lowercased) is part of the alphabet.
    pub fn is_letter(&self, c: char) -> bool {
        c.is_ascii_lowercase() || self.accented_letters().contains(c)
    }

    /// Stop-word list.
    pub fn stop_words(&self) -> &'static [&'static str] {
        match self {
            Language::Spanish => stopwords::SPANISH,
            Language::English => stopwords::ENGLISH,
        }
    }

    /// Snowball stemming algorithm.
    pub fn stemmer_algorithm(&self) -> rust_stemmers::Algorithm {
        match self {
            Language::Spanish => rust_stemmers::Algorithm::Spanish,
            Language::English => rust_stemmers::Algorithm::English,
        }
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spanish" | "es" => Ok(Language::Spanish),
            "english" | "en" => Ok(Language::English),
            other => Err(Error::Config(format!("Unsupported language '{}'", other))),
        }
    }
}

/// How [`TextPreprocessor::split`] cuts text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    /// Normalize, then split recursively with overlap.
    #[default]
    Recursive,
    /// Split recursively without normalization.
    Raw,
    /// Pack normalized sentences with word overlap.
    Sentence,
    /// Cut where embedding distance between sentences spikes.
    Semantic,
}

impl ChunkStrategy {
    pub fn needs_embedder(&self) -> bool {
        matches!(self, ChunkStrategy::Semantic)
    }
}

/// A bounded text segment, numbered in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the chunk sequence.
    pub index: usize,
    /// Chunk text.
    pub text: String,
}

impl Chunk {
    /// Number the given texts in order.
    pub fn sequence(texts: Vec<String>) -> Vec<Chunk> {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Normalization plus the three chunking strategies, configured once.
#[derive(Debug)]
pub struct TextPreprocessor {
    normalizer: Normalizer,
    sentence_normalizer: Normalizer,
    splitter: RecursiveSplitter,
    semantic: SemanticChunker,
}

impl TextPreprocessor {
    /// Build from text configuration.
    pub fn new(config: &TextConfig) -> Result<Self> {
        let splitter = RecursiveSplitter::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            normalizer: Normalizer::new(config.language)
                .with_reflow_threshold(config.reflow_threshold),
            sentence_normalizer: Normalizer::new(config.language)
                .with_reflow_threshold(config.reflow_threshold)
                .with_sentence_punctuation(true),
            splitter,
            semantic: SemanticChunker::new(config.semantic_percentile),
        })
    }

    /// Split `text` with `strategy`, sized by the configured chunk size and
    /// overlap. Input with nothing to split yields an empty list.
    pub async fn split(
        &self,
        text: &str,
        strategy: ChunkStrategy,
        embedder: Option<&dyn Embedder>,
    ) -> Result<Vec<Chunk>> {
        match strategy {
            ChunkStrategy::Recursive => Ok(self.chunks(text)),
            ChunkStrategy::Raw => Ok(self.raw_chunks(text)),
            ChunkStrategy::Sentence => Ok(self.sentence_chunks(
                text,
                self.splitter.chunk_size(),
                self.splitter.chunk_overlap(),
            )),
            ChunkStrategy::Semantic => {
                let embedder = embedder.ok_or_else(|| {
                    Error::Config("semantic chunking requires an embedder".to_string())
                })?;
                self.semantic_chunks(text, embedder).await
            }
        }
    }

    /// Normalized form of `text`.
    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Normalize, then split with the recursive splitter.
    pub fn chunks(&self, text: &str) -> Vec<Chunk> {
        let cleaned = self.normalizer.normalize(text);
        Chunk::sequence(self.splitter.split(&cleaned))
    }

    /// Split raw text with the recursive splitter, no normalization.
    pub fn raw_chunks(&self, text: &str) -> Vec<Chunk> {
        Chunk::sequence(self.splitter.split(text))
    }

    /// Normalize (keeping sentence punctuation), then pack sentences into
    /// chunks of about `max_chars`, carrying `ceil(overlap / 10)` words forward.
    pub fn sentence_chunks(&self, text: &str, max_chars: usize, overlap: usize) -> Vec<Chunk> {
        let cleaned = self.sentence_normalizer.normalize(text);
        let sentences = split_sentences(&cleaned);
        Chunk::sequence(pack_sentences(&sentences, max_chars, overlap))
    }

    /// Split raw text where meaning shifts, using `embedder` for sentence
    /// windows.
    pub async fn semantic_chunks(&self, text: &str, embedder: &dyn Embedder) -> Result<Vec<Chunk>> {
        let texts = self.semantic.split(text, embedder).await?;
        Ok(Chunk::sequence(texts))
    }
}
