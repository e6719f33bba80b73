//! Embedding-similarity chunking.

use tracing::debug;

use super::sentence::split_sentences;
use crate::error::{Error, Result};
use crate::search::{cosine_similarity, Embedder};

/// Distance percentile above which a boundary is cut.
pub const DEFAULT_BREAKPOINT_PERCENTILE: f32 = 95.0;

/// Neighbouring sentences on each side folded into a window.
const WINDOW_RADIUS: usize = 1;

/// Splits text where the cosine distance between neighbouring sentence
/// windows exceeds a percentile of all such distances.
#[derive(Debug, Clone)]
pub struct SemanticChunker {
    percentile: f32,
}

impl Default for SemanticChunker {
    fn default() -> Self {
        Self::new(DEFAULT_BREAKPOINT_PERCENTILE)
    }
}

impl SemanticChunker {
    /// Create a chunker cutting above the given percentile (0..=100).
    pub fn new(percentile: f32) -> Self {
        Self {
            percentile: percentile.clamp(0.0, 100.0),
        }
    }

    /// Split `text` into meaning-coherent chunks.
    pub async fn split(&self, text: &str, embedder: &dyn Embedder) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.len() <= 1 {
            return Ok(sentences.into_iter().map(str::to_string).collect());
        }

        let windows: Vec<String> = (0..sentences.len())
            .map(|i| {
                let start = i.saturating_sub(WINDOW_RADIUS);
                let end = (i + WINDOW_RADIUS + 1).min(sentences.len());
                sentences[start..end].join(" ")
            })
            .collect();

        let embeddings = embedder.embed_documents(&windows).await?;
        if embeddings.len() != windows.len() {
            return Err(Error::Embedding(format!(
                "Expected {} sentence embeddings, got {}",
                windows.len(),
                embeddings.len()
            )));
        }

        let distances: Vec<f32> = embeddings
            .windows(2)
            .map(|pair| 1.0 - cosine_similarity(&pair[0], &pair[1]))
            .collect();
        let threshold = percentile(&distances, self.percentile);
        debug!(
            sentences = sentences.len(),
            threshold, "Computed semantic breakpoint threshold"
        );

        let mut chunks = Vec::new();
        let mut start = 0usize;
        for (i, distance) in distances.iter().enumerate() {
            if *distance > threshold {
                chunks.push(sentences[start..=i].join(" "));
                start = i + 1;
            }
        }
        if start < sentences.len() {
            chunks.push(sentences[start..].join(" "));
        }
        Ok(chunks)
    }
}

/// Percentile with linear interpolation between closest ranks.
/// Returns 0.0 for an empty slice.
pub fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
