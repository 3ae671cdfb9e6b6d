//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Longest text sent as one embedding input, in characters.
///
/// Roughly 6000 tokens of English, below the 8191-token input limit of the
/// OpenAI embedding models.
pub const MAX_INPUT_CHARS: usize = 24_000;

/// Trait for embedding generation.
///
/// The same embedder must be used for the article corpus and for queries so
/// both live in one vector space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Cut `text` to at most [`MAX_INPUT_CHARS`] characters.
pub fn truncate_input(text: &str) -> &str {
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_input() {
        assert_eq!(truncate_input("short"), "short");

        let long = "é".repeat(MAX_INPUT_CHARS + 10);
        let cut = truncate_input(&long);
        assert_eq!(cut.chars().count(), MAX_INPUT_CHARS);

        let exact = "a".repeat(MAX_INPUT_CHARS);
        assert_eq!(truncate_input(&exact).len(), MAX_INPUT_CHARS);
    }
}
