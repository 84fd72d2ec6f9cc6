//! Text embedding providers.
//!
//! The store and recommender only ever see the [`Embedder`] trait; the
//! concrete backend is constructed once at startup and injected by `Arc`.

pub mod gemini;

pub use gemini::GeminiEmbedder;

/// Error type for embedding operations.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("GEMINI_API_KEY is missing; set it in the environment")]
    MissingApiKey,

    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding backend returned an unexpected payload: {0}")]
    BadResponse(String),

    #[error("embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Maps text to fixed-length vectors.
///
/// Two vectors are only comparable when produced by the same model, which is
/// why implementations expose a model identity hash for the snapshot header.
pub trait Embedder: Send + Sync {
    /// Embed a batch of documents. Order-preserving: output[i] is the
    /// embedding of `texts[i]`, and the output length equals the input length.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query string.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Fixed output dimensionality of this model.
    fn dimensions(&self) -> usize;

    /// SHA-256 of the model name, stored in snapshots so an index built with
    /// one model is never searched with another.
    fn model_id_hash(&self) -> [u8; 32];
}

/// Hash a model name for storage identification.
pub fn model_id_hash(model_name: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(model_name.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_hash_is_deterministic() {
        assert_eq!(
            model_id_hash("text-embedding-004"),
            model_id_hash("text-embedding-004")
        );
        assert_ne!(
            model_id_hash("text-embedding-004"),
            model_id_hash("embedding-001")
        );
    }
}
