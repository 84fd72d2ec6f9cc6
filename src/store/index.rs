//! In-memory vector index with cosine similarity search.
//!
//! Entries keep their insertion order: metadata order must match embedding
//! order, and score ties resolve to the earliest-inserted entry.

use crate::jobs::Job;

/// One indexed item: the embedding, the literal text it was produced from,
/// and the full job as metadata.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub text: String,
    pub job: Job,
    pub embedding: Vec<f32>,
}

/// A single similarity hit, referencing an entry by insertion position.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot search with a zero-norm query vector")]
    ZeroNormQuery,
}

/// Insertion-ordered vector index over one corpus snapshot.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl VectorIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimensions,
        }
    }

    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            dimensions,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append an entry, preserving insertion order.
    pub fn push(&mut self, entry: IndexEntry) -> Result<(), IndexError> {
        if entry.embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: entry.embedding.len(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Top-k nearest neighbors by cosine similarity, highest score first.
    ///
    /// The sort is stable, so equal scores keep insertion order. Fewer than
    /// `top_k` entries means all of them are returned.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        let query_norm = l2_norm(query);
        if query_norm < f32::EPSILON {
            return Err(IndexError::ZeroNormQuery);
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| SearchHit {
                position,
                score: cosine_similarity(query, &entry.embedding, query_norm),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);

        Ok(hits)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity with a precomputed query norm. Zero-norm targets score 0.
fn cosine_similarity(query: &[f32], target: &[f32], query_norm: f32) -> f32 {
    let target_norm = l2_norm(target);
    if target_norm < f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(target.iter()).map(|(a, b)| a * b).sum();
    dot / (query_norm * target_norm)
}
