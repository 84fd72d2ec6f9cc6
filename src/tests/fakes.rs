//! Deterministic fakes for offline tests: no network, no credentials.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::embedder::{model_id_hash, Embedder, EmbeddingError};
use crate::jobs::Job;
use crate::providers::{JobProvider, ProviderError, SearchParams};

pub const FAKE_DIMENSIONS: usize = 32;

/// Bag-of-words embedder: each token hashes into one of the dimensions.
///
/// Identical texts map to identical vectors (cosine 1.0), and texts sharing
/// tokens score higher than unrelated ones — enough signal for ranking tests.
pub struct FakeEmbedder;

impl FakeEmbedder {
    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; FAKE_DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % FAKE_DIMENSIONS;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for FakeEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::vectorize(text))
    }

    fn dimensions(&self) -> usize {
        FAKE_DIMENSIONS
    }

    fn model_id_hash(&self) -> [u8; 32] {
        model_id_hash("fake-embedder")
    }
}

/// A provider that always fails, for failure-isolation tests.
pub struct FailingProvider {
    pub priority: u8,
}

impl JobProvider for FailingProvider {
    fn fetch(&self, _query: &str, _params: &SearchParams) -> Result<Vec<Job>, ProviderError> {
        Err(ProviderError::BadResponse("simulated outage".to_string()))
    }

    fn name(&self) -> &'static str {
        "Failing"
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}

/// A provider that returns a fixed set of jobs.
pub struct StaticProvider {
    pub name: &'static str,
    pub priority: u8,
    pub jobs: Vec<Job>,
}

impl JobProvider for StaticProvider {
    fn fetch(&self, _query: &str, _params: &SearchParams) -> Result<Vec<Job>, ProviderError> {
        Ok(self.jobs.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}

/// Build a storable job with the given identity and description.
pub fn job(title: &str, company: &str, location: &str, description: &str, source: &str) -> Job {
    use crate::jobs::RawJob;
    Job::normalized(
        RawJob {
            title: Some(title.to_string()),
            company: Some(company.to_string()),
            location: Some(location.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        },
        source,
    )
}
