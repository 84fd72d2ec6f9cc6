//! Recommender service: the caller-facing surface over the vector store.
//!
//! Validates input before any index access and maps stored metadata into
//! display-ready recommendations.

use serde::Serialize;

use crate::jobs::Job;
use crate::store::{StoreError, VectorStore};

/// Sentinel shown when a stored snapshot predates a metadata field.
const UNKNOWN: &str = "Unknown";

/// Errors surfaced to callers of the recommender.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One ranked result, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub via: String,
    pub description: String,
    pub score: f32,
}

impl Recommendation {
    fn from_scored(job: Job, score: f32) -> Self {
        Self {
            title: or_unknown(job.title),
            company: or_unknown(job.company),
            location: or_unknown(job.location),
            link: job.url,
            via: job.via,
            description: job.description,
            score,
        }
    }
}

fn or_unknown(value: String) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}

pub struct Recommender {
    store: VectorStore,
}

impl Recommender {
    pub fn new(store: VectorStore) -> Self {
        Self { store }
    }

    /// Embed and index `jobs`, replacing any prior corpus.
    ///
    /// The input must be non-empty and every job must carry a description;
    /// violations surface as [`RecommendError::Schema`] citing the field.
    pub fn ingest(&self, jobs: &[Job]) -> Result<usize, RecommendError> {
        if jobs.is_empty() {
            return Err(RecommendError::Schema("no jobs to ingest".to_string()));
        }
        if let Some(position) = jobs.iter().position(|j| j.description.trim().is_empty()) {
            return Err(RecommendError::Schema(format!(
                "job at position {position} is missing 'description'"
            )));
        }
        Ok(self.store.upsert(jobs)?)
    }

    /// Top-k jobs for a free-text query, highest similarity first.
    ///
    /// The query is trimmed and validated before any index access: an empty
    /// query or `top_k == 0` is [`RecommendError::InvalidInput`].
    pub fn recommend(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecommendError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }
        if top_k == 0 {
            return Err(RecommendError::InvalidInput(
                "top_k must be at least 1".to_string(),
            ));
        }

        let scored = self.store.query(query, top_k)?;
        Ok(scored
            .into_iter()
            .map(|(job, score)| Recommendation::from_scored(job, score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_unknown() {
        assert_eq!(or_unknown(String::new()), "Unknown");
        assert_eq!(or_unknown("  ".to_string()), "Unknown");
        assert_eq!(or_unknown("Acme".to_string()), "Acme");
    }

    #[test]
    fn test_recommendation_fills_missing_metadata() {
        let job = Job {
            description: "some role".to_string(),
            url: "https://acme.com/1".to_string(),
            ..Default::default()
        };
        let rec = Recommendation::from_scored(job, 0.5);
        assert_eq!(rec.title, "Unknown");
        assert_eq!(rec.company, "Unknown");
        assert_eq!(rec.location, "Unknown");
        assert_eq!(rec.link, "https://acme.com/1");
        assert_eq!(rec.description, "some role");
    }
}
