//! Gemini embedding backend.
//!
//! Talks to the Generative Language API over HTTP. The API key is read from
//! `GEMINI_API_KEY` at construction time so a misconfigured deployment fails
//! at startup, not halfway through an ingest.

use std::time::Duration;

use serde_json::{json, Value};

use crate::config::EmbeddingConfig;
use crate::embedder::{model_id_hash, Embedder, EmbeddingError};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The batch endpoint caps requests per call.
const BATCH_LIMIT: usize = 100;

pub struct GeminiEmbedder {
    api_key: String,
    model: String,
    dimensions: usize,
    client: reqwest::blocking::Client,
}

impl GeminiEmbedder {
    /// Create an embedder for the configured model.
    ///
    /// Fails eagerly with [`EmbeddingError::MissingApiKey`] when
    /// `GEMINI_API_KEY` is absent or empty.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(EmbeddingError::MissingApiKey)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
            client,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{API_BASE}/models/{model}:{method}?key={key}",
            model = self.model,
            key = self.api_key
        )
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let requests: Vec<Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.model),
                    "content": { "parts": [{ "text": text }] },
                    "taskType": "RETRIEVAL_DOCUMENT",
                })
            })
            .collect();

        let resp: Value = self
            .client
            .post(self.endpoint("batchEmbedContents"))
            .json(&json!({ "requests": requests }))
            .send()?
            .error_for_status()?
            .json()?;

        let embeddings = resp
            .get("embeddings")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EmbeddingError::BadResponse("missing 'embeddings' array".into()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::BadResponse(format!(
                "sent {} texts, got {} embeddings",
                texts.len(),
                embeddings.len()
            )));
        }

        embeddings.iter().map(|e| self.extract_values(e)).collect()
    }

    fn extract_values(&self, embedding: &Value) -> Result<Vec<f32>, EmbeddingError> {
        let values = embedding
            .get("values")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EmbeddingError::BadResponse("missing 'values' array".into()))?;

        let vector: Vec<f32> = values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }

        Ok(vector)
    }
}

impl Embedder for GeminiEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_LIMIT) {
            out.extend(self.embed_chunk(chunk)?);
        }

        log::debug!("embedded {} documents with {}", out.len(), self.model);
        Ok(out)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let resp: Value = self
            .client
            .post(self.endpoint("embedContent"))
            .json(&json!({
                "model": format!("models/{}", self.model),
                "content": { "parts": [{ "text": text }] },
                "taskType": "RETRIEVAL_QUERY",
            }))
            .send()?
            .error_for_status()?
            .json()?;

        let embedding = resp
            .get("embedding")
            .ok_or_else(|| EmbeddingError::BadResponse("missing 'embedding' object".into()))?;

        self.extract_values(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id_hash(&self) -> [u8; 32] {
        model_id_hash(&self.model)
    }
}
