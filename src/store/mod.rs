//! Embedding-indexed job store.
//!
//! Owns the persisted vector index and coordinates the embedder for both
//! ingestion (full rebuild) and top-k similarity queries. The in-memory
//! state is a two-state machine: NoIndex until the first successful load or
//! upsert, Loaded afterwards.

pub mod index;
pub mod storage;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::embedder::{Embedder, EmbeddingError};
use crate::jobs::Job;
use crate::store::index::{IndexEntry, IndexError, VectorIndex};
use crate::store::storage::{SnapshotStorage, StorageError};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job at position {position} is missing '{field}'")]
    Schema { position: usize, field: &'static str },

    #[error("no job index at {}; ingest jobs before querying", .path.display())]
    NotFound { path: PathBuf },

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct VectorStore {
    storage: SnapshotStorage,
    embedder: Arc<dyn Embedder>,
    state: Mutex<Option<VectorIndex>>,
}

impl VectorStore {
    /// Create a store over the snapshot at `path`.
    ///
    /// No I/O happens here; the snapshot is loaded on first query and
    /// written on upsert.
    pub fn new(path: PathBuf, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            storage: SnapshotStorage::new(path),
            embedder,
            state: Mutex::new(None),
        }
    }

    /// Rebuild the index from `jobs` and persist it, replacing any prior
    /// snapshot wholesale. This is not an incremental merge: the snapshot
    /// format carries a fixed entry count, so two upserts never accumulate.
    ///
    /// Every job must carry a non-empty description (the embedded field).
    /// Descriptions are embedded in one order-preserving batch call.
    pub fn upsert(&self, jobs: &[Job]) -> Result<usize, StoreError> {
        if let Some(position) = jobs.iter().position(|j| j.description.trim().is_empty()) {
            return Err(StoreError::Schema {
                position,
                field: "description",
            });
        }

        let texts: Vec<String> = jobs.iter().map(|j| j.description.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(StoreError::Internal(format!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        let mut index = VectorIndex::with_capacity(self.embedder.dimensions(), jobs.len());
        for ((job, text), embedding) in jobs.iter().zip(texts).zip(embeddings) {
            index.push(IndexEntry {
                text,
                job: job.clone(),
                embedding,
            })?;
        }

        self.storage
            .save(&index, &self.embedder.model_id_hash())
            .map_err(StoreError::Storage)?;

        let count = index.len();
        *self.lock_state()? = Some(index);
        log::info!(
            "stored {count} jobs in the vector index at {}",
            self.storage.path().display()
        );
        Ok(count)
    }

    /// Top-k similarity query against the current snapshot.
    ///
    /// Loads the snapshot if not yet in memory; a missing snapshot is
    /// `StoreError::NotFound` (single load-or-fail operation, no
    /// exists-then-open race). Results come back highest score first, ties
    /// in insertion order; a corpus smaller than `top_k` yields all of it.
    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<(Job, f32)>, StoreError> {
        let mut guard = self.lock_state()?;
        if guard.is_none() {
            *guard = Some(self.load_snapshot()?);
        }
        let index = guard
            .as_ref()
            .ok_or_else(|| StoreError::Internal("state empty after load".into()))?;

        let query_embedding = self.embedder.embed_query(text)?;
        let hits = index.search(&query_embedding, top_k)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                index
                    .get(hit.position)
                    .map(|entry| (entry.job.clone(), hit.score))
            })
            .collect())
    }

    fn load_snapshot(&self) -> Result<VectorIndex, StoreError> {
        let model_id = self.embedder.model_id_hash();
        match self
            .storage
            .load(&model_id, self.embedder.dimensions())
        {
            Ok(index) => {
                log::info!("loaded {} jobs from {}", index.len(), self.storage.path().display());
                Ok(index)
            }
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound {
                    path: self.storage.path().to_path_buf(),
                })
            }
            Err(e) => {
                log::error!("failed to load job index: {e}");
                Err(StoreError::Storage(e))
            }
        }
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, Option<VectorIndex>>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }
}
