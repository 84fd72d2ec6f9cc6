//! Configuration loading.
//!
//! `config.yaml` lives in the data directory (default `~/.config/jobscout`)
//! and is created with defaults on first run. API keys never live in the
//! file — they come from the environment (`GEMINI_API_KEY`, `SERPAPI_KEY`,
//! `RAPIDAPI_KEY`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.yaml";
const INDEX_FILE: &str = "jobs.vec";

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RESULTS: usize = 25;

/// Embedding backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name, e.g. "text-embedding-004"
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Fixed output dimensionality of the model
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Timeout for embedding HTTP calls in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_dimensions() -> usize {
    DEFAULT_EMBEDDING_DIMENSIONS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Listing provider configuration. A provider additionally needs its API key
/// in the environment to be active.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_true")]
    pub serpapi: bool,

    #[serde(default = "default_true")]
    pub jsearch: bool,

    /// Cap on results taken from each provider
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            serpapi: true,
            jsearch: true,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    /// Load the config from `data_dir` (default `~/.config/jobscout`),
    /// creating it with defaults on first run.
    pub fn load(data_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let base_path = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        std::fs::create_dir_all(&base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        Self::load_with(&base_path)
    }

    fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let config_path = base_path.join(CONFIG_FILE);

        if !config_path.exists() {
            let rendered = serde_yml::to_string(&Self::default())?;
            std::fs::write(&config_path, rendered)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("malformed config at {}", config_path.display()))?;
        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case defaults were filled in for a partial file
        let rendered = serde_yml::to_string(&config)?;
        if config_str != rendered {
            std::fs::write(&config_path, rendered)
                .with_context(|| format!("failed to write {}", config_path.display()))?;
        }

        Ok(config)
    }

    /// Path of the persisted vector index snapshot.
    pub fn index_path(&self) -> PathBuf {
        self.base_path.join(INDEX_FILE)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        if self.embedding.dimensions == 0 {
            bail!("embedding.dimensions must be greater than 0");
        }
        if self.embedding.request_timeout_secs == 0 {
            bail!("embedding.request_timeout_secs must be greater than 0");
        }
        if self.providers.max_results == 0 {
            bail!("providers.max_results must be greater than 0");
        }
        Ok(())
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = homedir::my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".config").join("jobscout"))
}
