//! Job-listing providers.
//!
//! Each provider adapts one external HTTP listing API to the canonical
//! [`Job`] shape. The registry fans enabled providers out in parallel,
//! isolates per-provider failures, and merges contributions in a fixed
//! priority order before deduplication.

pub mod jsearch;
pub mod serpapi;

use std::thread;

use crate::config::ProvidersConfig;
use crate::jobs::{dedup_jobs, Job};

/// Fallback query when the user supplied nothing usable.
const DEFAULT_QUERY: &str = "internship";

/// Errors from a single provider fetch. Never escapes the registry: the
/// aggregator logs it and treats that provider's contribution as empty.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    BadResponse(String),
}

/// User search parameters shared by all providers.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub skills: Vec<String>,
    pub preferences: Vec<String>,
    pub experience: String,
    pub location: String,
    pub job_type: String,
    pub max_results: usize,
}

impl SearchParams {
    /// Join skills, preferences and experience into one search string,
    /// falling back to a default term when everything is blank.
    pub fn query_string(&self) -> String {
        let joined = self
            .skills
            .iter()
            .chain(self.preferences.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.experience.as_str()))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            DEFAULT_QUERY.to_string()
        } else {
            joined
        }
    }
}

/// Trait for job-listing provider adapters.
pub trait JobProvider: Send + Sync {
    /// Fetch and normalize postings for the shared query string.
    fn fetch(&self, query: &str, params: &SearchParams) -> Result<Vec<Job>, ProviderError>;

    /// Name of this provider for logging.
    fn name(&self) -> &'static str;

    /// Merge ordering. Lower = higher dedup priority (its version of a
    /// duplicate posting wins).
    fn priority(&self) -> u8;
}

/// Collection of enabled providers.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn JobProvider>>,
}

impl ProviderRegistry {
    /// Build the registry from config flags and environment credentials.
    ///
    /// A provider with no API key in the environment is disabled, not an
    /// error — it simply contributes nothing.
    pub fn from_env(config: &ProvidersConfig) -> Self {
        let mut providers: Vec<Box<dyn JobProvider>> = Vec::new();

        if config.serpapi {
            match serpapi::SerpApiProvider::from_env() {
                Ok(Some(p)) => providers.push(Box::new(p)),
                Ok(None) => log::debug!("SERPAPI_KEY not set, SerpAPI provider disabled"),
                Err(e) => log::warn!("provider=SerpAPI outcome=init-error err={e}"),
            }
        }
        if config.jsearch {
            match jsearch::JSearchProvider::from_env() {
                Ok(Some(p)) => providers.push(Box::new(p)),
                Ok(None) => log::debug!("RAPIDAPI_KEY not set, JSearch provider disabled"),
                Err(e) => log::warn!("provider=JSearch outcome=init-error err={e}"),
            }
        }

        Self { providers }
    }

    /// Build a registry from explicit providers (used by tests).
    pub fn with_providers(providers: Vec<Box<dyn JobProvider>>) -> Self {
        Self { providers }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Fetch from every enabled provider and merge into one deduplicated,
    /// ordered sequence of well-formed jobs.
    ///
    /// Providers run on scoped threads; a failure in one is logged and
    /// degrades to an empty contribution, never aborting the others. The
    /// merge is deterministic: provider priority first, then each provider's
    /// own ordering. An empty result is a valid outcome, not an error.
    pub fn aggregate(&self, params: &SearchParams) -> Vec<Job> {
        let query = params.query_string();
        log::info!("aggregating jobs for query '{query}'");

        let mut contributions: Vec<(u8, Vec<Job>)> = thread::scope(|s| {
            let handles: Vec<_> = self
                .providers
                .iter()
                .map(|provider| {
                    let query = query.as_str();
                    s.spawn(move || {
                        let name = provider.name();
                        match provider.fetch(query, params) {
                            Ok(jobs) => {
                                log::info!("provider={name} outcome=success jobs={}", jobs.len());
                                Some((provider.priority(), jobs))
                            }
                            Err(e) => {
                                log::warn!("provider={name} outcome=error err={e}");
                                None
                            }
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|h| h.join().ok().flatten())
                .collect()
        });

        contributions.sort_by_key(|(priority, _)| *priority);

        let merged: Vec<Job> = contributions
            .into_iter()
            .flat_map(|(_, jobs)| jobs)
            .collect();

        dedup_jobs(merged)
    }
}
