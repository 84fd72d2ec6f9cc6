//! SerpAPI Google Jobs provider.
//!
//! Field mapping (SerpAPI `jobs_results` item -> Job):
//! - `title`                              -> title
//! - `company_name`                       -> company
//! - `location`                           -> location
//! - `description`, else `snippet`        -> description
//! - `apply_options[0].link`, else `job_id` -> url
//! - `detected_extensions.posted_at`, else `via` -> posted_at
//! - via is always "Google Jobs"

use std::time::Duration;

use serde_json::Value;

use crate::jobs::{Job, RawJob};
use crate::providers::{JobProvider, ProviderError, SearchParams};

const ENDPOINT: &str = "https://serpapi.com/search.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const SOURCE: &str = "serpapi";

pub struct SerpApiProvider {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl SerpApiProvider {
    /// Build the provider from `SERPAPI_KEY`, or `None` when the key is
    /// absent (provider disabled).
    pub fn from_env() -> Result<Option<Self>, ProviderError> {
        let Some(api_key) = std::env::var("SERPAPI_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
        else {
            return Ok(None);
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Some(Self { api_key, client }))
    }

    fn parse_response(data: &Value, max_results: usize) -> Vec<Job> {
        let Some(items) = data.get("jobs_results").and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        items
            .iter()
            .take(max_results)
            .map(Self::map_item)
            .collect()
    }

    fn map_item(item: &Value) -> Job {
        let url = item
            .get("apply_options")
            .and_then(|v| v.as_array())
            .and_then(|opts| opts.first())
            .and_then(|opt| opt.get("link"))
            .and_then(|v| v.as_str())
            .or_else(|| item.get("job_id").and_then(|v| v.as_str()))
            .map(str::to_owned);

        let posted_at = item
            .get("detected_extensions")
            .and_then(|v| v.get("posted_at"))
            .and_then(|v| v.as_str())
            .or_else(|| item.get("via").and_then(|v| v.as_str()))
            .map(str::to_owned);

        let description = item
            .get("description")
            .and_then(|v| v.as_str())
            .or_else(|| item.get("snippet").and_then(|v| v.as_str()))
            .map(str::to_owned);

        Job::normalized(
            RawJob {
                title: str_field(item, "title"),
                company: str_field(item, "company_name"),
                location: str_field(item, "location"),
                description,
                url,
                via: Some("Google Jobs".to_string()),
                posted_at,
            },
            SOURCE,
        )
    }
}

fn str_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_str()).map(str::to_owned)
}

impl JobProvider for SerpApiProvider {
    fn fetch(&self, query: &str, params: &SearchParams) -> Result<Vec<Job>, ProviderError> {
        let mut pairs = vec![
            ("engine", "google_jobs".to_string()),
            ("q", query.to_string()),
            ("api_key", self.api_key.clone()),
            ("hl", "en".to_string()),
        ];
        if !params.location.is_empty() {
            pairs.push(("location", params.location.clone()));
        }

        let data: Value = self
            .client
            .get(ENDPOINT)
            .query(&pairs)
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(error) = data.get("error").and_then(|v| v.as_str()) {
            return Err(ProviderError::BadResponse(error.to_string()));
        }

        Ok(Self::parse_response(&data, params.max_results))
    }

    fn name(&self) -> &'static str {
        "SerpAPI"
    }

    fn priority(&self) -> u8 {
        0
    }
}
