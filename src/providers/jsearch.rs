//! JSearch (RapidAPI) provider — aggregates jobs from multiple boards.
//!
//! Field mapping (JSearch `data` item -> Job):
//! - `job_title`                           -> title
//! - `employer_name`                       -> company
//! - `job_city`, else `job_country`        -> location
//! - `job_description`                     -> description
//! - `job_apply_link`                      -> url
//! - `job_publisher`, else "JSearch"       -> via
//! - `job_posted_at_datetime_utc`          -> posted_at

use std::time::Duration;

use serde_json::Value;

use crate::jobs::{Job, RawJob};
use crate::providers::{JobProvider, ProviderError, SearchParams};

const ENDPOINT: &str = "https://jsearch.p.rapidapi.com/search";
const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);

pub const SOURCE: &str = "jsearch";

pub struct JSearchProvider {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl JSearchProvider {
    /// Build the provider from `RAPIDAPI_KEY`, or `None` when the key is
    /// absent (provider disabled).
    pub fn from_env() -> Result<Option<Self>, ProviderError> {
        let Some(api_key) = std::env::var("RAPIDAPI_KEY")
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
        let Some(items) = data.get("data").and_then(|v| v.as_array()) else {
            return Vec::new();
        };

        items
            .iter()
            .take(max_results)
            .map(Self::map_item)
            .collect()
    }

    fn map_item(item: &Value) -> Job {
        let location = item
            .get("job_city")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| item.get("job_country").and_then(|v| v.as_str()))
            .map(str::to_owned);

        let via = item
            .get("job_publisher")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("JSearch")
            .to_string();

        Job::normalized(
            RawJob {
                title: str_field(item, "job_title"),
                company: str_field(item, "employer_name"),
                location,
                description: str_field(item, "job_description"),
                url: str_field(item, "job_apply_link"),
                via: Some(via),
                posted_at: str_field(item, "job_posted_at_datetime_utc"),
            },
            SOURCE,
        )
    }
}

fn str_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_str()).map(str::to_owned)
}

impl JobProvider for JSearchProvider {
    fn fetch(&self, query: &str, params: &SearchParams) -> Result<Vec<Job>, ProviderError> {
        let full_query = format!("{} {}", query, params.location);

        let data: Value = self
            .client
            .get(ENDPOINT)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .query(&[
                ("query", full_query.trim()),
                ("page", "1"),
                ("num_pages", "1"),
                ("employment_types", params.job_type.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        if data.get("status").and_then(|v| v.as_str()) == Some("ERROR") {
            let message = data
                .get("error")
                .and_then(|v| v.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(ProviderError::BadResponse(message.to_string()));
        }

        Ok(Self::parse_response(&data, params.max_results))
    }

    fn name(&self) -> &'static str {
        "JSearch"
    }

    fn priority(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_maps_fields() {
        let data = serde_json::json!({
            "status": "OK",
            "data": [{
                "job_title": "Frontend Developer",
                "employer_name": "Acme",
                "job_city": "Berlin",
                "job_country": "DE",
                "job_description": "React and CSS",
                "job_apply_link": "https://acme.com/jobs/2",
                "job_publisher": "LinkedIn",
                "job_posted_at_datetime_utc": "2026-08-01T00:00:00Z"
            }]
        });

        let jobs = JSearchProvider::parse_response(&data, 10);
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Frontend Developer");
        assert_eq!(job.company, "Acme");
        assert_eq!(job.location, "Berlin");
        assert_eq!(job.via, "LinkedIn");
        assert_eq!(job.posted_at, "2026-08-01T00:00:00Z");
        assert_eq!(job.source, SOURCE);
    }

    #[test]
    fn test_parse_response_location_falls_back_to_country() {
        let data = serde_json::json!({
            "data": [{
                "job_title": "Engineer",
                "employer_name": "Acme",
                "job_city": "",
                "job_country": "DE"
            }]
        });

        let jobs = JSearchProvider::parse_response(&data, 10);
        assert_eq!(jobs[0].location, "DE");
    }

    #[test]
    fn test_parse_response_via_defaults_to_jsearch() {
        let data = serde_json::json!({
            "data": [{ "job_title": "Engineer", "employer_name": "Acme" }]
        });
        assert_eq!(JSearchProvider::parse_response(&data, 10)[0].via, "JSearch");
    }

    #[test]
    fn test_parse_response_missing_data_key() {
        let data = serde_json::json!({ "status": "OK" });
        assert!(JSearchProvider::parse_response(&data, 10).is_empty());
    }
}
