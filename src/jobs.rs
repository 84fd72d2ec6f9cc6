//! Canonical job records.
//!
//! Every listing provider speaks its own schema; this module defines the one
//! record shape they are all normalized into, plus cross-source deduplication
//! and ingestion of user-supplied CSV/JSON files.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// A job posting in canonical form.
///
/// All fields are plain strings defaulting to empty, never `Option` — callers
/// never have to branch on a missing key. `id` is derived from the identity
/// fields, so re-ingesting the same posting yields the same id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Free text embedded for similarity search.
    pub description: String,
    pub url: String,
    /// Provider that produced this record.
    pub source: String,
    /// Display attribution, falls back to `source`.
    pub via: String,
    pub posted_at: String,
}

/// Provider-agnostic raw fields, any subset of which may be absent.
#[derive(Clone, Debug, Default)]
pub struct RawJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub via: Option<String>,
    pub posted_at: Option<String>,
}

impl Job {
    /// Normalize a raw provider record into a well-formed Job.
    ///
    /// Missing fields degrade to empty strings, never an error. The result
    /// may still be unstorable (empty title or company) — that is filtered
    /// at dedup time, not here.
    pub fn normalized(raw: RawJob, source: &str) -> Job {
        let title = raw.title.unwrap_or_default().trim().to_string();
        let company = raw.company.unwrap_or_default().trim().to_string();
        let location = raw.location.unwrap_or_default().trim().to_string();
        let description = raw.description.unwrap_or_default().trim().to_string();
        let url = normalize_link(&raw.url.unwrap_or_default());
        let via = raw
            .via
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| source.to_string());

        Job {
            id: derive_id(source, &title, &company, &location, &url),
            title,
            company,
            location,
            description,
            url,
            source: source.to_string(),
            via,
            posted_at: raw.posted_at.unwrap_or_default().trim().to_string(),
        }
    }

    /// Whether this job may enter the index: title and company are required.
    pub fn is_storable(&self) -> bool {
        !self.title.is_empty() && !self.company.is_empty()
    }

    /// Case-insensitive (title, company, location) key used for dedup.
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.title.to_lowercase(),
            self.company.to_lowercase(),
            self.location.to_lowercase(),
        )
    }
}

/// Stable content-derived id: `source:` plus the first 16 hex chars of the
/// SHA-256 over the identity fields.
fn derive_id(source: &str, title: &str, company: &str, location: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [title, company, location, url] {
        hasher.update(field.to_lowercase().as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{source}:{hex}")
}

/// Light URL cleanup before id derivation so tracking noise does not split
/// identical postings into different ids.
///
/// Lowercases the host, strips common tracking query parameters and trailing
/// slashes, upgrades protocol-relative URLs to https. Returns the input
/// unchanged when it does not parse as a URL.
pub fn normalize_link(link: &str) -> String {
    let link = link.trim();
    let candidate = if link.starts_with("//") {
        format!("https:{link}")
    } else {
        link.to_string()
    };

    let mut parsed = match Url::parse(&candidate) {
        Ok(u) => u,
        Err(_) => return link.to_string(),
    };

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if parsed.set_host(Some(&lowered)).is_err() {
            return link.to_string();
        }
    }

    const TRACKING_PARAMS: [&str; 7] = [
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "utm_term",
        "utm_content",
        "fbclid",
        "gclid",
    ];

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    parsed.set_query(None);
    if !kept.is_empty() {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// Collapse duplicates across sources, first-seen-wins.
///
/// Input order is provider-priority order, so a posting seen by a
/// higher-priority provider shadows the same posting from a lower one.
/// Jobs with empty title or company are dropped.
pub fn dedup_jobs(jobs: Vec<Job>) -> Vec<Job> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(jobs.len());
    for job in jobs {
        if !job.is_storable() {
            continue;
        }
        if seen.insert(job.dedup_key()) {
            out.push(job);
        }
    }
    out
}

/// One row of a user-supplied jobs file. All fields optional; `link` is
/// accepted as an alias for `url`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JobRow {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "link")]
    pub url: Option<String>,
    pub via: Option<String>,
    pub posted_at: Option<String>,
    pub source: Option<String>,
}

impl JobRow {
    pub fn into_job(self) -> Job {
        let source = self
            .source
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "upload".to_string());
        Job::normalized(
            RawJob {
                title: self.title,
                company: self.company,
                location: self.location,
                description: self.description,
                url: self.url,
                via: self.via,
                posted_at: self.posted_at,
            },
            &source,
        )
    }
}

/// Read jobs from a `.csv` file (headered) or a `.json` file (array of rows).
pub fn read_jobs_file(path: &Path) -> anyhow::Result<Vec<Job>> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let rows: Vec<JobRow> = match ext.as_str() {
        "csv" => {
            let mut reader = csv::Reader::from_path(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            reader
                .deserialize()
                .collect::<Result<Vec<JobRow>, _>>()
                .with_context(|| format!("malformed CSV in {}", path.display()))?
        }
        "json" => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("malformed JSON in {}", path.display()))?
        }
        other => anyhow::bail!("unsupported file extension '{other}', expected csv or json"),
    };

    Ok(rows.into_iter().map(JobRow::into_job).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, company: &str, location: &str) -> RawJob {
        RawJob {
            title: Some(title.to_string()),
            company: Some(company.to_string()),
            location: Some(location.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalized_fills_missing_fields() {
        let job = Job::normalized(RawJob::default(), "serpapi");
        assert_eq!(job.title, "");
        assert_eq!(job.company, "");
        assert_eq!(job.location, "");
        assert_eq!(job.description, "");
        assert_eq!(job.url, "");
        assert_eq!(job.posted_at, "");
        assert_eq!(job.source, "serpapi");
        assert_eq!(job.via, "serpapi");
        assert!(job.id.starts_with("serpapi:"));
    }

    #[test]
    fn test_via_falls_back_to_source() {
        let mut r = raw("Engineer", "Acme", "Berlin");
        r.via = Some("  ".to_string());
        let job = Job::normalized(r, "jsearch");
        assert_eq!(job.via, "jsearch");

        let mut r = raw("Engineer", "Acme", "Berlin");
        r.via = Some("LinkedIn".to_string());
        assert_eq!(Job::normalized(r, "jsearch").via, "LinkedIn");
    }

    #[test]
    fn test_id_is_deterministic_across_reingests() {
        let a = Job::normalized(raw("Engineer", "Acme", "Berlin"), "serpapi");
        let b = Job::normalized(raw("Engineer", "Acme", "Berlin"), "serpapi");
        assert_eq!(a.id, b.id);

        let c = Job::normalized(raw("Engineer", "Acme", "Munich"), "serpapi");
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_id_ignores_case_and_tracking_params() {
        let mut r1 = raw("Engineer", "Acme", "Berlin");
        r1.url = Some("https://ACME.com/jobs/1?utm_source=feed".to_string());
        let mut r2 = raw("ENGINEER", "acme", "berlin");
        r2.url = Some("https://acme.com/jobs/1".to_string());
        assert_eq!(
            Job::normalized(r1, "serpapi").id,
            Job::normalized(r2, "serpapi").id
        );
    }

    #[test]
    fn test_normalize_link_malformed_returns_original() {
        assert_eq!(normalize_link("not a url"), "not a url");
    }

    #[test]
    fn test_dedup_first_seen_wins() {
        let first = Job::normalized(raw("Engineer", "Acme", "Berlin"), "serpapi");
        let shadowed = Job::normalized(raw("engineer", "ACME", "berlin"), "jsearch");
        let other = Job::normalized(raw("Designer", "Acme", "Berlin"), "jsearch");

        let out = dedup_jobs(vec![first.clone(), shadowed, other.clone()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], first);
        assert_eq!(out[0].source, "serpapi");
        assert_eq!(out[1], other);
    }

    #[test]
    fn test_dedup_drops_unstorable_jobs() {
        let no_title = Job::normalized(raw("", "Acme", "Berlin"), "serpapi");
        let no_company = Job::normalized(raw("Engineer", "", "Berlin"), "serpapi");
        let ok = Job::normalized(raw("Engineer", "Acme", ""), "serpapi");

        let out = dedup_jobs(vec![no_title, no_company, ok.clone()]);
        assert_eq!(out, vec![ok]);
    }

    #[test]
    fn test_dedup_output_keys_are_unique() {
        let jobs: Vec<Job> = (0..20)
            .map(|i| Job::normalized(raw(&format!("T{}", i % 5), "Acme", "Berlin"), "serpapi"))
            .collect();
        let out = dedup_jobs(jobs);
        let keys: HashSet<_> = out.iter().map(Job::dedup_key).collect();
        assert_eq!(keys.len(), out.len());
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_job_row_link_alias_and_default_source() {
        let row: JobRow =
            serde_json::from_str(r#"{"title":"Engineer","company":"Acme","link":"https://acme.com/1"}"#)
                .unwrap();
        let job = row.into_job();
        assert_eq!(job.url, "https://acme.com/1");
        assert_eq!(job.source, "upload");
    }

    #[test]
    fn test_job_deserializes_with_missing_fields() {
        // Snapshots written by an older schema may lack newer fields.
        let job: Job = serde_json::from_str(r#"{"title":"Engineer"}"#).unwrap();
        assert_eq!(job.title, "Engineer");
        assert_eq!(job.company, "");
        assert_eq!(job.via, "");
    }
}
