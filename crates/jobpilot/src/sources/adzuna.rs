//! Adzuna adapter.
//!
//! Paginated REST API with per-country endpoints. Works without
//! credentials at a reduced quota; `app_id`/`app_key` unlock the full
//! result volume. No UAE coverage - that region is handled by The Muse.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::leads::Region;

use super::{http_client, JobSource, RawPosting, SourceError, SourceKind};

const BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const RESULTS_PER_PAGE: u32 = 20;
const PAGE_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: String,
    company: Option<AdzunaCompany>,
    location: Option<AdzunaLocation>,
    redirect_url: Option<String>,
    salary_min: Option<f64>,
    created: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdzunaCompany {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdzunaLocation {
    display_name: Option<String>,
}

pub struct AdzunaSource {
    client: reqwest::Client,
    app_id: Option<SecretString>,
    app_key: Option<SecretString>,
    max_pages: u32,
}

impl AdzunaSource {
    pub fn new(
        timeout: Duration,
        app_id: Option<SecretString>,
        app_key: Option<SecretString>,
        max_pages: u32,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            app_id,
            app_key,
            max_pages: max_pages.max(1),
        })
    }

    /// Adzuna country code for a region, if covered.
    fn country_code(region: Region) -> Option<&'static str> {
        match region {
            Region::Uk => Some("gb"),
            Region::India => Some("in"),
            Region::Germany => Some("de"),
            Region::Netherlands => Some("nl"),
            Region::Uae | Region::Remote => None,
        }
    }

    fn convert(&self, job: AdzunaJob, region: Region) -> Option<RawPosting> {
        let url = job.redirect_url?;
        let native_id = job.id.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        Some(RawPosting {
            source: SourceKind::Adzuna,
            native_id,
            title: job.title,
            company: job
                .company
                .and_then(|c| c.display_name)
                .unwrap_or_default(),
            location: job
                .location
                .and_then(|l| l.display_name)
                .unwrap_or_default(),
            url,
            salary: job.salary_min.map(|s| format!("{}", s)),
            posted_at: job.created,
            region,
        })
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Adzuna
    }

    fn supports(&self, region: Region) -> bool {
        Self::country_code(region).is_some()
    }

    async fn search(&self, region: Region, role: &str) -> Result<Vec<RawPosting>, SourceError> {
        let country = Self::country_code(region)
            .ok_or(SourceError::UnsupportedRegion { region })?;

        let mut postings = Vec::new();
        for page in 1..=self.max_pages {
            let url = format!("{}/{}/search/{}", BASE_URL, country, page);
            let mut request = self.client.get(&url).query(&[
                ("results_per_page", RESULTS_PER_PAGE.to_string()),
                ("what", role.to_string()),
                ("content-type", "application/json".to_string()),
            ]);
            if let (Some(id), Some(key)) = (&self.app_id, &self.app_key) {
                request = request.query(&[
                    ("app_id", id.expose_secret()),
                    ("app_key", key.expose_secret()),
                ]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(SourceError::Status {
                    status: response.status().as_u16(),
                });
            }
            let body: SearchResponse = response
                .json()
                .await
                .map_err(|e| SourceError::Decode(e.to_string()))?;

            if body.results.is_empty() {
                break;
            }
            debug!(
                "adzuna {}/{} page {}: {} results",
                country,
                role,
                page,
                body.results.len()
            );
            postings.extend(
                body.results
                    .into_iter()
                    .filter_map(|job| self.convert(job, region)),
            );

            // Politeness delay between pages.
            tokio::time::sleep(Duration::from_millis(PAGE_DELAY_MS)).await;
        }

        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AdzunaSource {
        AdzunaSource::new(Duration::from_secs(5), None, None, 3).unwrap()
    }

    #[test]
    fn test_region_coverage() {
        let s = source();
        assert!(s.supports(Region::Uk));
        assert!(s.supports(Region::India));
        assert!(s.supports(Region::Germany));
        assert!(s.supports(Region::Netherlands));
        assert!(!s.supports(Region::Uae));
        assert!(!s.supports(Region::Remote));
    }

    #[test]
    fn test_convert_maps_nested_fields() {
        let s = source();
        let job: AdzunaJob = serde_json::from_value(serde_json::json!({
            "id": 4242,
            "title": "Junior AI Engineer",
            "company": {"display_name": "Acme"},
            "location": {"display_name": "London, UK"},
            "redirect_url": "https://adzuna.example/4242",
            "salary_min": 42000.0,
            "created": "2026-07-01T00:00:00Z"
        }))
        .unwrap();

        let posting = s.convert(job, Region::Uk).unwrap();
        assert_eq!(posting.source, SourceKind::Adzuna);
        assert_eq!(posting.native_id.as_deref(), Some("4242"));
        assert_eq!(posting.company, "Acme");
        assert_eq!(posting.location, "London, UK");
        assert_eq!(posting.salary.as_deref(), Some("42000"));
    }

    #[test]
    fn test_convert_drops_postings_without_url() {
        let s = source();
        let job: AdzunaJob = serde_json::from_value(serde_json::json!({
            "title": "Junior AI Engineer"
        }))
        .unwrap();
        assert!(s.convert(job, Region::Uk).is_none());
    }

    #[test]
    fn test_decode_tolerates_missing_results() {
        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.results.is_empty());
    }
}
