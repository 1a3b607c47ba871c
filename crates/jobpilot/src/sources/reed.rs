//! Reed adapter (UK).
//!
//! Reed's API requires a free API key sent as HTTP Basic auth
//! (`key:` with an empty password). Without a key the adapter simply
//! reports no supported regions - graceful degradation, not an error.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::leads::Region;

use super::{http_client, JobSource, RawPosting, SourceError, SourceKind};

const API_URL: &str = "https://www.reed.co.uk/api/1.0/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ReedJob>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ReedJob {
    job_id: Option<i64>,
    #[serde(default)]
    job_title: String,
    #[serde(default)]
    employer_name: String,
    location_name: Option<String>,
    job_url: Option<String>,
    minimum_salary: Option<f64>,
    maximum_salary: Option<f64>,
    date: Option<String>,
}

pub struct ReedSource {
    client: reqwest::Client,
    api_key: Option<SecretString>,
}

impl ReedSource {
    pub fn new(timeout: Duration, api_key: Option<SecretString>) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
        })
    }

    fn basic_auth_header(key: &SecretString) -> String {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", key.expose_secret()));
        format!("Basic {}", encoded)
    }

    fn convert(job: ReedJob) -> Option<RawPosting> {
        let url = job.job_url?;
        if job.job_title.is_empty() {
            return None;
        }
        let salary = match (job.minimum_salary, job.maximum_salary) {
            (Some(min), Some(max)) => Some(format!("{}-{}", min, max)),
            (Some(min), None) => Some(format!("{}", min)),
            (None, Some(max)) => Some(format!("{}", max)),
            (None, None) => None,
        };
        Some(RawPosting {
            source: SourceKind::Reed,
            native_id: job.job_id.map(|id| id.to_string()),
            title: job.job_title,
            company: job.employer_name,
            location: job.location_name.unwrap_or_default(),
            url,
            salary,
            posted_at: job.date,
            region: Region::Uk,
        })
    }
}

#[async_trait]
impl JobSource for ReedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Reed
    }

    fn supports(&self, region: Region) -> bool {
        region == Region::Uk && self.api_key.is_some()
    }

    async fn search(&self, region: Region, role: &str) -> Result<Vec<RawPosting>, SourceError> {
        let api_key = match (&self.api_key, region) {
            (Some(key), Region::Uk) => key,
            _ => return Err(SourceError::UnsupportedRegion { region }),
        };

        let response = self
            .client
            .get(API_URL)
            .header("Authorization", Self::basic_auth_header(api_key))
            .query(&[
                ("keywords", role),
                ("locationName", "UK"),
                ("distancefromlocation", "50"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        Ok(body.results.into_iter().filter_map(Self::convert).collect())
    }
}
