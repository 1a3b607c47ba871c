//! Remotive adapter (tech-focused remote boards).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::leads::Region;

use super::{http_client, JobSource, RawPosting, SourceError, SourceKind};

const API_URL: &str = "https://remotive.com/api/remote-jobs";
const RESULT_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    company_name: String,
    candidate_required_location: Option<String>,
    url: Option<String>,
    salary: Option<String>,
    publication_date: Option<String>,
}

pub struct RemotiveSource {
    client: reqwest::Client,
}

impl RemotiveSource {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    fn convert(job: RemotiveJob) -> Option<RawPosting> {
        let url = job.url?;
        if job.title.is_empty() {
            return None;
        }
        Some(RawPosting {
            source: SourceKind::Remotive,
            native_id: job.id.map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            title: job.title,
            company: job.company_name,
            location: job
                .candidate_required_location
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Remote".to_string()),
            url,
            salary: job.salary.filter(|s| !s.is_empty()),
            posted_at: job.publication_date,
            region: Region::Remote,
        })
    }
}

#[async_trait]
impl JobSource for RemotiveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remotive
    }

    fn supports(&self, region: Region) -> bool {
        region == Region::Remote
    }

    async fn search(&self, region: Region, role: &str) -> Result<Vec<RawPosting>, SourceError> {
        if region != Region::Remote {
            return Err(SourceError::UnsupportedRegion { region });
        }

        let response = self
            .client
            .get(API_URL)
            .query(&[("search", role.to_string()), ("limit", RESULT_LIMIT.to_string())])
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

        Ok(body.jobs.into_iter().filter_map(Self::convert).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_remote_only() {
        let s = RemotiveSource::new(Duration::from_secs(5)).unwrap();
        assert!(s.supports(Region::Remote));
        assert!(!s.supports(Region::Germany));
    }

    #[test]
    fn test_convert_defaults_location_to_remote() {
        let job: RemotiveJob = serde_json::from_value(serde_json::json!({
            "id": 777,
            "title": "ML Engineer",
            "company_name": "Acme",
            "url": "https://remotive.example/777"
        }))
        .unwrap();

        let posting = RemotiveSource::convert(job).unwrap();
        assert_eq!(posting.location, "Remote");
        assert_eq!(posting.native_id.as_deref(), Some("777"));
    }

    #[test]
    fn test_convert_keeps_reported_location() {
        let job: RemotiveJob = serde_json::from_value(serde_json::json!({
            "title": "ML Engineer",
            "company_name": "Acme",
            "candidate_required_location": "Europe",
            "url": "https://remotive.example/778"
        }))
        .unwrap();

        let posting = RemotiveSource::convert(job).unwrap();
        assert_eq!(posting.location, "Europe");
    }

    #[test]
    fn test_decode_tolerates_missing_jobs() {
        let body: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(body.jobs.is_empty());
    }
}
