//! RemoteOK adapter.
//!
//! Single unauthenticated endpoint returning a JSON array whose first
//! element is API metadata, not a job. Remote-only by definition.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::leads::Region;

use super::{http_client, JobSource, RawPosting, SourceError, SourceKind};

const API_URL: &str = "https://remoteok.com/api";

#[derive(Debug, Deserialize)]
struct RemoteOkJob {
    id: Option<serde_json::Value>,
    #[serde(default)]
    position: String,
    #[serde(default)]
    company: String,
    url: Option<String>,
    salary: Option<String>,
    date: Option<String>,
}

pub struct RemoteOkSource {
    client: reqwest::Client,
}

impl RemoteOkSource {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    fn convert(job: RemoteOkJob) -> Option<RawPosting> {
        let url = job.url?;
        if job.position.is_empty() {
            return None;
        }
        Some(RawPosting {
            source: SourceKind::RemoteOk,
            native_id: job.id.map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            title: job.position,
            company: job.company,
            location: "Remote".to_string(),
            url,
            salary: job.salary.filter(|s| !s.is_empty()),
            posted_at: job.date,
            region: Region::Remote,
        })
    }
}

#[async_trait]
impl JobSource for RemoteOkSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteOk
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
            .query(&[("tag", role)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
            });
        }

        let items: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        // First array element is legal/metadata, not a job.
        let postings = items
            .into_iter()
            .skip(1)
            .filter_map(|v| serde_json::from_value::<RemoteOkJob>(v).ok())
            .filter_map(Self::convert)
            .collect();

        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_remote_only() {
        let s = RemoteOkSource::new(Duration::from_secs(5)).unwrap();
        assert!(s.supports(Region::Remote));
        assert!(!s.supports(Region::Uk));
        assert!(!s.supports(Region::India));
    }

    #[test]
    fn test_convert_fills_remote_location() {
        let job: RemoteOkJob = serde_json::from_value(serde_json::json!({
            "id": "91234",
            "position": "Junior Fullstack Developer",
            "company": "Acme",
            "url": "https://remoteok.example/91234",
            "salary": "",
            "date": "2026-07-02"
        }))
        .unwrap();

        let posting = RemoteOkSource::convert(job).unwrap();
        assert_eq!(posting.location, "Remote");
        assert_eq!(posting.region, Region::Remote);
        assert!(posting.salary.is_none(), "empty salary must become None");
    }

    #[test]
    fn test_convert_drops_titleless_entries() {
        let job: RemoteOkJob = serde_json::from_value(serde_json::json!({
            "url": "https://remoteok.example/1"
        }))
        .unwrap();
        assert!(RemoteOkSource::convert(job).is_none());
    }
}
