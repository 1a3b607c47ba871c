//! The Muse adapter - UAE coverage, which Adzuna lacks.
//!
//! The public API has no free-text search, only category/location
//! facets, so the role match happens client-side against the title.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::leads::Region;

use super::{http_client, JobSource, RawPosting, SourceError, SourceKind};

const API_URL: &str = "https://www.themuse.com/api/public/jobs";
const LOCATION: &str = "Dubai, United Arab Emirates";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MuseJob>,
}

#[derive(Debug, Deserialize)]
struct MuseJob {
    id: Option<serde_json::Value>,
    #[serde(default)]
    name: String,
    company: Option<MuseCompany>,
    #[serde(default)]
    locations: Vec<MuseLocation>,
    refs: Option<MuseRefs>,
    publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MuseCompany {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MuseLocation {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MuseRefs {
    landing_page: Option<String>,
}

pub struct TheMuseSource {
    client: reqwest::Client,
}

impl TheMuseSource {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout)?,
        })
    }

    /// Client-side role filter: the facet query is broad, so keep only
    /// titles that mention the role's leading word or a generic
    /// engineering marker.
    fn title_matches(title: &str, role: &str) -> bool {
        let title = title.to_lowercase();
        let first_word = role.split_whitespace().next().unwrap_or("").to_lowercase();
        (!first_word.is_empty() && title.contains(&first_word))
            || title.contains("software")
            || title.contains("developer")
    }

    fn convert(job: MuseJob) -> Option<RawPosting> {
        let url = job.refs.and_then(|r| r.landing_page)?;
        if job.name.is_empty() {
            return None;
        }
        let locations: Vec<String> = job
            .locations
            .into_iter()
            .filter_map(|l| l.name)
            .collect();
        let location = if locations.is_empty() {
            "UAE".to_string()
        } else {
            locations.join(", ")
        };
        Some(RawPosting {
            source: SourceKind::TheMuse,
            native_id: job.id.map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            title: job.name,
            company: job.company.and_then(|c| c.name).unwrap_or_default(),
            location,
            url,
            salary: None,
            posted_at: job.publication_date,
            region: Region::Uae,
        })
    }
}

#[async_trait]
impl JobSource for TheMuseSource {
    fn kind(&self) -> SourceKind {
        SourceKind::TheMuse
    }

    fn supports(&self, region: Region) -> bool {
        region == Region::Uae
    }

    async fn search(&self, region: Region, role: &str) -> Result<Vec<RawPosting>, SourceError> {
        if region != Region::Uae {
            return Err(SourceError::UnsupportedRegion { region });
        }

        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("category", "Software Engineer"),
                ("location", LOCATION),
                ("level", "Entry Level"),
                ("level", "Mid Level"),
                ("page", "1"),
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

        Ok(body
            .results
            .into_iter()
            .filter(|job| Self::title_matches(&job.name, role))
            .filter_map(Self::convert)
            .collect())
    }
}
