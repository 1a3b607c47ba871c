//! Source adapters: one per external job board.
//!
//! Each adapter translates its board's pagination, auth, and response
//! shape into a uniform stream of `RawPosting`s. Adapters are fail-soft
//! by contract: the aggregator treats any `SourceError` as "skip this
//! source for this run", never as a reason to abort the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::config::SourcesConfig;
use crate::leads::Region;
use crate::secrets::resolve_secret_optional;

pub mod adzuna;
pub mod reed;
pub mod remoteok;
pub mod remotive;
pub mod themuse;

pub use adzuna::AdzunaSource;
pub use reed::ReedSource;
pub use remoteok::RemoteOkSource;
pub use remotive::RemotiveSource;
pub use themuse::TheMuseSource;

/// The configured adapter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Adzuna,
    RemoteOk,
    Remotive,
    Reed,
    TheMuse,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Adzuna => "adzuna",
            SourceKind::RemoteOk => "remoteok",
            SourceKind::Remotive => "remotive",
            SourceKind::Reed => "reed",
            SourceKind::TheMuse => "themuse",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adzuna" => Ok(SourceKind::Adzuna),
            "remoteok" => Ok(SourceKind::RemoteOk),
            "remotive" => Ok(SourceKind::Remotive),
            "reed" => Ok(SourceKind::Reed),
            "themuse" => Ok(SourceKind::TheMuse),
            other => Err(format!("unknown source '{}'", other)),
        }
    }
}

/// One candidate posting as reported by a source, before
/// fingerprinting and relevance filtering.
#[derive(Debug, Clone)]
pub struct RawPosting {
    pub source: SourceKind,
    pub native_id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub salary: Option<String>,
    pub posted_at: Option<String>,
    pub region: Region,
}

/// Errors from a single source adapter. Contained per-source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Region '{region}' not supported by this source")]
    UnsupportedRegion { region: Region },
}

/// A job board adapter.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Which adapter this is, for logging and fingerprint fallbacks.
    fn kind(&self) -> SourceKind;

    /// Whether the adapter covers a region at all. The aggregator uses
    /// this for cheap cancellation of unsupported cross-product cells.
    fn supports(&self, region: Region) -> bool;

    /// Searches the board for one (region, role) cell.
    async fn search(&self, region: Region, role: &str) -> Result<Vec<RawPosting>, SourceError>;
}

/// User agent presented to the job boards.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (compatible; jobpilot/0.1)";

/// Builds a reqwest client with the per-request timeout all adapters use.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(SourceError::Http)
}

/// Instantiates every enabled adapter from the config, resolving
/// optional credentials. A credential that fails to resolve disables
/// just that adapter (logged), never the whole set.
pub fn build_sources(config: &SourcesConfig) -> Vec<Box<dyn JobSource>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut sources: Vec<Box<dyn JobSource>> = Vec::new();

    if config.adzuna.enabled {
        let app_id = config
            .adzuna
            .app_id
            .as_ref()
            .and_then(|r| resolve_or_warn(r, "adzuna app_id"));
        let app_key = config
            .adzuna
            .app_key
            .as_ref()
            .and_then(|r| resolve_or_warn(r, "adzuna app_key"));
        match AdzunaSource::new(timeout, app_id, app_key, config.adzuna.max_pages) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => warn!("Failed to build adzuna adapter: {}", e),
        }
    }

    if config.remoteok.enabled {
        match RemoteOkSource::new(timeout) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => warn!("Failed to build remoteok adapter: {}", e),
        }
    }

    if config.remotive.enabled {
        match RemotiveSource::new(timeout) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => warn!("Failed to build remotive adapter: {}", e),
        }
    }

    if config.reed.enabled {
        let api_key = config
            .reed
            .api_key
            .as_ref()
            .and_then(|r| resolve_or_warn(r, "reed api_key"));
        match ReedSource::new(timeout, api_key) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => warn!("Failed to build reed adapter: {}", e),
        }
    }

    if config.themuse.enabled {
        match TheMuseSource::new(timeout) {
            Ok(source) => sources.push(Box::new(source)),
            Err(e) => warn!("Failed to build themuse adapter: {}", e),
        }
    }

    sources
}

fn resolve_or_warn(
    secret_ref: &crate::config::SecretRef,
    what: &str,
) -> Option<secrecy::SecretString> {
    match resolve_secret_optional(
        secret_ref.value.as_deref(),
        secret_ref.file.as_deref(),
        secret_ref.env_var.as_deref(),
    ) {
        Ok(secret) => secret,
        Err(e) => {
            warn!("Could not resolve {}: {} - continuing without it", what, e);
            None
        }
    }
}
