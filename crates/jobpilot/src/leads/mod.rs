//! Lead domain types: the typed view over raw store rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::lead_repo::LeadRow;
use crate::sources::SourceKind;

pub mod fingerprint;
pub mod score;
pub mod status;

pub use fingerprint::Fingerprinter;
pub use score::RelevanceScorer;
pub use status::LeadStatus;

/// Search regions. The closed set mirrors what the configured sources
/// can actually cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Uk,
    Uae,
    India,
    Germany,
    Netherlands,
    Remote,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Uk => "uk",
            Region::Uae => "uae",
            Region::India => "india",
            Region::Germany => "germany",
            Region::Netherlands => "netherlands",
            Region::Remote => "remote",
        }
    }

    pub fn all() -> &'static [Region] {
        &[
            Region::Uk,
            Region::Uae,
            Region::India,
            Region::Germany,
            Region::Netherlands,
            Region::Remote,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uk" => Ok(Region::Uk),
            "uae" => Ok(Region::Uae),
            "india" => Ok(Region::India),
            "germany" => Ok(Region::Germany),
            "netherlands" => Ok(Region::Netherlands),
            "remote" => Ok(Region::Remote),
            other => Err(format!("unknown region '{}'", other)),
        }
    }
}

/// A row from the store that failed to parse into the typed domain.
#[derive(Debug, thiserror::Error)]
#[error("Lead {id} has invalid {field}: {value}")]
pub struct ParseLeadError {
    pub id: i64,
    pub field: &'static str,
    pub value: String,
}

/// A tracked job posting, fully typed.
#[derive(Debug, Clone, Serialize)]
pub struct Lead {
    pub id: i64,
    pub fingerprint: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub region: Region,
    pub url: String,
    pub source: SourceKind,
    pub salary: Option<String>,
    pub score: i64,
    pub posted_at: Option<String>,
    pub found_at: String,
    pub status: LeadStatus,
    pub cover_letter_path: Option<String>,
    pub application_draft_path: Option<String>,
    pub apply_attempts: i64,
    pub last_error: Option<String>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = ParseLeadError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let region = row.region.parse().map_err(|_| ParseLeadError {
            id: row.id,
            field: "region",
            value: row.region.clone(),
        })?;
        let source = row.source.parse().map_err(|_| ParseLeadError {
            id: row.id,
            field: "source",
            value: row.source.clone(),
        })?;
        let status = row.status.parse().map_err(|_| ParseLeadError {
            id: row.id,
            field: "status",
            value: row.status.clone(),
        })?;

        Ok(Lead {
            id: row.id,
            fingerprint: row.fingerprint,
            title: row.title,
            company: row.company,
            location: row.location,
            region,
            url: row.url,
            source,
            salary: row.salary,
            score: row.score,
            posted_at: row.posted_at,
            found_at: row.found_at,
            status,
            cover_letter_path: row.cover_letter_path,
            application_draft_path: row.application_draft_path,
            apply_attempts: row.apply_attempts,
            last_error: row.last_error,
        })
    }
}
