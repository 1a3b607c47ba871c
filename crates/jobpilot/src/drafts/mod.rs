//! Draft Generator contract.
//!
//! Cover-letter and application-draft generation is an external
//! collaborator; only its command/file interface lives here. The
//! configured command receives the lead as JSON on stdin and must print
//! a JSON object with the two artifact paths on stdout. On success the
//! store records the paths and advances the lead to `cover_ready`.

use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::DraftsConfig;
use crate::db::lead_repo;
use crate::db::Database;
use crate::leads::Lead;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("No draft command configured")]
    NoCommand,

    #[error("Failed to spawn draft command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Draft command timed out after {0}s")]
    Timeout(u64),

    #[error("Draft command exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("Draft command produced invalid output: {0}")]
    BadOutput(String),

    #[error("Lead {0} was not at status 'found'")]
    WrongStatus(i64),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

/// What the external command must print on stdout.
#[derive(Debug, Deserialize)]
struct DraftArtifacts {
    cover_letter_path: String,
    application_draft_path: String,
}

/// Counters for one drafting pass.
#[derive(Debug, Default)]
pub struct DraftSummary {
    pub drafted: u64,
    pub failed: u64,
}

pub struct DraftRunner {
    db: Database,
    config: DraftsConfig,
}

impl DraftRunner {
    pub fn new(db: Database, config: DraftsConfig) -> Self {
        Self { db, config }
    }

    /// Runs the external generator for one lead and advances it to
    /// `cover_ready`.
    pub async fn draft(&self, lead: &Lead) -> Result<(), DraftError> {
        let artifacts = self.invoke(lead).await?;

        let now = Utc::now().to_rfc3339();
        let advanced = lead_repo::mark_cover_ready(
            &self.db,
            lead.id,
            &artifacts.cover_letter_path,
            &artifacts.application_draft_path,
            &now,
        )?;
        if !advanced {
            return Err(DraftError::WrongStatus(lead.id));
        }

        info!(
            "Lead {} drafted: cover={} draft={}",
            lead.id, artifacts.cover_letter_path, artifacts.application_draft_path
        );
        Ok(())
    }

    /// Runs the generator over a batch. One lead's failure never stops
    /// the rest.
    pub async fn draft_all(&self, leads: &[Lead]) -> DraftSummary {
        let mut summary = DraftSummary::default();
        for lead in leads {
            match self.draft(lead).await {
                Ok(()) => summary.drafted += 1,
                Err(e) => {
                    warn!("Draft failed for lead {}: {}", lead.id, e);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn invoke(&self, lead: &Lead) -> Result<DraftArtifacts, DraftError> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or(DraftError::NoCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| DraftError::Spawn {
            command: program.clone(),
            source: e,
        })?;

        let input = serde_json::to_vec(lead).map_err(|e| DraftError::BadOutput(e.to_string()))?;
        if let Some(mut stdin) = child.stdin.take() {
            // A generator that never reads stdin is tolerated; its
            // output contract still applies.
            let _ = stdin.write_all(&input).await;
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| DraftError::Spawn {
                command: program.clone(),
                source: e,
            })?,
            Err(_) => return Err(DraftError::Timeout(self.config.timeout_secs)),
        };

        if !output.status.success() {
            return Err(DraftError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| DraftError::BadOutput(format!("{} (stdout was not artifact JSON)", e)))
    }
}
