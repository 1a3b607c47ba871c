//! Test harness for isolated pipeline tests.
//!
//! Provides a temp data directory, an in-memory lead store, and a
//! config wired to both, so tests can run the aggregator, draft
//! runner, status controller, and submission engine against real store
//! state without touching the network or a browser.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use jobpilot::config::Config;
use jobpilot::db::lead_repo::{self, InsertOutcome, NewLead};
use jobpilot::db::Database;
use jobpilot::leads::Lead;
use jobpilot::StatusController;

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub config: Config,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open_in_memory().expect("Failed to open test database");

        let config_json = format!(
            r#"{{
                "version": "1.0",
                "data_dir": "{}",
                "profile": {{
                    "name": "A. Candidate",
                    "email": "a@example.com",
                    "phone": "+44 1234",
                    "location": "London",
                    "answers": {{"notice period": "30 days"}}
                }},
                "search": {{"terms": ["junior engineer"]}},
                "submit": {{"min_delay_secs": 0}}
            }}"#,
            temp_dir.path().display()
        );
        let config =
            jobpilot::load_config_from_str(&config_json).expect("Failed to build test config");

        Self {
            temp_dir,
            db,
            config,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn controller(&self) -> StatusController {
        StatusController::new(self.db.clone(), self.config.submit.max_attempts)
    }

    /// Inserts a lead directly into the store and returns its typed view.
    pub fn insert_lead(&self, new_lead: &NewLead) -> Lead {
        let id = match lead_repo::insert_if_absent(&self.db, new_lead).expect("insert failed") {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected a fresh insert, got {:?}", other),
        };
        self.lead(id)
    }

    /// Re-reads a lead's current state from the store.
    pub fn lead(&self, id: i64) -> Lead {
        Lead::try_from(
            lead_repo::find_by_id(&self.db, id)
                .expect("find failed")
                .expect("lead missing"),
        )
        .expect("lead row did not parse")
    }

    /// A draft command that writes both artifacts into the temp dir and
    /// prints their paths as the contract requires.
    pub fn working_draft_command(&self) -> Vec<String> {
        let cover = self.temp_path().join("cover.txt");
        let draft = self.temp_path().join("draft.txt");
        let script = format!(
            "cat > /dev/null; echo hello > {cover}; echo draft > {draft}; \
             printf '{{\"cover_letter_path\": \"%s\", \"application_draft_path\": \"%s\"}}' {cover} {draft}",
            cover = cover.display(),
            draft = draft.display(),
        );
        vec!["sh".to_string(), "-c".to_string(), script]
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.temp_path().join(name)
    }
}
