//! End-of-cycle reporting.
//!
//! A full daily cycle (search → draft → submit) ends with one
//! cumulative status line. The line is always produced, including when
//! sub-operations failed - partial failure is normal operation here.

use std::fmt;

use crate::aggregate::AggregateSummary;
use crate::drafts::DraftSummary;
use crate::submit::RunSummary;

/// Cumulative counters for one full cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub new_leads: u64,
    pub duplicates: u64,
    pub source_errors: usize,
    pub drafts_generated: u64,
    pub draft_failures: u64,
    pub applied: u64,
    pub dry_runs: u64,
    pub submit_failures: u64,
    pub submit_skipped: u64,
    /// Whether the submission stage was aborted on an expired session.
    pub session_expired: bool,
    /// Store-wide per-status totals after the cycle.
    pub status_counts: Vec<(String, u64)>,
}

impl CycleReport {
    pub fn absorb_aggregate(&mut self, summary: &AggregateSummary) {
        self.new_leads += summary.new;
        self.duplicates += summary.duplicates;
        self.source_errors += summary.errors.len();
    }

    pub fn absorb_drafts(&mut self, summary: &DraftSummary) {
        self.drafts_generated += summary.drafted;
        self.draft_failures += summary.failed;
    }

    pub fn absorb_submit(&mut self, summary: &RunSummary) {
        self.applied += summary.applied;
        self.dry_runs += summary.dry_runs;
        self.submit_failures += summary.failed;
        self.submit_skipped += summary.skipped;
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle: {} new leads, {} duplicates, {} source errors | {} drafts ({} failed) | {} applied, {} dry-run, {} failed, {} skipped",
            self.new_leads,
            self.duplicates,
            self.source_errors,
            self.drafts_generated,
            self.draft_failures,
            self.applied,
            self.dry_runs,
            self.submit_failures,
            self.submit_skipped,
        )?;
        if self.session_expired {
            write!(f, " | SESSION EXPIRED - refresh the session token")?;
        }
        if !self.status_counts.is_empty() {
            let totals: Vec<String> = self
                .status_counts
                .iter()
                .map(|(status, count)| format!("{}={}", status, count))
                .collect();
            write!(f, " | totals: {}", totals.join(" "))?;
        }
        Ok(())
    }
}
