//! The submission engine run loop.
//!
//! Owns sequencing, idempotency, rate limiting, and store bookkeeping;
//! everything browser-shaped is behind the `QuickApplyDriver` seam.
//! One driver session, one lead at a time - parallel sessions risk the
//! site's anti-automation detection and complicate session state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::db::attempt_repo::{self, AttemptRow};
use crate::db::lead_repo;
use crate::db::Database;
use crate::leads::{Lead, LeadStatus};

use super::driver::{EntryPoint, NavAction, QuickApplyDriver, SessionState};
use super::form::FormFiller;
use super::state::{AttemptOutcome, AttemptPhase, FailReason, ReviewReport, SkipReason};
use super::SubmitError;

/// Engine limits, extracted from `SubmitConfig` so tests can drive the
/// engine without a full config.
#[derive(Debug, Clone)]
pub struct EngineLimits {
    pub max_per_run: u64,
    pub max_attempts: i64,
    pub min_delay: Duration,
    pub max_form_steps: u32,
}

impl EngineLimits {
    pub fn from_config(config: &crate::config::SubmitConfig) -> Self {
        Self {
            max_per_run: config.max_per_run,
            max_attempts: config.max_attempts,
            min_delay: Duration::from_secs(config.min_delay_secs),
            max_form_steps: config.max_form_steps,
        }
    }
}

/// Counters for one submission run. Produced even when the run is
/// cancelled; a session failure aborts before any counters exist.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub applied: u64,
    pub dry_runs: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Review-stage reports (one per dry-run attempt).
    pub reviews: Vec<ReviewReport>,
    /// True when an external stop halted the run between leads.
    pub halted: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} dry-run, {} skipped, {} failed{}",
            self.applied,
            self.dry_runs,
            self.skipped,
            self.failed,
            if self.halted { " (halted)" } else { "" }
        )
    }
}

/// Propagates run-fatal errors, contains everything else as a failed
/// attempt (after abandoning the in-flight dialog).
macro_rules! step {
    ($driver:expr, $call:expr) => {
        match $call {
            Ok(v) => v,
            Err(SubmitError::SessionExpired) => return Err(SubmitError::SessionExpired),
            Err(e) => {
                $driver.abandon().await;
                return Ok(AttemptOutcome::Failed(FailReason::Interaction(
                    e.to_string(),
                )));
            }
        }
    };
}

pub struct SubmitEngine {
    db: Database,
    limits: EngineLimits,
    filler: FormFiller,
}

impl SubmitEngine {
    pub fn new(db: Database, limits: EngineLimits, filler: FormFiller) -> Self {
        Self { db, limits, filler }
    }

    /// Runs submission over the candidate leads.
    ///
    /// The session is validated once up front; an expired session
    /// aborts the whole run with `SubmitError::SessionExpired` before
    /// any attempt is made. Cancellation is checked between leads only,
    /// so an in-flight attempt always completes.
    pub async fn run(
        &self,
        driver: &mut dyn QuickApplyDriver,
        leads: &[Lead],
        dry_run: bool,
        cancel: &AtomicBool,
    ) -> Result<RunSummary, SubmitError> {
        let _span = info_span!("submit_run", candidates = leads.len(), dry_run).entered();

        debug!("Run phase: {}", AttemptPhase::SessionCheck);
        match driver.check_session().await {
            Ok(SessionState::Valid) => {}
            Ok(SessionState::Expired) => {
                driver.close().await;
                return Err(SubmitError::SessionExpired);
            }
            Err(e) => {
                driver.close().await;
                return Err(e);
            }
        }

        let mut summary = RunSummary::default();
        let mut submissions: u64 = 0;
        let mut attempted: u64 = 0;

        for lead in leads {
            if submissions >= self.limits.max_per_run {
                info!("Run cap of {} submissions reached - hard stop", self.limits.max_per_run);
                break;
            }
            if cancel.load(Ordering::Relaxed) {
                info!("Stop requested - halting before next lead");
                summary.halted = true;
                break;
            }

            // At-most-once: the persisted status is authoritative, not
            // whatever the caller selected. A lead that reached
            // `applied` in a previous run (or crashed process) is never
            // resubmitted.
            let Some(row) = lead_repo::find_by_id(&self.db, lead.id)? else {
                continue;
            };
            let status: LeadStatus = match row.status.parse() {
                Ok(status) => status,
                Err(_) => {
                    warn!("Lead {} has unparseable status '{}' - skipping", lead.id, row.status);
                    continue;
                }
            };
            if status != LeadStatus::CoverReady {
                debug!("Lead {} is at '{}', not eligible - skipping", lead.id, status);
                continue;
            }
            if row.apply_attempts >= self.limits.max_attempts {
                debug!("Lead {} has exhausted its attempts - skipping", lead.id);
                continue;
            }

            if attempted > 0 {
                tokio::time::sleep(self.limits.min_delay).await;
            }
            attempted += 1;

            let started_at = Utc::now().to_rfc3339();
            let result = self.attempt(driver, lead, dry_run).await;
            let finished_at = Utc::now().to_rfc3339();

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Run-fatal: close the browser, surface distinctly.
                    driver.close().await;
                    return Err(e);
                }
            };

            attempt_repo::insert(
                &self.db,
                &AttemptRow {
                    id: Uuid::new_v4().to_string(),
                    lead_id: lead.id,
                    started_at,
                    finished_at: finished_at.clone(),
                    outcome: outcome.label().to_string(),
                    detail: outcome.detail(),
                },
            )?;

            match outcome {
                AttemptOutcome::Applied => {
                    let advanced = lead_repo::mark_applied(&self.db, lead.id, &finished_at)?;
                    if !advanced {
                        warn!(
                            "Lead {} submitted but was no longer at cover_ready - status left alone",
                            lead.id
                        );
                    }
                    info!("Lead {} applied: {} @ {}", lead.id, lead.title, lead.company);
                    summary.applied += 1;
                    submissions += 1;
                }
                AttemptOutcome::DryRun(report) => {
                    info!(
                        "Lead {} dry-run: would submit {} fields",
                        lead.id,
                        report.fields.len()
                    );
                    summary.reviews.push(report);
                    summary.dry_runs += 1;
                    submissions += 1;
                }
                AttemptOutcome::Skipped(reason) => {
                    info!("Lead {} skipped: {}", lead.id, reason);
                    summary.skipped += 1;
                }
                AttemptOutcome::Failed(reason) => {
                    let error = reason.to_string();
                    let attempts =
                        lead_repo::record_attempt_failure(&self.db, lead.id, &error, &finished_at)?;
                    warn!(
                        "Lead {} attempt {}/{} failed: {}",
                        lead.id, attempts, self.limits.max_attempts, error
                    );
                    if attempts >= self.limits.max_attempts {
                        let marked = lead_repo::advance_status(
                            &self.db,
                            lead.id,
                            LeadStatus::CoverReady.as_str(),
                            LeadStatus::ApplyFailed.as_str(),
                            &finished_at,
                        )?;
                        if marked {
                            info!(
                                "Lead {} marked apply_failed after {} attempts",
                                lead.id, attempts
                            );
                        }
                    }
                    summary.failed += 1;
                }
            }
        }

        driver.close().await;
        info!("Submission run complete: {}", summary);
        Ok(summary)
    }

    /// One attempt: `Navigate → FormFill → Review → Submit → Confirm`.
    /// Contained outcomes come back as `Ok`; only session expiry is an
    /// `Err` (and aborts the run).
    async fn attempt(
        &self,
        driver: &mut dyn QuickApplyDriver,
        lead: &Lead,
        dry_run: bool,
    ) -> Result<AttemptOutcome, SubmitError> {
        let _span = info_span!("attempt", lead_id = lead.id).entered();

        debug!("Lead {} phase: {}", lead.id, AttemptPhase::Navigate);
        let entry = step!(driver, driver.open_posting(&lead.url).await);
        if entry == EntryPoint::External {
            return Ok(AttemptOutcome::Skipped(SkipReason::UnsupportedFlow));
        }

        let has_form = step!(driver, driver.begin_application().await);
        if !has_form {
            driver.abandon().await;
            return Ok(AttemptOutcome::Skipped(SkipReason::NoFormContent));
        }

        // FormFill across the multi-step modal
        let mut report = ReviewReport {
            lead_id: lead.id,
            ..Default::default()
        };

        for step_index in 0..self.limits.max_form_steps {
            debug!(
                "Lead {} phase: {} (step {})",
                lead.id,
                AttemptPhase::FormFill,
                step_index + 1
            );

            if let Some(cv_path) = self.filler.cv_path() {
                let uploaded = step!(driver, driver.upload_resume(cv_path).await);
                report.resume_uploaded = report.resume_uploaded || uploaded;
            }

            let fields = step!(driver, driver.form_fields().await);
            for field in &fields {
                let Some(value) = self.filler.value_for(field, lead).await else {
                    continue;
                };
                // Per-field interaction errors are tolerated: a half
                // filled form can still advance, and required fields
                // will surface as Stuck.
                match driver.fill_field(field, &value).await {
                    Ok(()) => report.fields.push((field.label.clone(), value)),
                    Err(e) => debug!("Could not fill '{}': {}", field.label, e),
                }
            }

            let nav = step!(driver, driver.advance().await);
            match nav {
                NavAction::Next | NavAction::Review => continue,
                NavAction::Submit => {
                    // Review reached: in dry-run mode this is the stop line.
                    debug!("Lead {} phase: {}", lead.id, AttemptPhase::Review);
                    if dry_run {
                        driver.abandon().await;
                        return Ok(AttemptOutcome::DryRun(report));
                    }
                    debug!("Lead {} phase: {}", lead.id, AttemptPhase::Submit);
                    step!(driver, driver.submit().await);
                    debug!("Lead {} phase: {}", lead.id, AttemptPhase::Confirm);
                    let confirmed = step!(driver, driver.confirm().await);
                    return if confirmed {
                        Ok(AttemptOutcome::Applied)
                    } else {
                        Ok(AttemptOutcome::Failed(FailReason::NoConfirmation))
                    };
                }
                NavAction::Stuck => {
                    driver.abandon().await;
                    return Ok(AttemptOutcome::Failed(FailReason::NoSubmitReached));
                }
            }
        }

        driver.abandon().await;
        Ok(AttemptOutcome::Failed(FailReason::NoSubmitReached))
    }
}
