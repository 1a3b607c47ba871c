//! Submission attempt states and terminal outcomes.
//!
//! Every attempt walks `SessionCheck → Navigate → FormFill → Review →
//! Submit → Confirm` and ends in exactly one `AttemptOutcome`. Modeling
//! this explicitly (instead of ad hoc control flow around the browser)
//! is what lets every transition be tested against a fake driver.

use std::fmt;

/// The phase an attempt is currently in. Used for spans and attempt
/// log detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Idle,
    SessionCheck,
    Navigate,
    FormFill,
    Review,
    Submit,
    Confirm,
}

impl AttemptPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptPhase::Idle => "idle",
            AttemptPhase::SessionCheck => "session_check",
            AttemptPhase::Navigate => "navigate",
            AttemptPhase::FormFill => "form_fill",
            AttemptPhase::Review => "review",
            AttemptPhase::Submit => "submit",
            AttemptPhase::Confirm => "confirm",
        }
    }
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an attempt was skipped. Skips are not failures: they do not
/// count against the lead's attempt budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The posting has no quick-apply control (external application).
    UnsupportedFlow,
    /// A dialog opened but contained no form content (nav dropdown,
    /// external redirect overlay).
    NoFormContent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedFlow => f.write_str("unsupported_flow"),
            SkipReason::NoFormContent => f.write_str("no_form_content"),
        }
    }
}

/// Why an attempt failed. Failures increment the lead's attempt count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// Submission was performed but the success indicator never
    /// appeared. Treated as failure, never as success.
    NoConfirmation,
    /// The multi-step form never offered a submit action.
    NoSubmitReached,
    /// An element went missing, a click failed, navigation timed out,
    /// or the site presented an anti-automation challenge.
    Interaction(String),
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::NoConfirmation => f.write_str("no_confirmation"),
            FailReason::NoSubmitReached => f.write_str("no_submit_reached"),
            FailReason::Interaction(detail) => write!(f, "interaction: {}", detail),
        }
    }
}

/// What the engine would have submitted. Produced at the `Review` stage
/// of every attempt and reported instead of submitting in dry-run mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewReport {
    pub lead_id: i64,
    /// (field label, value) pairs that were filled.
    pub fields: Vec<(String, String)>,
    pub resume_uploaded: bool,
}

/// Terminal outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Submitted and confirmed.
    Applied,
    /// Dry-run: stopped at review, nothing submitted.
    DryRun(ReviewReport),
    Skipped(SkipReason),
    Failed(FailReason),
}

impl AttemptOutcome {
    /// Label stored in the attempts audit table.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Applied => "applied",
            AttemptOutcome::DryRun(_) => "dry_run",
            AttemptOutcome::Skipped(_) => "skipped",
            AttemptOutcome::Failed(_) => "failed",
        }
    }

    /// Detail string stored next to the label.
    pub fn detail(&self) -> Option<String> {
        match self {
            AttemptOutcome::Applied => None,
            AttemptOutcome::DryRun(report) => {
                Some(format!("{} fields reviewed", report.fields.len()))
            }
            AttemptOutcome::Skipped(reason) => Some(reason.to_string()),
            AttemptOutcome::Failed(reason) => Some(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(AttemptOutcome::Applied.label(), "applied");
        assert_eq!(
            AttemptOutcome::Skipped(SkipReason::UnsupportedFlow).label(),
            "skipped"
        );
        assert_eq!(
            AttemptOutcome::Failed(FailReason::NoConfirmation).label(),
            "failed"
        );
        assert_eq!(AttemptOutcome::DryRun(ReviewReport::default()).label(), "dry_run");
    }

    #[test]
    fn test_fail_detail_strings() {
        assert_eq!(
            AttemptOutcome::Failed(FailReason::NoConfirmation).detail(),
            Some("no_confirmation".to_string())
        );
        let detail = AttemptOutcome::Failed(FailReason::Interaction("modal gone".to_string()))
            .detail()
            .unwrap();
        assert!(detail.contains("modal gone"));
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(AttemptPhase::SessionCheck.as_str(), "session_check");
        assert_eq!(AttemptPhase::Confirm.as_str(), "confirm");
    }
}
