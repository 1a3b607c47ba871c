//! Lead lifecycle statuses and the rules for moving between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a lead sits in the application lifecycle.
///
/// Automated transitions only ever move forward along
/// `found → cover_ready → applied`; `apply_failed` branches off
/// `cover_ready` once attempts are exhausted. Everything past `applied`
/// is operator-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Found,
    CoverReady,
    Applied,
    Interviewing,
    Rejected,
    Offer,
    ApplyFailed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Found => "found",
            LeadStatus::CoverReady => "cover_ready",
            LeadStatus::Applied => "applied",
            LeadStatus::Interviewing => "interviewing",
            LeadStatus::Rejected => "rejected",
            LeadStatus::Offer => "offer",
            LeadStatus::ApplyFailed => "apply_failed",
        }
    }

    /// Position along the forward pipeline. `apply_failed` ranks with
    /// `applied`: both are past the point where automation may touch
    /// the lead again.
    pub fn rank(&self) -> u8 {
        match self {
            LeadStatus::Found => 0,
            LeadStatus::CoverReady => 1,
            LeadStatus::Applied | LeadStatus::ApplyFailed => 2,
            LeadStatus::Interviewing => 3,
            LeadStatus::Rejected | LeadStatus::Offer => 4,
        }
    }

    /// Whether the automated pipeline may advance a lead from `self` to
    /// `next`. Manual overrides bypass this check entirely.
    pub fn can_advance_to(&self, next: LeadStatus) -> bool {
        match (self, next) {
            (LeadStatus::Found, LeadStatus::CoverReady) => true,
            (LeadStatus::CoverReady, LeadStatus::Applied) => true,
            (LeadStatus::CoverReady, LeadStatus::ApplyFailed) => true,
            _ => false,
        }
    }

    /// Statuses the submission engine must never touch again.
    pub fn is_submission_terminal(&self) -> bool {
        self.rank() >= 2
    }

    /// All statuses, in pipeline order. Used for listings and the
    /// end-of-cycle status line.
    pub fn all() -> &'static [LeadStatus] {
        &[
            LeadStatus::Found,
            LeadStatus::CoverReady,
            LeadStatus::Applied,
            LeadStatus::Interviewing,
            LeadStatus::Rejected,
            LeadStatus::Offer,
            LeadStatus::ApplyFailed,
        ]
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "found" => Ok(LeadStatus::Found),
            "cover_ready" => Ok(LeadStatus::CoverReady),
            "applied" => Ok(LeadStatus::Applied),
            "interviewing" => Ok(LeadStatus::Interviewing),
            "rejected" => Ok(LeadStatus::Rejected),
            "offer" => Ok(LeadStatus::Offer),
            "apply_failed" => Ok(LeadStatus::ApplyFailed),
            other => Err(format!("unknown lead status '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_statuses() {
        for status in LeadStatus::all() {
            let parsed: LeadStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!("pending".parse::<LeadStatus>().is_err());
        assert!("".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn test_forward_transitions() {
        assert!(LeadStatus::Found.can_advance_to(LeadStatus::CoverReady));
        assert!(LeadStatus::CoverReady.can_advance_to(LeadStatus::Applied));
        assert!(LeadStatus::CoverReady.can_advance_to(LeadStatus::ApplyFailed));
    }

    #[test]
    fn test_no_automatic_regression() {
        assert!(!LeadStatus::Applied.can_advance_to(LeadStatus::Found));
        assert!(!LeadStatus::Applied.can_advance_to(LeadStatus::CoverReady));
        assert!(!LeadStatus::CoverReady.can_advance_to(LeadStatus::Found));
        assert!(!LeadStatus::ApplyFailed.can_advance_to(LeadStatus::Applied));
    }

    #[test]
    fn test_no_skipping_stages() {
        assert!(!LeadStatus::Found.can_advance_to(LeadStatus::Applied));
        assert!(!LeadStatus::Found.can_advance_to(LeadStatus::ApplyFailed));
    }

    #[test]
    fn test_submission_terminal() {
        assert!(LeadStatus::Applied.is_submission_terminal());
        assert!(LeadStatus::ApplyFailed.is_submission_terminal());
        assert!(LeadStatus::Interviewing.is_submission_terminal());
        assert!(!LeadStatus::CoverReady.is_submission_terminal());
        assert!(!LeadStatus::Found.is_submission_terminal());
    }

    #[test]
    fn test_rank_is_monotone_along_pipeline() {
        assert!(LeadStatus::Found.rank() < LeadStatus::CoverReady.rank());
        assert!(LeadStatus::CoverReady.rank() < LeadStatus::Applied.rank());
        assert!(LeadStatus::Applied.rank() < LeadStatus::Interviewing.rank());
        assert!(LeadStatus::Interviewing.rank() < LeadStatus::Offer.rank());
    }
}
