//! Status controller: read/query views over the lead store plus the
//! manual-transition operations used by operator tooling.
//!
//! The automated pipeline goes through the compare-and-set repo
//! functions; everything here that changes state is an explicit
//! operator override and uses the force path.

use chrono::Utc;
use tracing::info;

use crate::db::lead_repo::{self, LeadFilter};
use crate::db::Database;
use crate::error::{JobpilotError, Result};
use crate::leads::{Lead, LeadStatus, Region};

pub struct StatusController {
    db: Database,
    max_attempts: i64,
}

impl StatusController {
    pub fn new(db: Database, max_attempts: i64) -> Self {
        Self { db, max_attempts }
    }

    /// Read-only listing, filtered by status and/or region.
    pub fn list(
        &self,
        status: Option<LeadStatus>,
        region: Option<Region>,
    ) -> Result<Vec<Lead>> {
        let filter = LeadFilter {
            status: status.map(|s| s.as_str().to_string()),
            region: region.map(|r| r.as_str().to_string()),
            limit: Some(500),
            ..Default::default()
        };
        let (rows, _) = lead_repo::query(&self.db, &filter)?;
        rows.into_iter()
            .map(|row| Lead::try_from(row).map_err(JobpilotError::from))
            .collect()
    }

    pub fn get(&self, id: i64) -> Result<Lead> {
        let row = lead_repo::find_by_id(&self.db, id)?
            .ok_or(JobpilotError::LeadNotFound(id))?;
        Ok(Lead::try_from(row)?)
    }

    /// Manual override: the operator applied outside the automated
    /// flow. Always permitted, whatever the current status.
    pub fn mark_applied(&self, id: i64) -> Result<Lead> {
        self.force(id, LeadStatus::Applied)
    }

    /// Manual override for the operator-driven stages
    /// (interviewing / rejected / offer), and for corrections.
    pub fn set_status(&self, id: i64, status: LeadStatus) -> Result<Lead> {
        self.force(id, status)
    }

    fn force(&self, id: i64, status: LeadStatus) -> Result<Lead> {
        let now = Utc::now().to_rfc3339();
        let changed = lead_repo::force_status(&self.db, id, status.as_str(), &now)?;
        if !changed {
            return Err(JobpilotError::LeadNotFound(id));
        }
        info!("Lead {} manually set to {}", id, status);
        self.get(id)
    }

    /// Leads the next pipeline stage should claim, best-scoring first.
    ///
    /// For `cover_ready` this excludes leads whose attempts are
    /// exhausted, so `apply_failed` candidates never resurface.
    pub fn next_actionable(
        &self,
        status: LeadStatus,
        region: Option<Region>,
    ) -> Result<Vec<Lead>> {
        let max_attempts = match status {
            LeadStatus::CoverReady => Some(self.max_attempts),
            _ => None,
        };
        let rows = lead_repo::next_actionable(
            &self.db,
            status.as_str(),
            region.map(|r| r.as_str()).as_deref(),
            max_attempts,
        )?;
        rows.into_iter()
            .map(|row| Lead::try_from(row).map_err(JobpilotError::from))
            .collect()
    }

    /// Per-status counts for summaries.
    pub fn status_counts(&self) -> Result<Vec<(String, u64)>> {
        Ok(lead_repo::status_counts(&self.db)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::lead_repo::{insert_if_absent, mark_cover_ready, record_attempt_failure, InsertOutcome, NewLead};

    fn controller_with_leads(n: usize) -> (StatusController, Vec<i64>) {
        let db = Database::open_in_memory().unwrap();
        let mut ids = Vec::new();
        for i in 0..n {
            let lead = NewLead {
                fingerprint: format!("fp-{}", i),
                title: "Junior AI Engineer".to_string(),
                company: format!("Company {}", i),
                location: "London".to_string(),
                region: "uk".to_string(),
                url: format!("https://jobs.example/{}", i),
                source: "adzuna".to_string(),
                salary: None,
                score: i as i64,
                posted_at: None,
                found_at: "2026-01-01T00:00:00Z".to_string(),
            };
            match insert_if_absent(&db, &lead).unwrap() {
                InsertOutcome::Inserted(id) => ids.push(id),
                other => panic!("expected insert, got {:?}", other),
            }
        }
        (StatusController::new(db, 3), ids)
    }

    #[test]
    fn test_get_and_not_found() {
        let (controller, ids) = controller_with_leads(1);
        let lead = controller.get(ids[0]).unwrap();
        assert_eq!(lead.status, LeadStatus::Found);

        let err = controller.get(999).unwrap_err();
        assert!(matches!(err, JobpilotError::LeadNotFound(999)));
    }

    #[test]
    fn test_list_by_status() {
        let (controller, ids) = controller_with_leads(3);
        controller.mark_applied(ids[0]).unwrap();

        let found = controller.list(Some(LeadStatus::Found), None).unwrap();
        assert_eq!(found.len(), 2);

        let applied = controller.list(Some(LeadStatus::Applied), None).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].id, ids[0]);

        let all = controller.list(None, None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_mark_applied_is_always_permitted() {
        let (controller, ids) = controller_with_leads(1);
        // Straight from `found`, skipping cover_ready: operator applied
        // by hand outside the automated flow.
        let lead = controller.mark_applied(ids[0]).unwrap();
        assert_eq!(lead.status, LeadStatus::Applied);
    }

    #[test]
    fn test_set_status_operator_stages() {
        let (controller, ids) = controller_with_leads(1);
        controller.mark_applied(ids[0]).unwrap();

        let lead = controller.set_status(ids[0], LeadStatus::Interviewing).unwrap();
        assert_eq!(lead.status, LeadStatus::Interviewing);

        let lead = controller.set_status(ids[0], LeadStatus::Offer).unwrap();
        assert_eq!(lead.status, LeadStatus::Offer);
    }

    #[test]
    fn test_next_actionable_orders_by_score() {
        let (controller, _ids) = controller_with_leads(3);
        let actionable = controller.next_actionable(LeadStatus::Found, None).unwrap();
        assert_eq!(actionable.len(), 3);
        assert!(actionable[0].score >= actionable[1].score);
        assert!(actionable[1].score >= actionable[2].score);
    }

    #[test]
    fn test_next_actionable_excludes_exhausted_cover_ready() {
        let (controller, ids) = controller_with_leads(2);
        let db = &controller.db;
        mark_cover_ready(db, ids[0], "/c/0", "/d/0", "2026-01-02").unwrap();
        mark_cover_ready(db, ids[1], "/c/1", "/d/1", "2026-01-02").unwrap();
        for _ in 0..3 {
            record_attempt_failure(db, ids[1], "form interaction failed", "2026-01-02").unwrap();
        }

        let actionable = controller
            .next_actionable(LeadStatus::CoverReady, None)
            .unwrap();
        assert_eq!(actionable.len(), 1);
        assert_eq!(actionable[0].id, ids[0]);
    }
}
