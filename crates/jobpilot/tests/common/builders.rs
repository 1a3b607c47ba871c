//! Builders and scripted fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;

use jobpilot::db::lead_repo::NewLead;
use jobpilot::leads::Region;
use jobpilot::sources::{JobSource, RawPosting, SourceError, SourceKind};
use jobpilot::submit::{
    EntryPoint, FieldKind, FormField, NavAction, QuickApplyDriver, SessionState, SubmitError,
};

/// Builder for `NewLead` rows.
pub struct LeadBuilder {
    lead: NewLead,
}

impl LeadBuilder {
    pub fn new(fingerprint: &str) -> Self {
        Self {
            lead: NewLead {
                fingerprint: fingerprint.to_string(),
                title: "Junior AI Engineer".to_string(),
                company: "Acme".to_string(),
                location: "London".to_string(),
                region: "uk".to_string(),
                url: format!("https://jobs.example/{}", fingerprint),
                source: "adzuna".to_string(),
                salary: None,
                score: 0,
                posted_at: None,
                found_at: "2026-01-01T00:00:00Z".to_string(),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.lead.title = title.to_string();
        self
    }

    pub fn company(mut self, company: &str) -> Self {
        self.lead.company = company.to_string();
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.lead.region = region.to_string();
        self
    }

    pub fn score(mut self, score: i64) -> Self {
        self.lead.score = score;
        self
    }

    pub fn build(self) -> NewLead {
        self.lead
    }
}

/// A source adapter that replays canned postings (or a canned failure).
pub struct ScriptedSource {
    pub kind: SourceKind,
    pub regions: Vec<Region>,
    pub postings: Vec<RawPosting>,
    pub fail: bool,
}

impl ScriptedSource {
    pub fn with_postings(kind: SourceKind, regions: Vec<Region>, postings: Vec<RawPosting>) -> Self {
        Self {
            kind,
            regions,
            postings,
            fail: false,
        }
    }

    pub fn failing(kind: SourceKind, regions: Vec<Region>) -> Self {
        Self {
            kind,
            regions,
            postings: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl JobSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn supports(&self, region: Region) -> bool {
        self.regions.contains(&region)
    }

    async fn search(&self, _region: Region, _role: &str) -> Result<Vec<RawPosting>, SourceError> {
        if self.fail {
            return Err(SourceError::Status { status: 429 });
        }
        Ok(self.postings.clone())
    }
}

/// Convenience constructor for raw postings.
pub fn posting(kind: SourceKind, id: &str, title: &str, company: &str, region: Region) -> RawPosting {
    RawPosting {
        source: kind,
        native_id: Some(id.to_string()),
        title: title.to_string(),
        company: company.to_string(),
        location: "London".to_string(),
        url: format!("https://jobs.example/{}", id),
        salary: None,
        posted_at: None,
        region,
    }
}

/// A driver that walks every quick-apply flow successfully, counting
/// true submissions.
pub struct ScriptedDriver {
    pub session: SessionState,
    pub entry: EntryPoint,
    pub confirm: bool,
    pub submits_performed: u32,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self {
            session: SessionState::Valid,
            entry: EntryPoint::QuickApply,
            confirm: true,
            submits_performed: 0,
        }
    }
}

#[async_trait]
impl QuickApplyDriver for ScriptedDriver {
    async fn check_session(&mut self) -> Result<SessionState, SubmitError> {
        Ok(self.session)
    }

    async fn open_posting(&mut self, _url: &str) -> Result<EntryPoint, SubmitError> {
        Ok(self.entry)
    }

    async fn begin_application(&mut self) -> Result<bool, SubmitError> {
        Ok(true)
    }

    async fn form_fields(&mut self) -> Result<Vec<FormField>, SubmitError> {
        Ok(vec![
            FormField {
                handle: "0".to_string(),
                label: "Email address".to_string(),
                kind: FieldKind::Text,
                options: vec![],
            },
            FormField {
                handle: "1".to_string(),
                label: "What is your notice period?".to_string(),
                kind: FieldKind::Text,
                options: vec![],
            },
        ])
    }

    async fn fill_field(&mut self, _field: &FormField, _value: &str) -> Result<(), SubmitError> {
        Ok(())
    }

    async fn upload_resume(&mut self, _path: &str) -> Result<bool, SubmitError> {
        Ok(false)
    }

    async fn advance(&mut self) -> Result<NavAction, SubmitError> {
        Ok(NavAction::Submit)
    }

    async fn submit(&mut self) -> Result<(), SubmitError> {
        self.submits_performed += 1;
        Ok(())
    }

    async fn confirm(&mut self) -> Result<bool, SubmitError> {
        Ok(self.confirm)
    }

    async fn abandon(&mut self) {}

    async fn close(&mut self) {}
}
