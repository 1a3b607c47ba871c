//! The driver seam between the submission state machine and the
//! browser.
//!
//! The engine only ever talks to this trait; the production
//! implementation (`QuickApplyFlow`) drives a real browser over
//! WebDriver, and tests script a fake. Keeping the seam here is what
//! makes every state transition of §the engine independently testable.

use async_trait::async_trait;

use super::SubmitError;

/// Result of validating the stored session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    Expired,
}

/// What kind of application flow a posting offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// In-page quick-apply control present - automatable.
    QuickApply,
    /// External application flow - not automatable, skip.
    External,
}

/// The navigation action available on the current form step.
///
/// `advance()` clicks through `Next`/`Review` itself but never clicks
/// submit - it only reports `Submit` so the engine can stop at review
/// in dry-run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Next,
    Review,
    Submit,
    /// No usable navigation control found.
    Stuck,
}

/// Kinds of form inputs the flow declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Select,
    Checkbox,
    Radio,
}

/// One declared form field on the current step.
#[derive(Debug, Clone)]
pub struct FormField {
    /// Driver-scoped handle used to address the element when filling.
    pub handle: String,
    /// The visible label text, used to choose an answer.
    pub label: String,
    pub kind: FieldKind,
    /// Choices for Select/Radio fields.
    pub options: Vec<String>,
}

/// Browser-automation operations the submission engine needs.
///
/// Implementations own all site-specific selectors and waiting; the
/// engine owns sequencing, idempotency, and bookkeeping.
#[async_trait]
pub trait QuickApplyDriver: Send {
    /// Validates the stored session credential against the site.
    async fn check_session(&mut self) -> Result<SessionState, SubmitError>;

    /// Opens a posting and reports which application flow it offers.
    async fn open_posting(&mut self, url: &str) -> Result<EntryPoint, SubmitError>;

    /// Starts the quick-apply flow. Returns false when a dialog opened
    /// without any form content.
    async fn begin_application(&mut self) -> Result<bool, SubmitError>;

    /// Declared form fields on the current step.
    async fn form_fields(&mut self) -> Result<Vec<FormField>, SubmitError>;

    /// Fills one field. Per-field errors are the caller's to tolerate.
    async fn fill_field(&mut self, field: &FormField, value: &str) -> Result<(), SubmitError>;

    /// Uploads the resume if the step asks for one. Returns whether an
    /// upload happened.
    async fn upload_resume(&mut self, path: &str) -> Result<bool, SubmitError>;

    /// Advances the multi-step form. See `NavAction` for the submit
    /// exception.
    async fn advance(&mut self) -> Result<NavAction, SubmitError>;

    /// Performs the true submission action. Live mode only.
    async fn submit(&mut self) -> Result<(), SubmitError>;

    /// Checks for the post-submission success indicator.
    async fn confirm(&mut self) -> Result<bool, SubmitError>;

    /// Abandons the current attempt, closing any open dialog.
    /// Best-effort; must not fail.
    async fn abandon(&mut self);

    /// Ends the browser session at the end of the run. Best-effort.
    async fn close(&mut self);
}
