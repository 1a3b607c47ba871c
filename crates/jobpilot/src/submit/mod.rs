//! The submission engine: a rate-limited, session-authenticated
//! browser-automation client for the target site's quick-apply flow.

use thiserror::Error;

pub mod answers;
pub mod driver;
pub mod engine;
pub mod form;
pub mod quick_apply;
pub mod state;
pub mod webdriver;

pub use answers::{AnswerGenerator, LlmAnswerer, NoopAnswerer};
pub use driver::{EntryPoint, FieldKind, FormField, NavAction, QuickApplyDriver, SessionState};
pub use engine::{EngineLimits, RunSummary, SubmitEngine};
pub use form::FormFiller;
pub use quick_apply::QuickApplyFlow;
pub use state::{AttemptOutcome, AttemptPhase, FailReason, ReviewReport, SkipReason};
pub use webdriver::{WebDriverClient, WebDriverError};

/// Submission errors.
///
/// `SessionExpired` is fatal for the whole run and surfaced distinctly
/// so the operator knows to refresh the credential; everything else is
/// contained per attempt by the engine.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Session token missing or expired - refresh the quick-apply session credential")]
    SessionExpired,

    #[error("WebDriver error: {0}")]
    Driver(#[from] WebDriverError),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}
