pub mod aggregate;
pub mod config;
pub mod db;
pub mod drafts;
pub mod error;
pub mod leads;
pub mod report;
pub mod secrets;
pub mod sources;
pub mod submit;
pub mod tracker;

pub use aggregate::{AggregateSummary, Aggregator};
pub use config::{load_config, load_config_from_str, Config};
pub use error::{ConfigError, JobpilotError, Result};
pub use leads::{Lead, LeadStatus, Region};
pub use report::CycleReport;
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use sources::{build_sources, SourceKind};
pub use submit::{EngineLimits, QuickApplyFlow, SubmitEngine, SubmitError};
pub use tracker::StatusController;
