use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobpilotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Source error: {0}")]
    Source(#[from] crate::sources::SourceError),

    #[error("Draft error: {0}")]
    Draft(#[from] crate::drafts::DraftError),

    #[error("Submission error: {0}")]
    Submit(#[from] crate::submit::SubmitError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Lead {0} not found")]
    LeadNotFound(i64),

    #[error(transparent)]
    InvalidLead(#[from] crate::leads::ParseLeadError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Unknown region '{0}'")]
    UnknownRegion(String),

    #[error("Unknown status '{0}'")]
    UnknownStatus(String),
}

pub type Result<T> = std::result::Result<T, JobpilotError>;
