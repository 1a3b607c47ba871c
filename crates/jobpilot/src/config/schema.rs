//! Configuration data model.
//!
//! One JSON document drives the whole pipeline: applicant profile,
//! search plan, dedup normalization, per-source credentials, the
//! draft-generator command, and the submission engine's limits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::leads::fingerprint::DEFAULT_COMPANY_SUFFIXES;
use crate::leads::score::{DEFAULT_BOOST_KEYWORDS, DEFAULT_EXCLUDE_KEYWORDS};
use crate::leads::Region;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,

    /// Base directory for run artifacts (snapshots). Defaults to
    /// `~/.jobpilot`.
    #[serde(default)]
    pub data_dir: Option<String>,

    pub profile: Profile,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub normalization: NormalizationConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub drafts: DraftsConfig,

    #[serde(default)]
    pub submit: SubmitConfig,

    #[serde(default)]
    pub answers: AnswersConfig,
}

/// The applicant: identity fields for known form inputs plus a map of
/// canned answers for recurring screening questions (matched by label
/// substring, longest key wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub cv_path: Option<String>,
    #[serde(default)]
    pub links: HashMap<String, String>,
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Regions searched when the caller does not narrow them.
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,

    /// Search terms sent to the boards.
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,

    /// Cap on terms per (source, region) cell, to stay under quotas.
    #[serde(default = "default_max_terms")]
    pub max_terms_per_source: usize,

    #[serde(default = "default_boost_keywords")]
    pub boost_keywords: Vec<String>,

    #[serde(default = "default_exclude_keywords")]
    pub exclude_keywords: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            terms: default_terms(),
            max_terms_per_source: default_max_terms(),
            boost_keywords: default_boost_keywords(),
            exclude_keywords: default_exclude_keywords(),
        }
    }
}

fn default_regions() -> Vec<Region> {
    Region::all().to_vec()
}

fn default_terms() -> Vec<String> {
    [
        "junior ai engineer",
        "junior software developer",
        "fullstack developer junior",
        "junior ml engineer",
        "associate software engineer python",
        "junior backend developer node",
        "graduate software engineer",
        "junior machine learning engineer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_terms() -> usize {
    5
}

fn default_boost_keywords() -> Vec<String> {
    DEFAULT_BOOST_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

fn default_exclude_keywords() -> Vec<String> {
    DEFAULT_EXCLUDE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

/// Cross-source dedup normalization knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Company legal-form suffixes stripped before fingerprinting.
    #[serde(default = "default_company_suffixes")]
    pub company_suffixes: Vec<String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            company_suffixes: default_company_suffixes(),
        }
    }
}

fn default_company_suffixes() -> Vec<String> {
    DEFAULT_COMPANY_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

/// A credential that can be given directly, as a file path, or as an
/// environment variable name (resolved in that order).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretRef {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub env_var: Option<String>,
}

impl SecretRef {
    pub fn from_env(name: &str) -> Self {
        Self {
            value: None,
            file: None,
            env_var: Some(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub adzuna: AdzunaConfig,
    #[serde(default)]
    pub remoteok: SourceToggle,
    #[serde(default)]
    pub remotive: SourceToggle,
    #[serde(default)]
    pub reed: ReedConfig,
    #[serde(default)]
    pub themuse: SourceToggle,

    /// Per-request timeout for every adapter.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            adzuna: AdzunaConfig::default(),
            remoteok: SourceToggle::default(),
            remotive: SourceToggle::default(),
            reed: ReedConfig::default(),
            themuse: SourceToggle::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SourceToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdzunaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub app_id: Option<SecretRef>,
    #[serde(default)]
    pub app_key: Option<SecretRef>,
    #[serde(default = "default_adzuna_pages")]
    pub max_pages: u32,
}

impl Default for AdzunaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app_id: Some(SecretRef::from_env("ADZUNA_APP_ID")),
            app_key: Some(SecretRef::from_env("ADZUNA_APP_KEY")),
            max_pages: default_adzuna_pages(),
        }
    }
}

fn default_adzuna_pages() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<SecretRef>,
}

impl Default for ReedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: Some(SecretRef::from_env("REED_API_KEY")),
        }
    }
}

/// The external draft-generator command. Empty command = drafts are
/// produced by other tooling and marked through the store directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftsConfig {
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_draft_timeout")]
    pub timeout_secs: u64,
}

impl Default for DraftsConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: default_draft_timeout(),
        }
    }
}

fn default_draft_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitConfig {
    /// WebDriver endpoint driving the browser (e.g. chromedriver).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Target site for the quick-apply flow.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Session cookie proving an authenticated browsing session.
    #[serde(default = "default_session_token")]
    pub session_token: SecretRef,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_cookie_domain")]
    pub cookie_domain: String,

    /// Attempts per lead before it is marked apply_failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Hard cap on submissions per run.
    #[serde(default = "default_max_per_run")]
    pub max_per_run: u64,

    /// Minimum delay between consecutive submissions.
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: u64,

    /// Timeout for individual browser interactions.
    #[serde(default = "default_nav_timeout")]
    pub nav_timeout_secs: u64,

    /// Bail-out bound on multi-step application modals.
    #[serde(default = "default_max_form_steps")]
    pub max_form_steps: u32,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            site_url: default_site_url(),
            session_token: default_session_token(),
            cookie_name: default_cookie_name(),
            cookie_domain: default_cookie_domain(),
            max_attempts: default_max_attempts(),
            max_per_run: default_max_per_run(),
            min_delay_secs: default_min_delay(),
            nav_timeout_secs: default_nav_timeout(),
            max_form_steps: default_max_form_steps(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_site_url() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_session_token() -> SecretRef {
    SecretRef::from_env("JOBPILOT_SESSION_TOKEN")
}

fn default_cookie_name() -> String {
    "li_at".to_string()
}

fn default_cookie_domain() -> String {
    ".linkedin.com".to_string()
}

fn default_max_attempts() -> i64 {
    3
}

fn default_max_per_run() -> u64 {
    20
}

fn default_min_delay() -> u64 {
    5
}

fn default_nav_timeout() -> u64 {
    30
}

fn default_max_form_steps() -> u32 {
    10
}

/// Free-text answer generation for unknown screening questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswersConfig {
    #[serde(default = "default_answers_key")]
    pub api_key: SecretRef,

    #[serde(default = "default_answers_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_answers_timeout")]
    pub timeout_secs: u64,

    /// Generated answers are truncated to this many characters.
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,
}

impl Default for AnswersConfig {
    fn default() -> Self {
        Self {
            api_key: default_answers_key(),
            endpoint: default_answers_endpoint(),
            timeout_secs: default_answers_timeout(),
            max_answer_len: default_max_answer_len(),
        }
    }
}

fn default_answers_key() -> SecretRef {
    SecretRef::from_env("GEMINI_API_KEY")
}

fn default_answers_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        .to_string()
}

fn default_answers_timeout() -> u64 {
    20
}

fn default_max_answer_len() -> usize {
    2000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "version": "1.0",
                "profile": {"name": "A. Candidate", "email": "a@example.com"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.search.regions.len(), Region::all().len());
        assert!(!config.search.terms.is_empty());
        assert_eq!(config.submit.max_attempts, 3);
        assert_eq!(config.submit.max_per_run, 20);
        assert!(config.drafts.command.is_empty());
        assert_eq!(
            config.submit.session_token.env_var.as_deref(),
            Some("JOBPILOT_SESSION_TOKEN")
        );
    }

    #[test]
    fn test_overrides_take_effect() {
        let config: Config = serde_json::from_str(
            r#"{
                "version": "1.0",
                "profile": {"name": "A", "email": "a@example.com"},
                "search": {"regions": ["uk", "remote"], "terms": ["rust developer"]},
                "normalization": {"company_suffixes": ["labs"]},
                "submit": {"max_per_run": 5, "min_delay_secs": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(config.search.regions, vec![Region::Uk, Region::Remote]);
        assert_eq!(config.search.terms, vec!["rust developer"]);
        assert_eq!(config.normalization.company_suffixes, vec!["labs"]);
        assert_eq!(config.submit.max_per_run, 5);
        // Untouched sections keep defaults.
        assert_eq!(config.submit.max_attempts, 3);
    }

    #[test]
    fn test_secret_ref_shapes() {
        let secret: SecretRef =
            serde_json::from_str(r#"{"env_var": "REED_API_KEY"}"#).unwrap();
        assert_eq!(secret.env_var.as_deref(), Some("REED_API_KEY"));
        assert!(secret.value.is_none());
        assert!(secret.file.is_none());
    }
}
