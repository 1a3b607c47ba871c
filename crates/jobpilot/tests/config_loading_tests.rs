//! Config loading against the embedded JSON Schema.

use jobpilot::config::Config;
use jobpilot::leads::Region;
use jobpilot::load_config_from_str;

const FULL_CONFIG: &str = r#"{
    "version": "1.0",
    "data_dir": "/tmp/jobpilot-test",
    "profile": {
        "name": "A. Candidate",
        "email": "a@example.com",
        "phone": "+44 1234",
        "location": "London, UK",
        "cv_path": "/data/cv.pdf",
        "links": {
            "linkedin": "https://linkedin.example/in/cand",
            "github": "https://github.example/cand"
        },
        "answers": {
            "notice period": "30 days",
            "sponsorship": "Yes",
            "years of experience": "1"
        }
    },
    "search": {
        "regions": ["uk", "remote"],
        "terms": ["junior ai engineer", "graduate software engineer"],
        "max_terms_per_source": 2
    },
    "normalization": {
        "company_suffixes": ["ltd", "limited", "gmbh"]
    },
    "sources": {
        "adzuna": {
            "enabled": true,
            "app_id": {"env_var": "ADZUNA_APP_ID"},
            "app_key": {"env_var": "ADZUNA_APP_KEY"},
            "max_pages": 2
        },
        "reed": {
            "enabled": true,
            "api_key": {"file": "/run/secrets/reed"}
        },
        "remotive": {"enabled": false},
        "request_timeout_secs": 10
    },
    "drafts": {
        "command": ["python3", "/opt/drafts/generate.py"],
        "timeout_secs": 30
    },
    "submit": {
        "webdriver_url": "http://localhost:9515",
        "session_token": {"env_var": "JOBPILOT_SESSION_TOKEN"},
        "max_attempts": 2,
        "max_per_run": 10,
        "min_delay_secs": 4
    },
    "answers": {
        "api_key": {"env_var": "GEMINI_API_KEY"},
        "timeout_secs": 15
    }
}"#;

#[test]
fn test_full_config_document_loads() {
    let config: Config = load_config_from_str(FULL_CONFIG).unwrap();

    assert_eq!(config.search.regions, vec![Region::Uk, Region::Remote]);
    assert_eq!(config.search.max_terms_per_source, 2);
    assert_eq!(config.normalization.company_suffixes.len(), 3);
    assert!(!config.sources.remotive.enabled);
    assert_eq!(config.sources.adzuna.max_pages, 2);
    assert_eq!(
        config.sources.reed.api_key.as_ref().unwrap().file.as_deref(),
        Some("/run/secrets/reed")
    );
    assert_eq!(config.drafts.command[0], "python3");
    assert_eq!(config.submit.max_attempts, 2);
    assert_eq!(config.submit.max_per_run, 10);
    assert_eq!(config.answers.timeout_secs, 15);
    assert_eq!(
        config.profile.answers.get("notice period").map(|s| s.as_str()),
        Some("30 days")
    );
}

#[test]
fn test_unknown_top_level_key_rejected() {
    let bad = r#"{
        "version": "1.0",
        "profile": {"name": "A", "email": "a@b.c"},
        "tracker": {"path": "/tmp/tracker.csv"}
    }"#;
    assert!(load_config_from_str(bad).is_err());
}

#[test]
fn test_unknown_profile_key_rejected() {
    let bad = r#"{
        "version": "1.0",
        "profile": {"name": "A", "email": "a@b.c", "age": 30}
    }"#;
    assert!(load_config_from_str(bad).is_err());
}

#[test]
fn test_misshaped_secret_ref_rejected() {
    let bad = r#"{
        "version": "1.0",
        "profile": {"name": "A", "email": "a@b.c"},
        "sources": {"reed": {"api_key": "plain-string"}}
    }"#;
    assert!(load_config_from_str(bad).is_err());
}

#[test]
fn test_defaults_fill_untouched_sections() {
    let minimal = r#"{
        "version": "1.0",
        "profile": {"name": "A", "email": "a@b.c"}
    }"#;
    let config = load_config_from_str(minimal).unwrap();

    assert_eq!(config.submit.max_attempts, 3);
    assert_eq!(config.submit.cookie_name, "li_at");
    assert_eq!(config.sources.request_timeout_secs, 15);
    assert!(config.sources.adzuna.enabled);
    assert!(config.search.terms.len() >= 5);
}
