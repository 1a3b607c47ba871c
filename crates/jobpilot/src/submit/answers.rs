//! Free-text answer generation for unknown screening questions.
//!
//! A pluggable capability with a bounded-timeout contract: answer or
//! blank, never a hard dependency. When no API key is configured the
//! `NoopAnswerer` is used and unknown fields stay blank.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{AnswersConfig, Profile};
use crate::leads::Lead;

/// Answers one free-text application question, or declines.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Returns an answer for the question, or None to leave the field
    /// blank. Implementations must be failure-tolerant: any internal
    /// error maps to None.
    async fn answer(&self, question: &str, lead: &Lead) -> Option<String>;
}

/// Always declines. Used when answer generation is unconfigured.
pub struct NoopAnswerer;

#[async_trait]
impl AnswerGenerator for NoopAnswerer {
    async fn answer(&self, _question: &str, _lead: &Lead) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// REST text-generation client with a per-run answer cache.
///
/// The same screening questions repeat across postings, so answers are
/// cached by question text for the lifetime of the engine run.
pub struct LlmAnswerer {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    profile_facts: String,
    max_answer_len: usize,
    cache: Mutex<HashMap<String, String>>,
}

impl LlmAnswerer {
    pub fn new(
        config: &AnswersConfig,
        api_key: SecretString,
        profile: &Profile,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
            profile_facts: Self::profile_facts(profile),
            max_answer_len: config.max_answer_len,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn profile_facts(profile: &Profile) -> String {
        let mut facts = vec![
            format!("- Name: {}", profile.name),
            format!("- Email: {}", profile.email),
        ];
        if !profile.location.is_empty() {
            facts.push(format!("- Based in: {}", profile.location));
        }
        for (label, url) in &profile.links {
            facts.push(format!("- {}: {}", label, url));
        }
        for (topic, answer) in &profile.answers {
            facts.push(format!("- {}: {}", topic, answer));
        }
        facts.join("\n")
    }

    fn build_prompt(&self, question: &str, lead: &Lead) -> String {
        format!(
            "You are filling out a job application form on behalf of a candidate \
             applying for \"{}\" at {}.\n\n\
             Form question: \"{}\"\n\n\
             Candidate facts:\n{}\n\n\
             Reply with ONLY the answer (1-3 sentences, first person, professional). No preamble.",
            lead.title, lead.company, question, self.profile_facts
        )
    }

    async fn call(&self, prompt: &str) -> Option<String> {
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"maxOutputTokens": 200, "temperature": 0.4},
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Answer generation returned HTTP {}", r.status());
                return None;
            }
            Err(e) => {
                warn!("Answer generation request failed: {}", e);
                return None;
            }
        };

        let parsed: GenerateResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Answer generation response unreadable: {}", e);
                return None;
            }
        };

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerer {
    async fn answer(&self, question: &str, lead: &Lead) -> Option<String> {
        if question.trim().len() < 4 {
            return None;
        }

        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(question) {
                debug!("Answer cache hit for question: {}", question);
                return Some(cached.clone());
            }
        }

        let prompt = self.build_prompt(question, lead);
        let answer = self.call(&prompt).await?;
        let answer: String = answer.chars().take(self.max_answer_len).collect();

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(question.to_string(), answer.clone());
        }
        Some(answer)
    }
}
