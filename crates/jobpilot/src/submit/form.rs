//! Form field answering.
//!
//! Known fields are answered from the applicant profile (identity
//! fields plus the configured answers map, longest matching key wins).
//! Unknown free-text questions go to the `AnswerGenerator` under a
//! bounded timeout; a timeout or empty answer leaves the field blank
//! and the attempt proceeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::Profile;
use crate::leads::Lead;

use super::answers::AnswerGenerator;
use super::driver::{FieldKind, FormField};

pub struct FormFiller {
    profile: Profile,
    answerer: Arc<dyn AnswerGenerator>,
    answer_timeout: Duration,
}

impl FormFiller {
    pub fn new(
        profile: Profile,
        answerer: Arc<dyn AnswerGenerator>,
        answer_timeout: Duration,
    ) -> Self {
        Self {
            profile,
            answerer,
            answer_timeout,
        }
    }

    /// Chooses a value for a field, or None to leave it blank.
    pub async fn value_for(&self, field: &FormField, lead: &Lead) -> Option<String> {
        if let Some(value) = self.known_answer(&field.label) {
            return Some(value);
        }

        // Free-text questions only; selects and checkboxes have no
        // sensible generated fallback.
        if !matches!(field.kind, FieldKind::Text | FieldKind::TextArea) {
            return None;
        }

        let question = field.label.trim();
        if question.len() < 4 {
            return None;
        }

        match tokio::time::timeout(self.answer_timeout, self.answerer.answer(question, lead)).await
        {
            Ok(answer) => answer,
            Err(_) => {
                debug!("Answer generation timed out for: {}", question);
                None
            }
        }
    }

    /// Profile-based answer for a field label: configured answers map
    /// first (longest key contained in the label wins), then the
    /// built-in identity fields.
    fn known_answer(&self, label: &str) -> Option<String> {
        let label = label.to_lowercase();

        let mut best: Option<(&String, &String)> = None;
        for (key, value) in &self.profile.answers {
            if label.contains(&key.to_lowercase()) {
                match best {
                    Some((best_key, _)) if best_key.len() >= key.len() => {}
                    _ => best = Some((key, value)),
                }
            }
        }
        if let Some((_, value)) = best {
            return Some(value.clone());
        }

        for (key, url) in &self.profile.links {
            if label.contains(&key.to_lowercase()) {
                return Some(url.clone());
            }
        }

        if label.contains("email") {
            return Some(self.profile.email.clone());
        }
        if (label.contains("phone") || label.contains("mobile")) && !self.profile.phone.is_empty() {
            return Some(self.profile.phone.clone());
        }
        if label.contains("full name") || label == "name" {
            return Some(self.profile.name.clone());
        }
        if (label.contains("location") || label.contains("city"))
            && !self.profile.location.is_empty()
        {
            return Some(self.profile.location.clone());
        }

        None
    }

    pub fn cv_path(&self) -> Option<&str> {
        self.profile.cv_path.as_deref()
    }
}
