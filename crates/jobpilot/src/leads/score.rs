//! Keyword relevance scoring for raw postings.

/// Default keywords that make a posting interesting.
pub const DEFAULT_BOOST_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
    "typescript",
    "node",
    "react",
    "ai",
    "ml",
    "machine learning",
    "fullstack",
    "full-stack",
    "full stack",
    "backend",
    "software engineer",
    "developer",
    "junior",
    "graduate",
    "associate",
    "reinforcement",
    "llm",
    "nlp",
    "docker",
    "cloud",
];

/// Default keywords that disqualify a posting for an entry-level search.
pub const DEFAULT_EXCLUDE_KEYWORDS: &[&str] = &[
    "senior",
    "lead",
    "principal",
    "director",
    "manager",
    "10+ years",
    "8+ years",
    "7+ years",
    "architect",
];

const ENTRY_LEVEL_MARKERS: &[&str] = &["junior", "graduate", "associate", "entry"];

/// Postings scoring at or below this are dropped before they reach the store.
const RELEVANCE_FLOOR: i64 = -5;

/// Scores postings by keyword match against configurable lists.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    boost: Vec<String>,
    exclude: Vec<String>,
}

impl RelevanceScorer {
    pub fn new(boost: &[String], exclude: &[String]) -> Self {
        Self {
            boost: boost.iter().map(|k| k.to_lowercase()).collect(),
            exclude: exclude.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// +2 per boost keyword, -10 per exclude keyword, +5 for explicit
    /// entry-level markers. Matched against title and company together.
    pub fn score(&self, title: &str, company: &str) -> i64 {
        let text = format!("{} {}", title, company).to_lowercase();
        let mut score = 0;
        for kw in &self.boost {
            if text.contains(kw.as_str()) {
                score += 2;
            }
        }
        for kw in &self.exclude {
            if text.contains(kw.as_str()) {
                score -= 10;
            }
        }
        if ENTRY_LEVEL_MARKERS.iter().any(|m| text.contains(m)) {
            score += 5;
        }
        score
    }

    pub fn is_relevant(&self, title: &str, company: &str) -> bool {
        self.score(title, company) > RELEVANCE_FLOOR
    }
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(
            &DEFAULT_BOOST_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>(),
            &DEFAULT_EXCLUDE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_junior_roles_score_high() {
        let scorer = RelevanceScorer::default();
        let score = scorer.score("Junior AI Engineer", "Acme");
        assert!(score > 5, "got {}", score);
        assert!(scorer.is_relevant("Junior AI Engineer", "Acme"));
    }

    #[test]
    fn test_senior_roles_filtered_out() {
        let scorer = RelevanceScorer::default();
        assert!(!scorer.is_relevant("Senior Principal Architect", "MegaCorp"));
    }

    #[test]
    fn test_mixed_signals() {
        let scorer = RelevanceScorer::default();
        // "Senior Python Developer": -10 senior, +2 python, +2 developer → -6
        assert!(!scorer.is_relevant("Senior Python Developer", "Acme"));
        // Enough boosts can outweigh one exclusion.
        let score = scorer.score("Senior Python Backend Developer, ML, Docker, Cloud", "Acme");
        assert!(score > RELEVANCE_FLOOR);
    }

    #[test]
    fn test_custom_keyword_lists() {
        let scorer = RelevanceScorer::new(
            &["rust".to_string()],
            &["intern".to_string()],
        );
        assert!(scorer.score("Rust Developer", "X") > 0);
        assert!(scorer.score("Rust Intern", "X") < 0);
    }

    #[test]
    fn test_case_insensitive() {
        let scorer = RelevanceScorer::default();
        assert_eq!(
            scorer.score("JUNIOR AI ENGINEER", "ACME"),
            scorer.score("junior ai engineer", "acme")
        );
    }
}
