//! Fingerprinting for cross-source deduplication.
//!
//! The same physical posting often arrives from several boards under
//! different native ids, so the primary fingerprint is built from
//! normalized (company, title, location) rather than the id. When the
//! normalized components are too degenerate to trust, we fall back to a
//! source-scoped native id: a duplicate row is recoverable, a wrong
//! merge silently loses a posting.

use regex::Regex;

use crate::sources::RawPosting;

/// Company suffixes stripped by default. Overridable in config - the
/// right list is a product decision, not a code constant.
pub const DEFAULT_COMPANY_SUFFIXES: &[&str] = &[
    "ltd",
    "limited",
    "inc",
    "llc",
    "gmbh",
    "bv",
    "pvt",
    "plc",
    "co",
    "corp",
    "corporation",
];

/// Normalizes posting fields and derives dedup fingerprints.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    company_suffixes: Vec<String>,
    non_word: Regex,
}

impl Fingerprinter {
    pub fn new(company_suffixes: &[String]) -> Self {
        Self {
            company_suffixes: company_suffixes.iter().map(|s| s.to_lowercase()).collect(),
            non_word: Regex::new(r"[^a-z0-9]+").expect("static regex"),
        }
    }

    /// Lowercase, strip punctuation, collapse whitespace.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        self.non_word
            .split(&lowered)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Company normalization additionally drops trailing legal-form
    /// suffixes ("Acme Ltd" and "Acme" must collapse).
    pub fn normalize_company(&self, company: &str) -> String {
        let normalized = self.normalize(company);
        let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
        while tokens.len() > 1 {
            let last = tokens[tokens.len() - 1];
            if self.company_suffixes.iter().any(|s| s == last) {
                tokens.pop();
            } else {
                break;
            }
        }
        tokens.join(" ")
    }

    /// Derives the dedup fingerprint for a raw posting.
    ///
    /// Returns `None` for postings that are undedupable (no usable
    /// identity fields and no native id); the aggregator rejects those.
    pub fn fingerprint(&self, posting: &RawPosting) -> Option<String> {
        let company = self.normalize_company(&posting.company);
        let title = self.normalize(&posting.title);
        let location = self.normalize(&posting.location);

        if !company.is_empty() && !title.is_empty() {
            return Some(format!("co={}|title={}|loc={}", company, title, location));
        }

        // Ambiguous normalization: fall back to the source-native id so
        // we never merge unrelated postings.
        match posting.native_id.as_deref() {
            Some(id) if !id.is_empty() => {
                Some(format!("src={}|id={}", posting.source.as_str(), id))
            }
            _ => None,
        }
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        let suffixes: Vec<String> = DEFAULT_COMPANY_SUFFIXES
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::new(&suffixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::Region;
    use crate::sources::{RawPosting, SourceKind};

    fn posting(source: SourceKind, id: Option<&str>, title: &str, company: &str, location: &str) -> RawPosting {
        RawPosting {
            source,
            native_id: id.map(|s| s.to_string()),
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            url: "https://jobs.example/x".to_string(),
            salary: None,
            posted_at: None,
            region: Region::Uk,
        }
    }

    #[test]
    fn test_normalize_collapses_punctuation_and_case() {
        let fp = Fingerprinter::default();
        assert_eq!(fp.normalize("  Junior, AI-Engineer!  "), "junior ai engineer");
        assert_eq!(fp.normalize("Full-Stack / Backend"), "full stack backend");
    }

    #[test]
    fn test_company_suffix_stripping() {
        let fp = Fingerprinter::default();
        assert_eq!(fp.normalize_company("Acme Ltd"), "acme");
        assert_eq!(fp.normalize_company("Acme Ltd."), "acme");
        assert_eq!(fp.normalize_company("ACME"), "acme");
        assert_eq!(fp.normalize_company("Initech GmbH"), "initech");
        // A suffix that is the whole name is kept.
        assert_eq!(fp.normalize_company("Ltd"), "ltd");
    }

    #[test]
    fn test_configurable_suffixes() {
        let fp = Fingerprinter::new(&["labs".to_string()]);
        assert_eq!(fp.normalize_company("Acme Labs"), "acme");
        // "ltd" is no longer in the list.
        assert_eq!(fp.normalize_company("Acme Ltd"), "acme ltd");
    }

    #[test]
    fn test_same_posting_from_two_sources_collapses() {
        let fp = Fingerprinter::default();
        let a = posting(SourceKind::Adzuna, Some("A1"), "Junior AI Engineer", "Acme", "London");
        let b = posting(SourceKind::Remotive, Some("B7"), "Junior AI Engineer", "Acme Ltd", "London");

        assert_eq!(fp.fingerprint(&a), fp.fingerprint(&b));
    }

    #[test]
    fn test_ambiguous_falls_back_to_native_id() {
        let fp = Fingerprinter::default();
        let a = posting(SourceKind::Adzuna, Some("A1"), "Engineer", "", "London");
        let b = posting(SourceKind::Remotive, Some("B7"), "Engineer", "", "London");

        let fa = fp.fingerprint(&a).unwrap();
        let fb = fp.fingerprint(&b).unwrap();
        assert_ne!(fa, fb, "ambiguous postings must not merge across sources");
        assert!(fa.starts_with("src=adzuna|id="));
    }

    #[test]
    fn test_undedupable_posting_rejected() {
        let fp = Fingerprinter::default();
        let p = posting(SourceKind::RemoteOk, None, "", "", "");
        assert!(fp.fingerprint(&p).is_none());
    }

    #[test]
    fn test_different_locations_do_not_collapse() {
        let fp = Fingerprinter::default();
        let a = posting(SourceKind::Adzuna, None, "Junior AI Engineer", "Acme", "London");
        let b = posting(SourceKind::Adzuna, None, "Junior AI Engineer", "Acme", "Berlin");
        assert_ne!(fp.fingerprint(&a), fp.fingerprint(&b));
    }
}
