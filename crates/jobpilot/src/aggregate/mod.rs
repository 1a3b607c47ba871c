//! The aggregator: fans out to every configured source adapter,
//! deduplicates the combined results against the lead store, and
//! inserts new leads with status `found`.
//!
//! Sources are queried concurrently (independent network calls), but
//! cells within one source run sequentially so each adapter's own
//! politeness delays mean something. All store writes happen after the
//! fan-out, through the single-writer `Database` handle.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::config::Config;
use crate::db::lead_repo::{self, InsertOutcome, NewLead};
use crate::db::Database;
use crate::error::Result;
use crate::leads::{Fingerprinter, Region, RelevanceScorer};
use crate::sources::{JobSource, RawPosting, SourceKind};

/// Counters for one aggregation run. Always produced, even when some
/// sources failed.
#[derive(Debug, Default)]
pub struct AggregateSummary {
    /// Leads inserted with status `found`.
    pub new: u64,
    /// Postings that matched an existing fingerprint.
    pub duplicates: u64,
    /// Postings dropped before the store (irrelevant, filtered out, or
    /// undedupable).
    pub rejected: u64,
    /// Per-source failures, contained and reported.
    pub errors: Vec<(SourceKind, String)>,
}

impl fmt::Display for AggregateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} duplicates, {} rejected, {} source errors",
            self.new,
            self.duplicates,
            self.rejected,
            self.errors.len()
        )
    }
}

/// Entry in the per-run snapshot artifact.
#[derive(Debug, Serialize)]
struct SnapshotEntry<'a> {
    title: &'a str,
    company: &'a str,
    location: &'a str,
    region: &'a str,
    source: &'a str,
    url: &'a str,
    score: i64,
}

pub struct Aggregator {
    db: Database,
    sources: Vec<Box<dyn JobSource>>,
    fingerprinter: Fingerprinter,
    scorer: RelevanceScorer,
    terms: Vec<String>,
    max_terms_per_source: usize,
    snapshot_dir: Option<PathBuf>,
}

impl Aggregator {
    pub fn new(db: Database, sources: Vec<Box<dyn JobSource>>, config: &Config) -> Self {
        let snapshot_dir = config
            .data_dir
            .as_ref()
            .map(|d| Path::new(d).join("snapshots"));
        Self {
            db,
            sources,
            fingerprinter: Fingerprinter::new(&config.normalization.company_suffixes),
            scorer: RelevanceScorer::new(
                &config.search.boost_keywords,
                &config.search.exclude_keywords,
            ),
            terms: config.search.terms.clone(),
            max_terms_per_source: config.search.max_terms_per_source.max(1),
            snapshot_dir,
        }
    }

    /// Runs one aggregation over the given regions.
    ///
    /// `role_filter` is applied client-side as a case-insensitive
    /// substring match on the normalized title - not all boards filter
    /// server-side consistently.
    pub async fn run(
        &self,
        regions: &[Region],
        role_filter: Option<&str>,
    ) -> Result<AggregateSummary> {
        let _span = info_span!("aggregate", regions = regions.len()).entered();
        let mut summary = AggregateSummary::default();

        let futures = self
            .sources
            .iter()
            .map(|source| self.query_source(source.as_ref(), regions));
        let results = join_all(futures).await;

        let mut postings = Vec::new();
        for (kind, source_postings, source_errors) in results {
            info!(
                "Source '{}': {} postings, {} errors",
                kind,
                source_postings.len(),
                source_errors.len()
            );
            postings.extend(source_postings);
            summary
                .errors
                .extend(source_errors.into_iter().map(|e| (kind, e)));
        }

        // Collapse within-batch duplicates before touching the store so
        // a posting seen by two sources in the same run counts once.
        let mut by_fingerprint: HashMap<String, RawPosting> = HashMap::new();
        for posting in postings {
            if !self.scorer.is_relevant(&posting.title, &posting.company) {
                summary.rejected += 1;
                continue;
            }
            if let Some(filter) = role_filter {
                let title = self.fingerprinter.normalize(&posting.title);
                if !title.contains(&filter.to_lowercase()) {
                    summary.rejected += 1;
                    continue;
                }
            }
            match self.fingerprinter.fingerprint(&posting) {
                Some(fingerprint) => {
                    // First sighting in this batch wins.
                    by_fingerprint.entry(fingerprint).or_insert(posting);
                }
                None => {
                    warn!(
                        "Rejecting undedupable posting from {}: '{}'",
                        posting.source, posting.title
                    );
                    summary.rejected += 1;
                }
            }
        }

        let now = Utc::now().to_rfc3339();
        let mut snapshot: Vec<(i64, NewLead)> = Vec::new();
        for (fingerprint, posting) in by_fingerprint {
            let score = self.scorer.score(&posting.title, &posting.company);
            let lead = NewLead {
                fingerprint,
                title: posting.title,
                company: posting.company,
                location: posting.location,
                region: posting.region.as_str().to_string(),
                url: posting.url,
                source: posting.source.as_str().to_string(),
                salary: posting.salary,
                score,
                posted_at: posting.posted_at,
                found_at: now.clone(),
            };
            match lead_repo::insert_if_absent(&self.db, &lead)? {
                InsertOutcome::Inserted(_) => summary.new += 1,
                InsertOutcome::Duplicate(_) => summary.duplicates += 1,
            }
            snapshot.push((score, lead));
        }

        self.write_snapshot(&mut snapshot);

        info!("Aggregation complete: {}", summary);
        Ok(summary)
    }

    /// Queries every supported (region, term) cell of one source,
    /// sequentially. Failures are contained per cell.
    async fn query_source(
        &self,
        source: &dyn JobSource,
        regions: &[Region],
    ) -> (SourceKind, Vec<RawPosting>, Vec<String>) {
        let kind = source.kind();
        let mut postings = Vec::new();
        let mut errors = Vec::new();

        for &region in regions {
            if !source.supports(region) {
                continue;
            }
            for term in self.terms.iter().take(self.max_terms_per_source) {
                match source.search(region, term).await {
                    Ok(found) => postings.extend(found),
                    Err(e) => {
                        warn!("Source '{}' failed for {}/{}: {}", kind, region, term, e);
                        errors.push(format!("{}/{}: {}", region, term, e));
                    }
                }
            }
        }

        (kind, postings, errors)
    }

    /// Writes the per-run snapshot artifact (top postings by score).
    /// Best-effort: a snapshot failure never fails the run.
    fn write_snapshot(&self, snapshot: &mut Vec<(i64, NewLead)>) {
        let Some(dir) = &self.snapshot_dir else {
            return;
        };
        snapshot.sort_by(|a, b| b.0.cmp(&a.0));
        let entries: Vec<SnapshotEntry<'_>> = snapshot
            .iter()
            .take(30)
            .map(|(score, lead)| SnapshotEntry {
                title: &lead.title,
                company: &lead.company,
                location: &lead.location,
                region: &lead.region,
                source: &lead.source,
                url: &lead.url,
                score: *score,
            })
            .collect();

        let filename = format!("leads_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(filename);
        let result = std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(&path, serde_json::to_vec_pretty(&entries).unwrap_or_default()));
        match result {
            Ok(()) => info!("Snapshot saved to {}", path.display()),
            Err(e) => warn!("Failed to write snapshot {}: {}", path.display(), e),
        }
    }
}
