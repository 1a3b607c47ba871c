//! Attempt repository - the per-attempt audit log for the submission engine.
//!
//! One row per submission attempt (including dry-runs and skips), kept
//! forever for debugging submission behavior against the target site.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A single submission attempt record.
#[derive(Debug, Clone)]
pub struct AttemptRow {
    pub id: String,
    pub lead_id: i64,
    pub started_at: String,
    pub finished_at: String,
    pub outcome: String,
    pub detail: Option<String>,
}

impl AttemptRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            lead_id: row.get("lead_id")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            outcome: row.get("outcome")?,
            detail: row.get("detail")?,
        })
    }
}

/// Inserts a new attempt record.
pub fn insert(db: &Database, attempt: &AttemptRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO attempts (id, lead_id, started_at, finished_at, outcome, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                attempt.id,
                attempt.lead_id,
                attempt.started_at,
                attempt.finished_at,
                attempt.outcome,
                attempt.detail,
            ],
        )?;
        Ok(())
    })
}

/// Lists all attempts for a lead, oldest first.
pub fn list_for_lead(db: &Database, lead_id: i64) -> Result<Vec<AttemptRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT * FROM attempts WHERE lead_id = ?1 ORDER BY started_at ASC")?;
        let rows: Vec<AttemptRow> = stmt
            .query_map(params![lead_id], AttemptRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts attempts with the given outcome across all leads.
pub fn count_by_outcome(db: &Database, outcome: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM attempts WHERE outcome = ?1",
            params![outcome],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
