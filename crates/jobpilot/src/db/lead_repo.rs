//! Lead repository - CRUD operations for the `leads` table.
//!
//! Status-changing operations come in two flavors: the compare-and-set
//! `advance_*` family used by the automated pipeline (refuses to move a
//! lead that is not at the expected stage, which is what makes retries
//! and crash-restarts safe), and `force_status` for explicit operator
//! overrides.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw lead row from the database.
#[derive(Debug, Clone)]
pub struct LeadRow {
    pub id: i64,
    pub fingerprint: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub region: String,
    pub url: String,
    pub source: String,
    pub salary: Option<String>,
    pub score: i64,
    pub posted_at: Option<String>,
    pub found_at: String,
    pub status: String,
    pub cover_letter_path: Option<String>,
    pub application_draft_path: Option<String>,
    pub apply_attempts: i64,
    pub last_error: Option<String>,
    pub updated_at: String,
}

impl LeadRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            fingerprint: row.get("fingerprint")?,
            title: row.get("title")?,
            company: row.get("company")?,
            location: row.get("location")?,
            region: row.get("region")?,
            url: row.get("url")?,
            source: row.get("source")?,
            salary: row.get("salary")?,
            score: row.get("score")?,
            posted_at: row.get("posted_at")?,
            found_at: row.get("found_at")?,
            status: row.get("status")?,
            cover_letter_path: row.get("cover_letter_path")?,
            application_draft_path: row.get("application_draft_path")?,
            apply_attempts: row.get("apply_attempts")?,
            last_error: row.get("last_error")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Fields for a lead that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub fingerprint: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub region: String,
    pub url: String,
    pub source: String,
    pub salary: Option<String>,
    pub score: i64,
    pub posted_at: Option<String>,
    pub found_at: String,
}

/// Outcome of an insert-if-absent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was created with this id.
    Inserted(i64),
    /// A row with the same fingerprint already existed; its mutable
    /// listing fields (url, salary) were refreshed.
    Duplicate(i64),
}

/// Query filter parameters for lead listing.
#[derive(Debug, Default, Clone)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub region: Option<String>,
    pub exclude_status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a lead if no row with the same fingerprint exists.
///
/// On a duplicate sighting the existing row's `url` and `salary` are
/// refreshed (listings move behind redirects) but identity fields and
/// `status` are left alone. The check and insert run under the single
/// connection lock, so two concurrent discoveries of the same posting
/// cannot both insert.
pub fn insert_if_absent(db: &Database, lead: &NewLead) -> Result<InsertOutcome, DatabaseError> {
    db.with_conn(|conn| {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM leads WHERE fingerprint = ?1",
                params![lead.fingerprint],
                |r| r.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            conn.execute(
                "UPDATE leads SET url = ?2, salary = COALESCE(?3, salary), updated_at = ?4 WHERE id = ?1",
                params![id, lead.url, lead.salary, lead.found_at],
            )?;
            return Ok(InsertOutcome::Duplicate(id));
        }

        conn.execute(
            "INSERT INTO leads (fingerprint, title, company, location, region, url, source,
             salary, score, posted_at, found_at, status, apply_attempts, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'found', 0, ?11)",
            params![
                lead.fingerprint,
                lead.title,
                lead.company,
                lead.location,
                lead.region,
                lead.url,
                lead.source,
                lead.salary,
                lead.score,
                lead.posted_at,
                lead.found_at,
            ],
        )?;
        Ok(InsertOutcome::Inserted(conn.last_insert_rowid()))
    })
}

/// Finds a lead by its ID.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<LeadRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM leads WHERE id = ?1",
            params![id],
            LeadRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::Sqlite)
    })
}

/// Finds a lead by its fingerprint.
pub fn find_by_fingerprint(db: &Database, fingerprint: &str) -> Result<Option<LeadRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM leads WHERE fingerprint = ?1",
            params![fingerprint],
            LeadRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::Sqlite)
    })
}

/// Queries leads with filters, returning (rows, total_count).
/// Rows are ordered by score (best first), then recency.
pub fn query(db: &Database, filter: &LeadFilter) -> Result<(Vec<LeadRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(ref region) = filter.region {
            conditions.push(format!("region = ?{}", param_values.len() + 1));
            param_values.push(Box::new(region.clone()));
        }
        if let Some(ref exclude_status) = filter.exclude_status {
            conditions.push(format!("status != ?{}", param_values.len() + 1));
            param_values.push(Box::new(exclude_status.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        // Count total matching rows.
        let count_sql = format!("SELECT COUNT(*) FROM leads {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        // Fetch paginated results.
        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM leads {} ORDER BY score DESC, found_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<LeadRow> = stmt
            .query_map(params_ref.as_slice(), LeadRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Compare-and-set status transition. Updates the status only when the
/// lead is currently at `expected`; returns whether the update happened.
pub fn advance_status(
    db: &Database,
    id: i64,
    expected: &str,
    next: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE leads SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
            params![id, expected, next, updated_at],
        )?;
        Ok(changed == 1)
    })
}

/// Unconditionally sets the status. Operator-override path only.
pub fn force_status(
    db: &Database,
    id: i64,
    status: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE leads SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, updated_at],
        )?;
        Ok(changed == 1)
    })
}

/// Records the Draft Generator's artifacts and advances `found` →
/// `cover_ready`. Returns false if the lead was not at `found`.
pub fn mark_cover_ready(
    db: &Database,
    id: i64,
    cover_letter_path: &str,
    application_draft_path: &str,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE leads SET status = 'cover_ready', cover_letter_path = ?2,
             application_draft_path = ?3, updated_at = ?4
             WHERE id = ?1 AND status = 'found'",
            params![id, cover_letter_path, application_draft_path, updated_at],
        )?;
        Ok(changed == 1)
    })
}

/// Records a successful submission: `cover_ready` → `applied`, clearing
/// any previous failure. Returns false if the lead was not at
/// `cover_ready` (already applied, or never drafted) - the caller must
/// treat false as "do not submit again".
pub fn mark_applied(db: &Database, id: i64, updated_at: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE leads SET status = 'applied', last_error = NULL, updated_at = ?2
             WHERE id = ?1 AND status = 'cover_ready'",
            params![id, updated_at],
        )?;
        Ok(changed == 1)
    })
}

/// Records a failed submission attempt: increments `apply_attempts` and
/// stores the failure reason without touching the status. Returns the
/// new attempt count.
pub fn record_attempt_failure(
    db: &Database,
    id: i64,
    error: &str,
    updated_at: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE leads SET apply_attempts = apply_attempts + 1, last_error = ?2, updated_at = ?3
             WHERE id = ?1",
            params![id, error, updated_at],
        )?;
        let attempts: i64 = conn.query_row(
            "SELECT apply_attempts FROM leads WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )?;
        Ok(attempts)
    })
}

/// Leads eligible for the next pipeline stage, in score order.
/// For `cover_ready` the caller passes `max_attempts` so exhausted
/// leads never re-enter the actionable set.
pub fn next_actionable(
    db: &Database,
    status: &str,
    region: Option<&str>,
    max_attempts: Option<i64>,
) -> Result<Vec<LeadRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = vec!["status = ?1".to_string()];
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> =
            vec![Box::new(status.to_string())];

        if let Some(region) = region {
            conditions.push(format!("region = ?{}", param_values.len() + 1));
            param_values.push(Box::new(region.to_string()));
        }
        if let Some(max) = max_attempts {
            conditions.push(format!("apply_attempts < ?{}", param_values.len() + 1));
            param_values.push(Box::new(max));
        }

        let sql = format!(
            "SELECT * FROM leads WHERE {} ORDER BY score DESC, found_at DESC",
            conditions.join(" AND ")
        );
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<LeadRow> = stmt
            .query_map(params_ref.as_slice(), LeadRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts leads with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Per-status lead counts for the end-of-cycle status line.
pub fn status_counts(db: &Database) -> Result<Vec<(String, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM leads GROUP BY status ORDER BY status")?;
        let rows: Vec<(String, u64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_lead(fingerprint: &str) -> NewLead {
        NewLead {
            fingerprint: fingerprint.to_string(),
            title: "Junior AI Engineer".to_string(),
            company: "Acme".to_string(),
            location: "London".to_string(),
            region: "uk".to_string(),
            url: "https://jobs.example/1".to_string(),
            source: "adzuna".to_string(),
            salary: None,
            score: 7,
            posted_at: None,
            found_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let outcome = insert_if_absent(&db, &sample_lead("fp-1")).unwrap();
        let id = match outcome {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.title, "Junior AI Engineer");
        assert_eq!(found.status, "found");
        assert_eq!(found.apply_attempts, 0);
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, 999).unwrap().is_none());
        assert!(find_by_fingerprint(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_refreshes_listing_fields() {
        let db = test_db();
        let first = insert_if_absent(&db, &sample_lead("fp-dup")).unwrap();
        let id = match first {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        let mut again = sample_lead("fp-dup");
        again.url = "https://jobs.example/redirected".to_string();
        again.salary = Some("50000".to_string());
        let outcome = insert_if_absent(&db, &again).unwrap();
        assert_eq!(outcome, InsertOutcome::Duplicate(id));

        let row = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(row.url, "https://jobs.example/redirected");
        assert_eq!(row.salary.as_deref(), Some("50000"));
        // Status and identity untouched.
        assert_eq!(row.status, "found");
        assert_eq!(row.title, "Junior AI Engineer");
    }

    #[test]
    fn test_duplicate_does_not_create_second_row() {
        let db = test_db();
        insert_if_absent(&db, &sample_lead("fp-same")).unwrap();
        insert_if_absent(&db, &sample_lead("fp-same")).unwrap();

        let (_, total) = query(&db, &LeadFilter::default()).unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_query_with_status_filter() {
        let db = test_db();
        insert_if_absent(&db, &sample_lead("fp-a")).unwrap();
        let id = match insert_if_absent(&db, &sample_lead("fp-b")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        force_status(&db, id, "applied", "2026-01-02T00:00:00Z").unwrap();

        let (rows, total) = query(
            &db,
            &LeadFilter {
                status: Some("applied".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, id);
    }

    #[test]
    fn test_query_with_region_and_exclude() {
        let db = test_db();
        let mut remote = sample_lead("fp-remote");
        remote.region = "remote".to_string();
        insert_if_absent(&db, &remote).unwrap();
        insert_if_absent(&db, &sample_lead("fp-uk")).unwrap();

        let (rows, total) = query(
            &db,
            &LeadFilter {
                region: Some("uk".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].region, "uk");

        let (_, total) = query(
            &db,
            &LeadFilter {
                exclude_status: Some("found".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_advance_status_is_compare_and_set() {
        let db = test_db();
        let id = match insert_if_absent(&db, &sample_lead("fp-cas")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        assert!(advance_status(&db, id, "found", "cover_ready", "2026-01-02").unwrap());
        // Second advance from the same expected state must fail.
        assert!(!advance_status(&db, id, "found", "cover_ready", "2026-01-02").unwrap());

        let row = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(row.status, "cover_ready");
    }

    #[test]
    fn test_mark_applied_only_from_cover_ready() {
        let db = test_db();
        let id = match insert_if_absent(&db, &sample_lead("fp-app")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        // Not yet at cover_ready.
        assert!(!mark_applied(&db, id, "2026-01-02").unwrap());

        mark_cover_ready(&db, id, "/c/cover.txt", "/d/draft.txt", "2026-01-02").unwrap();
        record_attempt_failure(&db, id, "element missing", "2026-01-02").unwrap();
        assert!(mark_applied(&db, id, "2026-01-03").unwrap());

        let row = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(row.status, "applied");
        assert!(row.last_error.is_none(), "success must clear last_error");

        // Already applied - refuses a second time.
        assert!(!mark_applied(&db, id, "2026-01-04").unwrap());
    }

    #[test]
    fn test_mark_cover_ready_sets_artifacts() {
        let db = test_db();
        let id = match insert_if_absent(&db, &sample_lead("fp-cr")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        assert!(mark_cover_ready(&db, id, "/c/1_cover.txt", "/d/1_draft.txt", "2026-01-02").unwrap());
        let row = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(row.status, "cover_ready");
        assert_eq!(row.cover_letter_path.as_deref(), Some("/c/1_cover.txt"));
        assert_eq!(row.application_draft_path.as_deref(), Some("/d/1_draft.txt"));

        // Not at found anymore, so a re-run is refused.
        assert!(!mark_cover_ready(&db, id, "/c/x", "/d/x", "2026-01-03").unwrap());
    }

    #[test]
    fn test_record_attempt_failure_increments() {
        let db = test_db();
        let id = match insert_if_absent(&db, &sample_lead("fp-fail")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };

        assert_eq!(record_attempt_failure(&db, id, "timeout", "2026-01-02").unwrap(), 1);
        assert_eq!(record_attempt_failure(&db, id, "no modal", "2026-01-02").unwrap(), 2);

        let row = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(row.apply_attempts, 2);
        assert_eq!(row.last_error.as_deref(), Some("no modal"));
        assert_eq!(row.status, "found", "failure must not move the status");
    }

    #[test]
    fn test_next_actionable_respects_max_attempts() {
        let db = test_db();
        let id1 = match insert_if_absent(&db, &sample_lead("fp-n1")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        let id2 = match insert_if_absent(&db, &sample_lead("fp-n2")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        mark_cover_ready(&db, id1, "/c/1", "/d/1", "2026-01-02").unwrap();
        mark_cover_ready(&db, id2, "/c/2", "/d/2", "2026-01-02").unwrap();

        for _ in 0..3 {
            record_attempt_failure(&db, id2, "anti-automation challenge", "2026-01-02").unwrap();
        }

        let actionable = next_actionable(&db, "cover_ready", None, Some(3)).unwrap();
        assert_eq!(actionable.len(), 1);
        assert_eq!(actionable[0].id, id1);
    }

    #[test]
    fn test_status_counts() {
        let db = test_db();
        insert_if_absent(&db, &sample_lead("fp-s1")).unwrap();
        insert_if_absent(&db, &sample_lead("fp-s2")).unwrap();
        let id = match insert_if_absent(&db, &sample_lead("fp-s3")).unwrap() {
            InsertOutcome::Inserted(id) => id,
            other => panic!("expected insert, got {:?}", other),
        };
        force_status(&db, id, "applied", "2026-01-02").unwrap();

        assert_eq!(count_by_status(&db, "found").unwrap(), 2);
        assert_eq!(count_by_status(&db, "applied").unwrap(), 1);

        let counts = status_counts(&db).unwrap();
        assert!(counts.contains(&("applied".to_string(), 1)));
        assert!(counts.contains(&("found".to_string(), 2)));
    }
}
