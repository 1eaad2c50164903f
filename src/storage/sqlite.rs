//! `SQLite` storage implementation.
//!
//! All writes go through [`SqliteStorage::mutate`], which opens a
//! `BEGIN IMMEDIATE` transaction. SQLite's single-writer lock serializes
//! every mutation, which gives each operation the exclusive-lock,
//! all-or-nothing semantics the lifecycle engine requires: a rejected
//! guard or a mid-operation failure rolls back with no partial writes.

use crate::error::{CivicError, Result};
use crate::geo::{haversine_m, Coordinate, Polygon};
use crate::model::{
    Category, EscalationAction, EscalationLogEntry, Issue, IssueState, OfficerContact, Severity,
    SlaTier, Zone,
};
use crate::storage::schema::apply_schema;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Column list shared by every issue SELECT.
const ISSUE_COLUMNS: &str = "id, category, description, location_text, lat, lon, zone_id, \
     parent_id, supporter_count, severity, is_emergency, state, created_at, verified_at, \
     assigned_at, in_progress_at, resolved_at, sla_tier, last_escalated_at, auto_escalated_at, \
     officer_name, officer_email, officer_phone, reporter_ref, photo_ref";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, collecting audit side effects.
///
/// Escalation log rows recorded here are written in the same transaction
/// as the mutation itself, so a rollback discards them too.
pub struct MutationContext {
    pub op_name: String,
    entries: Vec<PendingLogEntry>,
}

struct PendingLogEntry {
    issue_id: String,
    tier: SlaTier,
    action: EscalationAction,
    recipient: String,
    success: bool,
    detail: Option<String>,
}

impl MutationContext {
    #[must_use]
    fn new(op_name: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Append an escalation audit row (written at commit).
    pub fn record_escalation(
        &mut self,
        issue_id: &str,
        tier: SlaTier,
        action: EscalationAction,
        recipient: &str,
        success: bool,
        detail: Option<String>,
    ) {
        self.entries.push(PendingLogEntry {
            issue_id: issue_id.to_string(),
            tier,
            action,
            recipient: recipient.to_string(),
            success,
            detail,
        });
    }
}

/// Serialize a timestamp for storage. Fixed-width (millisecond, `Z`
/// suffix) so lexicographic ordering in SQL matches chronological order.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn parse_opt_ts(idx: usize, s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|v| parse_ts(idx, &v)).transpose()
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        msg.into(),
    )
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Execute a mutation under an immediate (writer-exclusive) transaction.
    ///
    /// Audit rows recorded in the [`MutationContext`] are flushed before
    /// commit. Any error rolls the whole transaction back.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a database error from the
    /// transaction machinery.
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let mut ctx = MutationContext::new(op);

        let result = f(&tx, &mut ctx)?;

        for entry in &ctx.entries {
            tx.execute(
                "INSERT INTO escalation_log (issue_id, tier, action, recipient, success, detail, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    entry.issue_id,
                    entry.tier.0,
                    entry.action.as_str(),
                    entry.recipient,
                    i32::from(entry.success),
                    entry.detail,
                    ts(Utc::now()),
                ],
            )?;
        }

        tx.commit()?;
        tracing::debug!(op = %ctx.op_name, "mutation committed");

        Ok(result)
    }

    // === Issues ===

    /// Insert a new issue row. Used by the ingestion pipeline inside its
    /// own transaction; exposed directly for tests and fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. ID collision).
    pub fn insert_issue_tx(conn: &Connection, issue: &Issue) -> Result<()> {
        conn.execute(
            "INSERT INTO issues (
                id, category, description, location_text, lat, lon, zone_id, parent_id,
                supporter_count, severity, is_emergency, state, created_at, verified_at,
                assigned_at, in_progress_at, resolved_at, sla_tier, last_escalated_at,
                auto_escalated_at, officer_name, officer_email, officer_phone,
                reporter_ref, photo_ref
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                issue.id,
                issue.category.as_str(),
                issue.description,
                issue.location_text,
                issue.coordinate.map(|c| c.lat),
                issue.coordinate.map(|c| c.lon),
                issue.zone_id,
                issue.parent_id,
                issue.supporter_count,
                issue.severity.as_str(),
                i32::from(issue.is_emergency),
                issue.state.as_str(),
                ts(issue.created_at),
                issue.verified_at.map(ts),
                issue.assigned_at.map(ts),
                issue.in_progress_at.map(ts),
                issue.resolved_at.map(ts),
                issue.sla_tier.0,
                issue.last_escalated_at.map(ts),
                issue.auto_escalated_at.map(ts),
                issue.officer_name,
                issue.officer_email,
                issue.officer_phone,
                issue.reporter_ref,
                issue.photo_ref,
            ],
        )?;
        Ok(())
    }

    /// Create a new issue in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_issue(&mut self, issue: &Issue) -> Result<()> {
        self.mutate("create_issue", |tx, _ctx| Self::insert_issue_tx(tx, issue))
    }

    /// Fetch an issue by ID.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn get_issue(&self, id: &str) -> Result<Option<Issue>> {
        Self::get_issue_tx(&self.conn, id)
    }

    /// Fetch an issue by ID on an existing connection/transaction.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn get_issue_tx(conn: &Connection, id: &str) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?");
        let issue = conn
            .query_row(&sql, [id], Self::issue_from_row)
            .optional()?;
        Ok(issue)
    }

    /// Fetch an issue, erroring if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CivicError::IssueNotFound`] for unknown IDs.
    pub fn require_issue_tx(conn: &Connection, id: &str) -> Result<Issue> {
        Self::get_issue_tx(conn, id)?.ok_or_else(|| CivicError::IssueNotFound { id: id.to_string() })
    }

    /// List every issue, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues ORDER BY created_at DESC, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([], Self::issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// List issues in any of the given states, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn issues_in_states(&self, states: &[IssueState]) -> Result<Vec<Issue>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; states.len()].join(", ");
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE state IN ({placeholders})
             ORDER BY created_at ASC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map(
                rusqlite::params_from_iter(states.iter().map(|s| s.as_str())),
                Self::issue_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// List issues routed to the given zone.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn issues_in_zone(&self, zone_id: &str) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE zone_id = ? ORDER BY created_at ASC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([zone_id], Self::issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// List the merged children of a root issue.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn children_of(&self, parent_id: &str) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE parent_id = ? ORDER BY created_at ASC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([parent_id], Self::issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// Unresolved issues whose stored tier has hit the top, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn critical_backlog(&self) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             WHERE sla_tier >= ? AND state NOT IN ('resolved', 'merged')
             ORDER BY created_at ASC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([SlaTier::MAX.0], Self::issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// Candidates for the escalation sweep: assigned or in-progress, with
    /// an assignment timestamp, below the top tier. Elapsed-time filtering
    /// happens in the sweep so the predicate is re-checked against `now`.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn escalation_candidates(&self) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             WHERE state IN ('assigned', 'in_progress')
               AND assigned_at IS NOT NULL
               AND sla_tier < ?
             ORDER BY assigned_at ASC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt
            .query_map([SlaTier::MAX.0], Self::issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// Total number of issues.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn count_issues(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Check whether an issue ID is already taken.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn id_exists(&self, id: &str) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM issues WHERE id = ?")?
            .exists([id])?;
        Ok(exists)
    }

    // === Mutation helpers (used inside `mutate` closures) ===

    /// Atomically bump a root's supporter count, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns [`CivicError::IssueNotFound`] if the row does not exist.
    pub fn increment_supporters_tx(conn: &Connection, id: &str) -> Result<i64> {
        let updated = conn.execute(
            "UPDATE issues SET supporter_count = supporter_count + 1 WHERE id = ?",
            [id],
        )?;
        if updated == 0 {
            return Err(CivicError::IssueNotFound { id: id.to_string() });
        }
        let count = conn.query_row(
            "SELECT supporter_count FROM issues WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Store the recomputed emergency flag.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn set_emergency_tx(conn: &Connection, id: &str, flag: bool) -> Result<()> {
        conn.execute(
            "UPDATE issues SET is_emergency = ? WHERE id = ?",
            rusqlite::params![i32::from(flag), id],
        )?;
        Ok(())
    }

    /// Advance to VERIFIED, stamping `verified_at`.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn mark_verified_tx(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<()> {
        conn.execute(
            "UPDATE issues SET state = 'verified', verified_at = ? WHERE id = ?",
            rusqlite::params![ts(now), id],
        )?;
        Ok(())
    }

    /// Advance to ASSIGNED, stamping `assigned_at` and snapshotting the
    /// officer contact if one was supplied.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn mark_assigned_tx(
        conn: &Connection,
        id: &str,
        now: DateTime<Utc>,
        officer: Option<&OfficerContact>,
    ) -> Result<()> {
        if let Some(contact) = officer {
            conn.execute(
                "UPDATE issues SET state = 'assigned', assigned_at = ?,
                     officer_name = ?, officer_email = ?, officer_phone = ?
                 WHERE id = ?",
                rusqlite::params![ts(now), contact.name, contact.email, contact.phone, id],
            )?;
        } else {
            conn.execute(
                "UPDATE issues SET state = 'assigned', assigned_at = ? WHERE id = ?",
                rusqlite::params![ts(now), id],
            )?;
        }
        Ok(())
    }

    /// Advance to IN_PROGRESS, stamping `in_progress_at`.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn mark_in_progress_tx(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<()> {
        conn.execute(
            "UPDATE issues SET state = 'in_progress', in_progress_at = ? WHERE id = ?",
            rusqlite::params![ts(now), id],
        )?;
        Ok(())
    }

    /// Advance to RESOLVED, stamping `resolved_at`.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn mark_resolved_tx(conn: &Connection, id: &str, now: DateTime<Utc>) -> Result<()> {
        conn.execute(
            "UPDATE issues SET state = 'resolved', resolved_at = ? WHERE id = ?",
            rusqlite::params![ts(now), id],
        )?;
        Ok(())
    }

    /// Raise the stored SLA tier (high-water mark: `MAX(sla_tier, target)`
    /// in SQL, so a stale sweep can never lower it). Stamps
    /// `auto_escalated_at` for auto-promotions, `last_escalated_at` for
    /// escalation-sweep raises.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn raise_tier_tx(
        conn: &Connection,
        id: &str,
        target: SlaTier,
        now: DateTime<Utc>,
        auto: bool,
    ) -> Result<()> {
        let column = if auto {
            "auto_escalated_at"
        } else {
            "last_escalated_at"
        };
        conn.execute(
            &format!("UPDATE issues SET sla_tier = MAX(sla_tier, ?), {column} = ? WHERE id = ?"),
            rusqlite::params![target.0, ts(now), id],
        )?;
        Ok(())
    }

    /// Find the duplicate-merge target for a new submission: the earliest
    /// open root of the same category within `radius_m` of `coord`.
    /// Ties on creation time break by ID.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn find_duplicate_tx(
        conn: &Connection,
        category: Category,
        coord: Coordinate,
        radius_m: f64,
    ) -> Result<Option<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             WHERE parent_id IS NULL
               AND category = ?
               AND state NOT IN ('resolved', 'merged')
               AND lat IS NOT NULL AND lon IS NOT NULL
             ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let candidates = stmt
            .query_map([category.as_str()], Self::issue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(candidates.into_iter().find(|issue| {
            issue
                .coordinate
                .is_some_and(|c| haversine_m(c, coord) <= radius_m)
        }))
    }

    // === Zones ===

    /// Insert or replace a zone.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure or polygon serialization.
    pub fn upsert_zone(&mut self, zone: &Zone) -> Result<()> {
        let polygon_json = serde_json::to_string(&zone.polygon)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO zones (id, name, zone_label, officer_name, officer_email, officer_phone, polygon_json)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                zone.id,
                zone.name,
                zone.zone_label,
                zone.officer.name,
                zone.officer.email,
                zone.officer.phone,
                polygon_json,
            ],
        )?;
        Ok(())
    }

    /// Load every zone.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, zone_label, officer_name, officer_email, officer_phone, polygon_json
             FROM zones ORDER BY id",
        )?;
        let zones = stmt
            .query_map([], Self::zone_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(zones)
    }

    /// Fetch a zone by ID.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn get_zone(&self, id: &str) -> Result<Option<Zone>> {
        let zone = self
            .conn
            .query_row(
                "SELECT id, name, zone_label, officer_name, officer_email, officer_phone, polygon_json
                 FROM zones WHERE id = ?",
                [id],
                Self::zone_from_row,
            )
            .optional()?;
        Ok(zone)
    }

    // === Escalation log ===

    /// The append-only audit trail for one issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn escalation_log(&self, issue_id: &str) -> Result<Vec<EscalationLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, tier, action, recipient, success, detail, created_at
             FROM escalation_log WHERE issue_id = ? ORDER BY id",
        )?;
        let entries = stmt
            .query_map([issue_id], Self::log_entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Has this notification already fired successfully for this issue?
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn has_successful_action(&self, issue_id: &str, action: &EscalationAction) -> Result<bool> {
        let exists = self
            .conn
            .prepare(
                "SELECT 1 FROM escalation_log WHERE issue_id = ? AND action = ? AND success = 1",
            )?
            .exists(rusqlite::params![issue_id, action.as_str()])?;
        Ok(exists)
    }

    // === Row mapping ===

    fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
        let category_str: String = row.get("category")?;
        let category = Category::from_str(&category_str)
            .map_err(|e| conversion_error(1, e.to_string()))?;

        let severity_str: String = row.get("severity")?;
        let severity = Severity::from_str(&severity_str)
            .map_err(|e| conversion_error(9, e.to_string()))?;

        let state_str: String = row.get("state")?;
        let state =
            IssueState::from_str(&state_str).map_err(|e| conversion_error(11, e.to_string()))?;

        let lat: Option<f64> = row.get("lat")?;
        let lon: Option<f64> = row.get("lon")?;
        let coordinate = match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        };

        let created_at_str: String = row.get("created_at")?;

        Ok(Issue {
            id: row.get("id")?,
            category,
            description: row.get("description")?,
            location_text: row.get("location_text")?,
            coordinate,
            zone_id: row.get("zone_id")?,
            parent_id: row.get("parent_id")?,
            supporter_count: row.get("supporter_count")?,
            severity,
            is_emergency: row.get::<_, i32>("is_emergency")? != 0,
            state,
            created_at: parse_ts(12, &created_at_str)?,
            verified_at: parse_opt_ts(13, row.get("verified_at")?)?,
            assigned_at: parse_opt_ts(14, row.get("assigned_at")?)?,
            in_progress_at: parse_opt_ts(15, row.get("in_progress_at")?)?,
            resolved_at: parse_opt_ts(16, row.get("resolved_at")?)?,
            sla_tier: SlaTier(row.get("sla_tier")?),
            last_escalated_at: parse_opt_ts(18, row.get("last_escalated_at")?)?,
            auto_escalated_at: parse_opt_ts(19, row.get("auto_escalated_at")?)?,
            officer_name: row.get("officer_name")?,
            officer_email: row.get("officer_email")?,
            officer_phone: row.get("officer_phone")?,
            reporter_ref: row.get("reporter_ref")?,
            photo_ref: row.get("photo_ref")?,
        })
    }

    fn zone_from_row(row: &rusqlite::Row) -> rusqlite::Result<Zone> {
        let polygon_json: String = row.get("polygon_json")?;
        let polygon: Polygon = serde_json::from_str(&polygon_json)
            .map_err(|e| conversion_error(6, e.to_string()))?;
        Ok(Zone {
            id: row.get("id")?,
            name: row.get("name")?,
            zone_label: row.get("zone_label")?,
            officer: OfficerContact {
                name: row.get("officer_name")?,
                email: row.get("officer_email")?,
                phone: row.get("officer_phone")?,
            },
            polygon,
        })
    }

    fn log_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<EscalationLogEntry> {
        let action_str: String = row.get("action")?;
        let action: EscalationAction =
            serde_json::from_value(serde_json::Value::String(action_str))
                .map_err(|e| conversion_error(3, e.to_string()))?;
        let created_at_str: String = row.get("created_at")?;
        Ok(EscalationLogEntry {
            id: row.get("id")?,
            issue_id: row.get("issue_id")?,
            tier: SlaTier(row.get("tier")?),
            action,
            recipient: row.get("recipient")?,
            success: row.get::<_, i32>("success")? != 0,
            detail: row.get("detail")?,
            created_at: parse_ts(7, &created_at_str)?,
        })
    }
}
