//! Database schema definitions.

use rusqlite::{Connection, Result};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the civictrack database.
pub const SCHEMA_SQL: &str = r"
    -- Issues table.
    -- parent_id is a nullable self-reference column (indexed), not a
    -- pointer graph; the no-retroactive-parent rule is enforced by the
    -- ingestion writer, not by the storage shape.
    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        location_text TEXT,
        lat REAL,
        lon REAL,
        zone_id TEXT,
        parent_id TEXT,
        supporter_count INTEGER NOT NULL DEFAULT 1,
        severity TEXT NOT NULL,
        is_emergency INTEGER NOT NULL DEFAULT 0,
        state TEXT NOT NULL,
        created_at TEXT NOT NULL,
        verified_at TEXT,
        assigned_at TEXT,
        in_progress_at TEXT,
        resolved_at TEXT,
        sla_tier INTEGER NOT NULL DEFAULT 0,
        last_escalated_at TEXT,
        auto_escalated_at TEXT,
        officer_name TEXT,
        officer_email TEXT,
        officer_phone TEXT,
        reporter_ref TEXT,
        photo_ref TEXT,
        CHECK (length(description) >= 1),
        CHECK (supporter_count >= 1),
        CHECK (sla_tier >= 0 AND sla_tier <= 3),
        CHECK ((lat IS NULL) = (lon IS NULL))
    );

    CREATE INDEX IF NOT EXISTS idx_issues_state ON issues(state);
    CREATE INDEX IF NOT EXISTS idx_issues_category ON issues(category);
    CREATE INDEX IF NOT EXISTS idx_issues_zone_id ON issues(zone_id);
    CREATE INDEX IF NOT EXISTS idx_issues_parent_id ON issues(parent_id);
    CREATE INDEX IF NOT EXISTS idx_issues_created_at ON issues(created_at);
    CREATE INDEX IF NOT EXISTS idx_issues_sla_tier ON issues(sla_tier);
    CREATE INDEX IF NOT EXISTS idx_issues_state_assigned ON issues(state, assigned_at);

    -- Zones (reference data, read-mostly)
    CREATE TABLE IF NOT EXISTS zones (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        zone_label TEXT NOT NULL,
        officer_name TEXT NOT NULL,
        officer_email TEXT NOT NULL,
        officer_phone TEXT,
        polygon_json TEXT NOT NULL
    );

    -- Escalation audit log (append-only; rows are never updated or deleted)
    CREATE TABLE IF NOT EXISTS escalation_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        issue_id TEXT NOT NULL,
        tier INTEGER NOT NULL,
        action TEXT NOT NULL,
        recipient TEXT NOT NULL,
        success INTEGER NOT NULL,
        detail TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY (issue_id) REFERENCES issues(id)
    );
    CREATE INDEX IF NOT EXISTS idx_escalation_log_issue_id ON escalation_log(issue_id);
    CREATE INDEX IF NOT EXISTS idx_escalation_log_action ON escalation_log(action);
    CREATE INDEX IF NOT EXISTS idx_escalation_log_created_at ON escalation_log(created_at);

    -- Metadata
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

/// Apply the schema to the database.
///
/// This uses `execute_batch` to run the entire DDL script.
/// It is idempotent because all statements use `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // WAL for readers concurrent with the single writer
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.pragma_update(None, "foreign_keys", "ON")?;

    Ok(())
}
