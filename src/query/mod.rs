//! Read-only views over the issue store: per-issue snapshots, the
//! critical backlog, and per-zone performance statistics.
//!
//! Everything here is derived at read time; nothing writes.

use crate::error::{CivicError, Result};
use crate::model::{Issue, IssueState};
use crate::sla::{self, SlaStatus, TIER3_HOURS};
use crate::storage::SqliteStorage;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An issue together with its SLA classification at read time.
#[derive(Debug, Clone, Serialize)]
pub struct IssueSnapshot {
    #[serde(flatten)]
    pub issue: Issue,
    pub sla: SlaStatus,
    /// IDs of merged duplicates pointing at this root.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_children: Vec<String>,
}

/// Aggregate performance figures for one zone.
///
/// Merged duplicates are excluded throughout; they would double-count
/// their root.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ZoneStats {
    pub zone_id: String,
    pub zone_label: String,
    pub total_issues: i64,
    pub open_issues: i64,
    pub resolved_issues: i64,
    /// Resolved over total, 0.0 when the zone has no issues.
    pub resolution_rate: f64,
    /// Mean hours from SLA anchor to resolution, over resolved issues.
    pub avg_resolution_hours: Option<f64>,
    /// Share of resolved issues closed within the 168h window.
    pub on_time_rate: Option<f64>,
    /// Share of all issues that reached tier 1 or above.
    pub escalation_rate: f64,
}

/// Fetch one issue with its SLA classification and merge children.
///
/// # Errors
///
/// Returns [`CivicError::IssueNotFound`] for unknown IDs.
pub fn issue_snapshot(
    storage: &SqliteStorage,
    issue_id: &str,
    now: DateTime<Utc>,
) -> Result<IssueSnapshot> {
    let issue = storage
        .get_issue(issue_id)?
        .ok_or_else(|| CivicError::IssueNotFound {
            id: issue_id.to_string(),
        })?;
    let sla = sla::classify(&issue, now);
    let merged_children = storage
        .children_of(issue_id)?
        .into_iter()
        .map(|child| child.id)
        .collect();
    Ok(IssueSnapshot {
        issue,
        sla,
        merged_children,
    })
}

/// All unresolved issues at the top tier, most supported first.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn critical_backlog(storage: &SqliteStorage, now: DateTime<Utc>) -> Result<Vec<IssueSnapshot>> {
    storage
        .critical_backlog()?
        .into_iter()
        .map(|issue| {
            let sla = sla::classify(&issue, now);
            let merged_children = storage
                .children_of(&issue.id)?
                .into_iter()
                .map(|child| child.id)
                .collect();
            Ok(IssueSnapshot {
                issue,
                sla,
                merged_children,
            })
        })
        .collect()
}

/// Compute performance statistics for one zone.
///
/// # Errors
///
/// Returns [`CivicError::ZoneNotFound`] for unknown zone IDs.
pub fn zone_stats(storage: &SqliteStorage, zone_id: &str) -> Result<ZoneStats> {
    let zone = storage
        .get_zone(zone_id)?
        .ok_or_else(|| CivicError::ZoneNotFound {
            id: zone_id.to_string(),
        })?;

    let issues: Vec<Issue> = storage
        .issues_in_zone(zone_id)?
        .into_iter()
        .filter(|issue| issue.state != IssueState::Merged)
        .collect();

    let total = issues.len() as i64;
    let resolved: Vec<&Issue> = issues
        .iter()
        .filter(|i| i.state == IssueState::Resolved)
        .collect();
    let resolved_count = resolved.len() as i64;

    let resolution_hours: Vec<f64> = resolved
        .iter()
        .filter_map(|issue| {
            issue.resolved_at.map(|resolved_at| {
                resolved_at
                    .signed_duration_since(issue.sla_anchor())
                    .num_milliseconds() as f64
                    / 3_600_000.0
            })
        })
        .collect();

    let avg_resolution_hours = if resolution_hours.is_empty() {
        None
    } else {
        Some(resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64)
    };
    let on_time_rate = if resolution_hours.is_empty() {
        None
    } else {
        let on_time = resolution_hours.iter().filter(|&&h| h <= TIER3_HOURS).count();
        Some(on_time as f64 / resolution_hours.len() as f64)
    };

    let escalated = issues.iter().filter(|i| i.sla_tier.0 >= 1).count() as i64;

    Ok(ZoneStats {
        zone_id: zone.id,
        zone_label: zone.zone_label,
        total_issues: total,
        open_issues: total - resolved_count,
        resolved_issues: resolved_count,
        resolution_rate: if total == 0 {
            0.0
        } else {
            resolved_count as f64 / total as f64
        },
        avg_resolution_hours,
        on_time_rate,
        escalation_rate: if total == 0 {
            0.0
        } else {
            escalated as f64 / total as f64
        },
    })
}
