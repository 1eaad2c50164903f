//! Guarded workflow state machine.
//!
//! Transitions follow the strict linear graph on [`IssueState`]; the
//! IN_PROGRESS edge additionally requires the acting officer to be
//! within [`GEOFENCE_RADIUS_M`] of the issue location. The whole call
//! runs inside one immediate transaction: a rejected guard or invalid
//! edge leaves the record untouched.
//!
//! RESOLVED is written only through this primitive; the external
//! resolution-proof flow calls it after its own on-site verification,
//! so the state-graph validation applies to it as well.

use crate::error::{CivicError, Result};
use crate::events::{EventBus, IssueEvent, IssueEventKind};
use crate::geo::{haversine_m, Coordinate};
use crate::model::{Issue, IssueState, OfficerContact};
use crate::storage::SqliteStorage;
use chrono::Utc;
use tracing::info;

/// Maximum officer distance from the issue for the IN_PROGRESS guard.
pub const GEOFENCE_RADIUS_M: f64 = 100.0;

/// Caller-supplied context for transition guards.
#[derive(Debug, Clone, Default)]
pub struct GuardContext {
    /// Acting officer's live location (required for IN_PROGRESS).
    pub officer_coordinate: Option<Coordinate>,
    /// Officer contact to snapshot when entering ASSIGNED.
    pub officer: Option<OfficerContact>,
}

/// Apply a guarded state transition, returning the updated issue.
///
/// # Errors
///
/// - [`CivicError::IssueNotFound`] for unknown IDs
/// - [`CivicError::InvalidTransition`] when `to` is not in the current
///   state's allowed-next set (carries that set)
/// - [`CivicError::GeofenceUnavailable`] when the IN_PROGRESS guard
///   cannot measure proximity
/// - [`CivicError::GeofenceViolation`] with the measured distance when
///   the officer is too far away
pub fn transition(
    storage: &mut SqliteStorage,
    bus: Option<&EventBus>,
    issue_id: &str,
    to: IssueState,
    guard: &GuardContext,
) -> Result<Issue> {
    let (from, updated) = storage.mutate("transition", |tx, _ctx| {
        let issue = SqliteStorage::require_issue_tx(tx, issue_id)?;
        let from = issue.state;

        if !from.allowed_next().contains(&to) {
            return Err(CivicError::InvalidTransition {
                from,
                to,
                allowed: from.allowed_next().to_vec(),
            });
        }

        if to == IssueState::InProgress {
            check_geofence(&issue, guard)?;
        }

        let now = Utc::now();
        match to {
            IssueState::Verified => SqliteStorage::mark_verified_tx(tx, issue_id, now)?,
            IssueState::Assigned => {
                SqliteStorage::mark_assigned_tx(tx, issue_id, now, guard.officer.as_ref())?;
            }
            IssueState::InProgress => SqliteStorage::mark_in_progress_tx(tx, issue_id, now)?,
            IssueState::Resolved => SqliteStorage::mark_resolved_tx(tx, issue_id, now)?,
            // Unreachable: neither appears in any allowed-next set.
            IssueState::Submitted | IssueState::Merged => {
                return Err(CivicError::InvalidTransition {
                    from,
                    to,
                    allowed: from.allowed_next().to_vec(),
                });
            }
        }

        let updated = SqliteStorage::require_issue_tx(tx, issue_id)?;
        Ok((from, updated))
    })?;

    info!(issue_id, from = %from, to = %to, "state transition applied");

    if let Some(bus) = bus {
        bus.publish(IssueEvent {
            issue_id: issue_id.to_string(),
            kind: IssueEventKind::Transitioned { from, to },
        });
    }

    Ok(updated)
}

/// The IN_PROGRESS proximity guard.
fn check_geofence(issue: &Issue, guard: &GuardContext) -> Result<()> {
    let Some(officer_coord) = guard.officer_coordinate else {
        return Err(CivicError::GeofenceUnavailable {
            reason: "officer coordinate missing".to_string(),
        });
    };
    let Some(issue_coord) = issue.coordinate else {
        return Err(CivicError::GeofenceUnavailable {
            reason: "issue has no coordinate to verify proximity against".to_string(),
        });
    };

    let distance_m = haversine_m(officer_coord, issue_coord);
    if distance_m > GEOFENCE_RADIUS_M {
        return Err(CivicError::GeofenceViolation {
            distance_m,
            limit_m: GEOFENCE_RADIUS_M,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Severity, SlaTier};
    use chrono::{DateTime, Utc};

    fn seeded_issue(state: IssueState, coordinate: Option<Coordinate>) -> Issue {
        let now = Utc::now();
        Issue {
            id: "ct-life".to_string(),
            category: Category::Sidewalk,
            description: "broken slab".to_string(),
            location_text: None,
            coordinate,
            zone_id: None,
            parent_id: None,
            supporter_count: 1,
            severity: Severity::Medium,
            is_emergency: false,
            state,
            created_at: now,
            verified_at: matches!(
                state,
                IssueState::Verified | IssueState::Assigned | IssueState::InProgress
            )
            .then_some(now),
            assigned_at: matches!(state, IssueState::Assigned | IssueState::InProgress)
                .then_some(now),
            in_progress_at: None,
            resolved_at: None,
            sla_tier: SlaTier::NONE,
            last_escalated_at: None,
            auto_escalated_at: None,
            officer_name: None,
            officer_email: None,
            officer_phone: None,
            reporter_ref: None,
            photo_ref: None,
        }
    }

    fn storage_with(issue: &Issue) -> SqliteStorage {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(issue).unwrap();
        storage
    }

    #[test]
    fn submitted_to_verified_stamps_timestamp() {
        let mut storage = storage_with(&seeded_issue(IssueState::Submitted, None));
        let before: DateTime<Utc> = Utc::now();

        let updated = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::Verified,
            &GuardContext::default(),
        )
        .unwrap();
        assert_eq!(updated.state, IssueState::Verified);
        assert!(updated.verified_at.unwrap() >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn skipping_states_is_rejected_with_allowed_set() {
        let mut storage = storage_with(&seeded_issue(IssueState::Submitted, None));
        let err = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::Resolved,
            &GuardContext::default(),
        )
        .unwrap_err();
        match err {
            CivicError::InvalidTransition { from, to, allowed } => {
                assert_eq!(from, IssueState::Submitted);
                assert_eq!(to, IssueState::Resolved);
                assert_eq!(allowed, vec![IssueState::Verified]);
            }
            other => panic!("unexpected error: {other}"),
        }
        // No partial writes.
        let issue = storage.get_issue("ct-life").unwrap().unwrap();
        assert_eq!(issue.state, IssueState::Submitted);
        assert!(issue.resolved_at.is_none());
    }

    #[test]
    fn merged_is_never_a_transition_target() {
        let mut storage = storage_with(&seeded_issue(IssueState::Submitted, None));
        let err = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::Merged,
            &GuardContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::InvalidTransition { .. }));
    }

    #[test]
    fn assigned_stores_officer_contact() {
        let mut storage = storage_with(&seeded_issue(IssueState::Verified, None));
        let guard = GuardContext {
            officer_coordinate: None,
            officer: Some(OfficerContact {
                name: "B. Crew".to_string(),
                email: "crew@ward.test".to_string(),
                phone: Some("+15550101".to_string()),
            }),
        };
        let updated =
            transition(&mut storage, None, "ct-life", IssueState::Assigned, &guard).unwrap();
        assert_eq!(updated.officer_email.as_deref(), Some("crew@ward.test"));
        assert!(updated.assigned_at.is_some());
    }

    #[test]
    fn in_progress_requires_officer_coordinate() {
        let issue_coord = Coordinate::new(12.9716, 77.5946);
        let mut storage = storage_with(&seeded_issue(IssueState::Assigned, Some(issue_coord)));
        let err = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::InProgress,
            &GuardContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::GeofenceUnavailable { .. }));
    }

    #[test]
    fn in_progress_requires_issue_coordinate() {
        let mut storage = storage_with(&seeded_issue(IssueState::Assigned, None));
        let guard = GuardContext {
            officer_coordinate: Some(Coordinate::new(12.9716, 77.5946)),
            officer: None,
        };
        let err = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::InProgress,
            &guard,
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::GeofenceUnavailable { .. }));
    }

    #[test]
    fn geofence_rejects_beyond_100m_with_distance() {
        let issue_coord = Coordinate::new(12.9716, 77.5946);
        let mut storage = storage_with(&seeded_issue(IssueState::Assigned, Some(issue_coord)));
        // ~111m north
        let guard = GuardContext {
            officer_coordinate: Some(Coordinate::new(12.9716 + 0.001, 77.5946)),
            officer: None,
        };
        let err = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::InProgress,
            &guard,
        )
        .unwrap_err();
        match err {
            CivicError::GeofenceViolation { distance_m, limit_m } => {
                assert!((100.0..130.0).contains(&distance_m), "got {distance_m}");
                assert!((limit_m - 100.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Guard failure left the record untouched.
        let issue = storage.get_issue("ct-life").unwrap().unwrap();
        assert_eq!(issue.state, IssueState::Assigned);
        assert!(issue.in_progress_at.is_none());
    }

    #[test]
    fn geofence_accepts_within_100m() {
        let issue_coord = Coordinate::new(12.9716, 77.5946);
        let mut storage = storage_with(&seeded_issue(IssueState::Assigned, Some(issue_coord)));
        // ~55m north
        let guard = GuardContext {
            officer_coordinate: Some(Coordinate::new(12.9716 + 0.0005, 77.5946)),
            officer: None,
        };
        let updated = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::InProgress,
            &guard,
        )
        .unwrap();
        assert_eq!(updated.state, IssueState::InProgress);
        assert!(updated.in_progress_at.is_some());
    }

    #[test]
    fn resolved_via_guarded_primitive() {
        let issue_coord = Coordinate::new(12.9716, 77.5946);
        let mut issue = seeded_issue(IssueState::InProgress, Some(issue_coord));
        issue.in_progress_at = Some(Utc::now());
        let mut storage = storage_with(&issue);

        let updated = transition(
            &mut storage,
            None,
            "ct-life",
            IssueState::Resolved,
            &GuardContext::default(),
        )
        .unwrap();
        assert_eq!(updated.state, IssueState::Resolved);
        assert!(updated.resolved_at.is_some());
    }

    #[test]
    fn unknown_issue_is_not_found() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let err = transition(
            &mut storage,
            None,
            "ct-missing",
            IssueState::Verified,
            &GuardContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CivicError::IssueNotFound { .. }));
    }
}
