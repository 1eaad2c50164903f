//! Auto-promotion sweep: force-advances issues that have sat in early
//! workflow states past their deadline.
//!
//! Three rules, each re-checked inside its own write transaction:
//!
//! 1. SUBMITTED roots older than 72h are auto-verified.
//! 2. VERIFIED roots idle for 72h are auto-assigned to their ward
//!    officer (assignment proceeds even without one; the log row says
//!    so).
//! 3. ASSIGNED issues idle for 120h below tier 2 get their tier forced
//!    to 2.
//!
//! IN_PROGRESS is never entered here: that edge carries the on-site
//! geofence guard, which a background job cannot satisfy.

use crate::error::Result;
use crate::events::{EventBus, IssueEvent, IssueEventKind};
use crate::model::{EscalationAction, Issue, IssueState, SlaTier};
use crate::sla::{TIER1_HOURS, TIER2_HOURS};
use crate::storage::SqliteStorage;
use crate::sweep::hours_between;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Outcome of one auto-promotion sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PromotionReport {
    /// Candidates examined across all three rules.
    pub scanned: usize,
    /// Issues force-moved SUBMITTED -> VERIFIED.
    pub auto_verified: usize,
    /// Issues force-moved VERIFIED -> ASSIGNED.
    pub auto_assigned: usize,
    /// ASSIGNED issues whose tier was forced to 2.
    pub tier_forced: usize,
    /// Issues skipped because processing them errored.
    pub errors: usize,
}

/// Run one auto-promotion sweep tick.
///
/// # Errors
///
/// Returns an error only if a candidate scan fails; per-issue failures
/// are counted in the report and logged.
pub fn run(
    storage: &mut SqliteStorage,
    bus: Option<&EventBus>,
    now: DateTime<Utc>,
) -> Result<PromotionReport> {
    let mut report = PromotionReport::default();

    for issue in storage.issues_in_states(&[IssueState::Submitted])? {
        report.scanned += 1;
        if !issue.is_root() || hours_between(issue.created_at, now) <= TIER1_HOURS {
            continue;
        }
        match auto_verify(storage, &issue, now) {
            Ok(true) => {
                report.auto_verified += 1;
                publish(bus, &issue.id, IssueState::Verified);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(issue_id = %issue.id, error = %e, "auto-verify failed");
                report.errors += 1;
            }
        }
    }

    for issue in storage.issues_in_states(&[IssueState::Verified])? {
        report.scanned += 1;
        let Some(verified_at) = issue.verified_at else {
            continue;
        };
        if !issue.is_root() || hours_between(verified_at, now) <= TIER1_HOURS {
            continue;
        }
        match auto_assign(storage, &issue, now) {
            Ok(true) => {
                report.auto_assigned += 1;
                publish(bus, &issue.id, IssueState::Assigned);
            }
            Ok(false) => {}
            Err(e) => {
                warn!(issue_id = %issue.id, error = %e, "auto-assign failed");
                report.errors += 1;
            }
        }
    }

    for issue in storage.issues_in_states(&[IssueState::Assigned])? {
        report.scanned += 1;
        let Some(assigned_at) = issue.assigned_at else {
            continue;
        };
        if issue.sla_tier >= SlaTier::EXECUTIVE || hours_between(assigned_at, now) <= TIER2_HOURS {
            continue;
        }
        match force_tier(storage, &issue, now) {
            Ok(true) => {
                report.tier_forced += 1;
                if let Some(bus) = bus {
                    bus.publish(IssueEvent {
                        issue_id: issue.id.clone(),
                        kind: IssueEventKind::TierRaised {
                            tier: SlaTier::EXECUTIVE,
                        },
                    });
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(issue_id = %issue.id, error = %e, "tier force failed");
                report.errors += 1;
            }
        }
    }

    if report.auto_verified + report.auto_assigned + report.tier_forced > 0 {
        info!(
            auto_verified = report.auto_verified,
            auto_assigned = report.auto_assigned,
            tier_forced = report.tier_forced,
            "auto-promotion sweep complete"
        );
    }
    Ok(report)
}

fn publish(bus: Option<&EventBus>, issue_id: &str, to: IssueState) {
    if let Some(bus) = bus {
        bus.publish(IssueEvent {
            issue_id: issue_id.to_string(),
            kind: IssueEventKind::AutoPromoted { to },
        });
    }
}

fn auto_verify(storage: &mut SqliteStorage, issue: &Issue, now: DateTime<Utc>) -> Result<bool> {
    let issue_id = issue.id.clone();
    storage.mutate("auto-verify", |tx, ctx| {
        let current = SqliteStorage::require_issue_tx(tx, &issue_id)?;
        if current.state != IssueState::Submitted {
            return Ok(false);
        }
        SqliteStorage::mark_verified_tx(tx, &issue_id, now)?;
        SqliteStorage::raise_tier_tx(tx, &issue_id, SlaTier::OFFICER, now, true)?;
        ctx.record_escalation(
            &issue_id,
            SlaTier::OFFICER,
            EscalationAction::AutoVerified,
            "system",
            true,
            Some("no verification within 72h of submission".to_string()),
        );
        Ok(true)
    })
}

fn auto_assign(storage: &mut SqliteStorage, issue: &Issue, now: DateTime<Utc>) -> Result<bool> {
    let officer = match issue.zone_id.as_deref() {
        Some(zone_id) => storage.get_zone(zone_id)?.map(|z| z.officer),
        None => None,
    };
    let recipient = officer
        .as_ref()
        .map_or_else(|| "system".to_string(), |o| o.email.clone());

    let issue_id = issue.id.clone();
    storage.mutate("auto-assign", |tx, ctx| {
        let current = SqliteStorage::require_issue_tx(tx, &issue_id)?;
        if current.state != IssueState::Verified {
            return Ok(false);
        }
        SqliteStorage::mark_assigned_tx(tx, &issue_id, now, officer.as_ref())?;
        SqliteStorage::raise_tier_tx(tx, &issue_id, SlaTier::OFFICER, now, true)?;
        ctx.record_escalation(
            &issue_id,
            SlaTier::OFFICER,
            EscalationAction::AutoAssigned,
            &recipient,
            true,
            Some("no assignment within 72h of verification".to_string()),
        );
        Ok(true)
    })
}

fn force_tier(storage: &mut SqliteStorage, issue: &Issue, now: DateTime<Utc>) -> Result<bool> {
    let issue_id = issue.id.clone();
    let forced = storage.mutate("force-tier", |tx, ctx| {
        let current = SqliteStorage::require_issue_tx(tx, &issue_id)?;
        if current.state != IssueState::Assigned || current.sla_tier >= SlaTier::EXECUTIVE {
            return Ok(false);
        }
        SqliteStorage::raise_tier_tx(tx, &issue_id, SlaTier::EXECUTIVE, now, true)?;
        ctx.record_escalation(
            &issue_id,
            SlaTier::EXECUTIVE,
            EscalationAction::AutoTierRaise,
            "system",
            true,
            Some("no work start within 120h of assignment".to_string()),
        );
        Ok(true)
    })?;
    Ok(forced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coordinate, Polygon};
    use crate::model::{Category, OfficerContact, Severity, Zone};
    use chrono::Duration;

    fn issue_in(id: &str, state: IssueState, age_hours: i64) -> Issue {
        let now = Utc::now();
        let anchor = now - Duration::hours(age_hours);
        Issue {
            id: id.to_string(),
            category: Category::Streetlight,
            description: "dark corner".to_string(),
            location_text: None,
            coordinate: None,
            zone_id: None,
            parent_id: None,
            supporter_count: 1,
            severity: Severity::Medium,
            is_emergency: false,
            state,
            created_at: anchor,
            verified_at: matches!(state, IssueState::Verified | IssueState::Assigned)
                .then_some(anchor),
            assigned_at: (state == IssueState::Assigned).then_some(anchor),
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

    #[test]
    fn stale_submitted_root_is_auto_verified() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-stale", IssueState::Submitted, 80)).unwrap();

        let report = run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(report.auto_verified, 1);

        let issue = storage.get_issue("ct-stale").unwrap().unwrap();
        assert_eq!(issue.state, IssueState::Verified);
        assert!(issue.verified_at.is_some());
        assert_eq!(issue.sla_tier, SlaTier::OFFICER);
        assert!(issue.auto_escalated_at.is_some());

        let log = storage.escalation_log("ct-stale").unwrap();
        assert_eq!(log[0].action, EscalationAction::AutoVerified);
        assert_eq!(log[0].recipient, "system");
    }

    #[test]
    fn fresh_submitted_root_is_left_alone() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-fresh", IssueState::Submitted, 10)).unwrap();

        let report = run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(report.auto_verified, 0);
        assert_eq!(
            storage.get_issue("ct-fresh").unwrap().unwrap().state,
            IssueState::Submitted
        );
    }

    #[test]
    fn merged_children_are_never_promoted() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-root", IssueState::Submitted, 80)).unwrap();
        let mut child = issue_in("ct-child", IssueState::Merged, 80);
        child.parent_id = Some("ct-root".to_string());
        storage.create_issue(&child).unwrap();

        run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(
            storage.get_issue("ct-child").unwrap().unwrap().state,
            IssueState::Merged
        );
    }

    #[test]
    fn stale_verified_root_is_auto_assigned_with_zone_officer() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage
            .upsert_zone(&Zone {
                id: "ward-7".to_string(),
                name: "North".to_string(),
                zone_label: "Ward 7".to_string(),
                officer: OfficerContact {
                    name: "N. Officer".to_string(),
                    email: "north@ward.test".to_string(),
                    phone: None,
                },
                polygon: Polygon::new(vec![
                    Coordinate::new(0.0, 0.0),
                    Coordinate::new(0.0, 1.0),
                    Coordinate::new(1.0, 1.0),
                ]),
            })
            .unwrap();
        let mut issue = issue_in("ct-ward", IssueState::Verified, 80);
        issue.zone_id = Some("ward-7".to_string());
        storage.create_issue(&issue).unwrap();

        let report = run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(report.auto_assigned, 1);

        let updated = storage.get_issue("ct-ward").unwrap().unwrap();
        assert_eq!(updated.state, IssueState::Assigned);
        assert_eq!(updated.officer_email.as_deref(), Some("north@ward.test"));

        let log = storage.escalation_log("ct-ward").unwrap();
        assert_eq!(log[0].action, EscalationAction::AutoAssigned);
        assert_eq!(log[0].recipient, "north@ward.test");
    }

    #[test]
    fn unzoned_verified_root_still_auto_assigns() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-nozone", IssueState::Verified, 80)).unwrap();

        let report = run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(report.auto_assigned, 1);
        let updated = storage.get_issue("ct-nozone").unwrap().unwrap();
        assert_eq!(updated.state, IssueState::Assigned);
        assert!(updated.officer_email.is_none());
    }

    #[test]
    fn stalled_assigned_issue_gets_tier_forced() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-stall", IssueState::Assigned, 130)).unwrap();

        let report = run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(report.tier_forced, 1);

        let issue = storage.get_issue("ct-stall").unwrap().unwrap();
        // State does not change; only the tier is forced.
        assert_eq!(issue.state, IssueState::Assigned);
        assert_eq!(issue.sla_tier, SlaTier::EXECUTIVE);
    }

    #[test]
    fn assigned_at_higher_tier_is_not_lowered() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let mut issue = issue_in("ct-high", IssueState::Assigned, 130);
        issue.sla_tier = SlaTier::AUTHORITY;
        storage.create_issue(&issue).unwrap();

        let report = run(&mut storage, None, Utc::now()).unwrap();
        assert_eq!(report.tier_forced, 0);
        assert_eq!(
            storage.get_issue("ct-high").unwrap().unwrap().sla_tier,
            SlaTier::AUTHORITY
        );
    }

    #[test]
    fn running_twice_equals_running_once() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-once", IssueState::Submitted, 80)).unwrap();
        storage.create_issue(&issue_in("ct-twice", IssueState::Assigned, 130)).unwrap();

        let now = Utc::now();
        let first = run(&mut storage, None, now).unwrap();
        assert_eq!(first.auto_verified, 1);
        assert_eq!(first.tier_forced, 1);

        let second = run(&mut storage, None, now).unwrap();
        assert_eq!(second.auto_verified, 0);
        assert_eq!(second.auto_assigned, 0);
        assert_eq!(second.tier_forced, 0);
        assert_eq!(storage.escalation_log("ct-once").unwrap().len(), 1);
        assert_eq!(storage.escalation_log("ct-twice").unwrap().len(), 1);
    }

    #[test]
    fn in_progress_is_never_entered_automatically() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&issue_in("ct-guard", IssueState::Assigned, 400)).unwrap();

        run(&mut storage, None, Utc::now()).unwrap();
        let issue = storage.get_issue("ct-guard").unwrap().unwrap();
        assert_eq!(issue.state, IssueState::Assigned);
        assert!(issue.in_progress_at.is_none());
    }
}
