//! Escalation sweep: raises the stored SLA tier of stalled assigned
//! issues and fans out tier-appropriate notifications.
//!
//! Each candidate is processed in its own boundary: dispatch failures
//! are recorded in the audit log as `success: false`, and a failure on
//! one issue never aborts the rest of the batch. Dispatch runs with no
//! storage transaction open; the tier bump and audit rows commit in one
//! per-issue transaction afterward, re-checking the stored tier so a
//! racing sweep cannot double-apply.

use crate::config::EscalationContacts;
use crate::error::Result;
use crate::events::{EventBus, IssueEvent, IssueEventKind};
use crate::model::{EscalationAction, Issue, SlaTier};
use crate::notify::{DispatchOutcome, NotificationDispatcher};
use crate::sla::tier_for_hours;
use crate::storage::SqliteStorage;
use crate::sweep::hours_between;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Outcome of one escalation sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EscalationReport {
    /// Candidates examined.
    pub scanned: usize,
    /// Issues whose stored tier was raised.
    pub escalated: usize,
    /// Individual dispatch attempts made.
    pub dispatched: usize,
    /// Dispatch attempts that reported failure.
    pub dispatch_failures: usize,
    /// Issues skipped because processing them errored.
    pub errors: usize,
}

/// One planned notification for a tier raise.
struct Attempt {
    action: EscalationAction,
    recipient: Option<String>,
    kind: AttemptKind,
}

enum AttemptKind {
    Email,
    Sms,
}

/// Run one escalation sweep tick.
///
/// # Errors
///
/// Returns an error only if the candidate scan itself fails; per-issue
/// failures are counted in the report and logged.
pub fn run(
    storage: &mut SqliteStorage,
    dispatcher: &dyn NotificationDispatcher,
    contacts: &EscalationContacts,
    bus: Option<&EventBus>,
    now: DateTime<Utc>,
) -> Result<EscalationReport> {
    let candidates = storage.escalation_candidates()?;
    let mut report = EscalationReport {
        scanned: candidates.len(),
        ..EscalationReport::default()
    };

    for issue in candidates {
        match escalate_issue(storage, dispatcher, contacts, bus, &issue, now) {
            Ok(Some((dispatched, failures))) => {
                report.escalated += 1;
                report.dispatched += dispatched;
                report.dispatch_failures += failures;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(issue_id = %issue.id, error = %e, "escalation failed for issue");
                report.errors += 1;
            }
        }
    }

    if report.escalated > 0 {
        info!(
            scanned = report.scanned,
            escalated = report.escalated,
            dispatch_failures = report.dispatch_failures,
            "escalation sweep complete"
        );
    }
    Ok(report)
}

/// Escalate one issue if its elapsed time warrants a higher tier.
/// Returns `None` for the idempotent no-op case.
fn escalate_issue(
    storage: &mut SqliteStorage,
    dispatcher: &dyn NotificationDispatcher,
    contacts: &EscalationContacts,
    bus: Option<&EventBus>,
    issue: &Issue,
    now: DateTime<Utc>,
) -> Result<Option<(usize, usize)>> {
    let Some(assigned_at) = issue.assigned_at else {
        return Ok(None);
    };
    let target = tier_for_hours(hours_between(assigned_at, now));
    if target <= issue.sla_tier {
        return Ok(None);
    }

    let attempts = plan_attempts(storage, contacts, issue, target)?;

    // Dispatch outside any transaction; each call is non-throwing.
    let mut results = Vec::with_capacity(attempts.len());
    let mut failures = 0;
    for attempt in &attempts {
        let outcome = match (&attempt.recipient, &attempt.kind) {
            (Some(recipient), AttemptKind::Email) => {
                dispatcher.send_email(issue, target, recipient)
            }
            (Some(recipient), AttemptKind::Sms) => {
                dispatcher.send_sms(recipient, &sms_text(issue, target))
            }
            (None, _) => DispatchOutcome::failed("no recipient on file"),
        };
        if !outcome.success {
            failures += 1;
            debug!(
                issue_id = %issue.id,
                action = %attempt.action,
                detail = outcome.detail.as_deref().unwrap_or("-"),
                "dispatch attempt failed"
            );
        }
        results.push(outcome);
    }
    let dispatched = attempts.len();

    let issue_id = issue.id.clone();
    let raised = storage.mutate("escalate", |tx, ctx| {
        // Re-check under the write lock; another tick may have won.
        let current = SqliteStorage::require_issue_tx(tx, &issue_id)?;
        if target <= current.sla_tier {
            return Ok(false);
        }
        SqliteStorage::raise_tier_tx(tx, &issue_id, target, now, false)?;
        for (attempt, outcome) in attempts.iter().zip(&results) {
            ctx.record_escalation(
                &issue_id,
                target,
                attempt.action.clone(),
                attempt.recipient.as_deref().unwrap_or("-"),
                outcome.success,
                outcome.detail.clone(),
            );
        }
        Ok(true)
    })?;

    if raised {
        if let Some(bus) = bus {
            bus.publish(IssueEvent {
                issue_id,
                kind: IssueEventKind::TierRaised { tier: target },
            });
        }
        Ok(Some((dispatched, failures)))
    } else {
        Ok(None)
    }
}

/// The notification set for the target tier.
///
/// Tier 2 re-sends the ward officer email only when no successful tier-1
/// row exists in the audit log (the log answers "already fired").
fn plan_attempts(
    storage: &SqliteStorage,
    contacts: &EscalationContacts,
    issue: &Issue,
    target: SlaTier,
) -> Result<Vec<Attempt>> {
    let officer_email = match issue.officer_email.clone() {
        Some(email) => Some(email),
        None => match issue.zone_id.as_deref() {
            Some(zone_id) => storage.get_zone(zone_id)?.map(|z| z.officer.email),
            None => None,
        },
    };

    let mut attempts = Vec::new();
    match target.0 {
        1 => {
            attempts.push(Attempt {
                action: EscalationAction::Tier1OfficerEmail,
                recipient: officer_email,
                kind: AttemptKind::Email,
            });
        }
        2 => {
            if !storage.has_successful_action(&issue.id, &EscalationAction::Tier1OfficerEmail)? {
                attempts.push(Attempt {
                    action: EscalationAction::Tier2OfficerEmail,
                    recipient: officer_email,
                    kind: AttemptKind::Email,
                });
            }
            attempts.push(Attempt {
                action: EscalationAction::Tier2ExecutiveEmail,
                recipient: contacts.executive.as_ref().map(|c| c.email.clone()),
                kind: AttemptKind::Email,
            });
            attempts.push(Attempt {
                action: EscalationAction::Tier2ExecutiveSms,
                recipient: contacts.executive.as_ref().and_then(|c| c.phone.clone()),
                kind: AttemptKind::Sms,
            });
        }
        _ => {
            attempts.push(Attempt {
                action: EscalationAction::Tier3AuthorityEmail,
                recipient: contacts.authority.as_ref().map(|c| c.email.clone()),
                kind: AttemptKind::Email,
            });
            if let Some(phone) = contacts.authority.as_ref().and_then(|c| c.phone.clone()) {
                attempts.push(Attempt {
                    action: EscalationAction::Tier3AuthoritySms,
                    recipient: Some(phone),
                    kind: AttemptKind::Sms,
                });
            }
        }
    }
    Ok(attempts)
}

fn sms_text(issue: &Issue, tier: SlaTier) -> String {
    format!(
        "civictrack {}: {} report escalated to {} (zone {})",
        issue.id,
        issue.category,
        tier,
        issue.zone_id.as_deref().unwrap_or("unrouted"),
    )
}
