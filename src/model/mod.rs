//! Core data types for `civictrack`.
//!
//! This module defines the fundamental types used throughout the engine:
//! - `Issue` - The central work item (a citizen report)
//! - `IssueState` - Workflow lifecycle states
//! - `Category` - Closed set of infrastructure issue categories
//! - `Severity` - Reporter-supplied severity tier
//! - `SlaTier` - Monotonic 0-3 escalation high-water mark
//! - `Zone` - Administrative ward with a responsible-officer contact
//! - `EscalationLogEntry` - Append-only audit log row

use crate::geo::{Coordinate, Polygon};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Supporter count at which a report is flagged as an emergency
/// regardless of its severity.
pub const EMERGENCY_SUPPORTER_THRESHOLD: i64 = 10;

/// Issue workflow state.
///
/// Transitions follow a strict linear graph (no skipping):
/// `Submitted -> Verified -> Assigned -> InProgress -> Resolved`.
/// `Merged` is assigned only at creation for duplicate children and is
/// never reachable via a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    #[default]
    Submitted,
    Verified,
    Assigned,
    InProgress,
    Resolved,
    Merged,
}

impl IssueState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Merged => "merged",
        }
    }

    /// The set of states reachable from this one via `transition`.
    ///
    /// `Merged` and `Resolved` are terminal; `Merged` additionally has no
    /// inbound transition edge (creation-only).
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Self::Submitted => &[Self::Verified],
            Self::Verified => &[Self::Assigned],
            Self::Assigned => &[Self::InProgress],
            Self::InProgress => &[Self::Resolved],
            Self::Resolved | Self::Merged => &[],
        }
    }

    /// Terminal states never re-enter the active workflow.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Merged)
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueState {
    type Err = crate::error::CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "submitted" => Ok(Self::Submitted),
            "verified" => Ok(Self::Verified),
            "assigned" => Ok(Self::Assigned),
            "in_progress" | "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "merged" => Ok(Self::Merged),
            other => Err(crate::error::CivicError::InvalidState {
                state: other.to_string(),
            }),
        }
    }
}

/// Infrastructure issue category (closed enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pothole,
    Streetlight,
    Garbage,
    Flooding,
    Sidewalk,
    Graffiti,
    #[default]
    Other,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pothole => "pothole",
            Self::Streetlight => "streetlight",
            Self::Garbage => "garbage",
            Self::Flooding => "flooding",
            Self::Sidewalk => "sidewalk",
            Self::Graffiti => "graffiti",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::error::CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pothole" => Ok(Self::Pothole),
            "streetlight" => Ok(Self::Streetlight),
            "garbage" => Ok(Self::Garbage),
            "flooding" => Ok(Self::Flooding),
            "sidewalk" => Ok(Self::Sidewalk),
            "graffiti" => Ok(Self::Graffiti),
            "other" => Ok(Self::Other),
            other => Err(crate::error::CivicError::InvalidCategory {
                category: other.to_string(),
            }),
        }
    }
}

/// Reporter-supplied severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = crate::error::CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(crate::error::CivicError::InvalidSeverity {
                severity: other.to_string(),
            }),
        }
    }
}

/// SLA escalation tier (0=on schedule, 3=top authority).
///
/// Stored as a high-water mark: writers only ever raise it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct SlaTier(pub i32);

impl SlaTier {
    pub const NONE: Self = Self(0);
    pub const OFFICER: Self = Self(1);
    pub const EXECUTIVE: Self = Self(2);
    pub const AUTHORITY: Self = Self(3);
    pub const MAX: Self = Self(3);

    /// High-water-mark raise: returns the greater of the two tiers.
    #[must_use]
    pub fn raised_to(self, target: Self) -> Self {
        self.max(target)
    }
}

impl fmt::Display for SlaTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// The emergency flag rule, expressed once as a pure function.
///
/// Invoked by every writer that touches severity or supporter count
/// (ingestion, merge) rather than derived in storage.
#[must_use]
pub fn is_emergency(severity: Severity, supporter_count: i64) -> bool {
    severity == Severity::Critical || supporter_count >= EMERGENCY_SUPPORTER_THRESHOLD
}

/// Responsible-officer contact triple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OfficerContact {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Administrative zone (ward) with its governing polygon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Zone {
    /// Unique ID (e.g., "ward-07").
    pub id: String,

    /// Human name (e.g., "Riverside").
    pub name: String,

    /// Administrative label (e.g., "Ward 7").
    pub zone_label: String,

    /// Responsible officer for tier-1 escalations and auto-assignment.
    pub officer: OfficerContact,

    /// Governing polygon (vertex list, lat/lon).
    pub polygon: Polygon,
}

/// The central issue entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    /// Unique ID (e.g., "ct-abc123").
    pub id: String,

    /// Issue category.
    pub category: Category,

    /// Citizen-supplied description (non-empty).
    pub description: String,

    /// Free-text location hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,

    /// Report coordinate. Required for routing, dedup, and the geofence
    /// guard; a report without one is still accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,

    /// Governing zone, if the coordinate fell inside a known polygon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    /// Parent issue for merged duplicates. Set only at creation; a root
    /// never acquires a parent retroactively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// 1 + number of merged duplicates (meaningful on roots).
    pub supporter_count: i64,

    /// Reporter-supplied severity.
    #[serde(default)]
    pub severity: Severity,

    /// Derived emergency flag; see [`is_emergency`].
    #[serde(default)]
    pub is_emergency: bool,

    /// Workflow state.
    #[serde(default)]
    pub state: IssueState,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Per-state timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Stored SLA tier (high-water mark, only raised).
    #[serde(default)]
    pub sla_tier: SlaTier,

    /// Timestamp of the most recent escalation-sweep tier raise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_escalated_at: Option<DateTime<Utc>>,

    /// Timestamp of the most recent auto-promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_escalated_at: Option<DateTime<Utc>>,

    /// Assigned-officer contact snapshot (copied at assignment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_phone: Option<String>,

    /// Opaque reporter reference (client identity is out of scope).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_ref: Option<String>,

    /// Opaque photo reference (image handling is out of scope).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<String>,
}

impl Issue {
    /// The timestamp the SLA clock runs from: assignment if it happened,
    /// otherwise creation.
    #[must_use]
    pub fn sla_anchor(&self) -> DateTime<Utc> {
        self.assigned_at.unwrap_or(self.created_at)
    }

    /// Root issues carry the supporter count and are dedup candidates.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Stored officer contact snapshot, if complete enough to notify.
    #[must_use]
    pub fn officer_contact(&self) -> Option<OfficerContact> {
        let email = self.officer_email.clone()?;
        Some(OfficerContact {
            name: self.officer_name.clone().unwrap_or_default(),
            email,
            phone: self.officer_phone.clone(),
        })
    }
}

/// Escalation audit action tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EscalationAction {
    Tier1OfficerEmail,
    Tier2OfficerEmail,
    Tier2ExecutiveEmail,
    Tier2ExecutiveSms,
    Tier3AuthorityEmail,
    Tier3AuthoritySms,
    AutoVerified,
    AutoAssigned,
    AutoTierRaise,
    Custom(String),
}

impl EscalationAction {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tier1OfficerEmail => "tier1_officer_email",
            Self::Tier2OfficerEmail => "tier2_officer_email",
            Self::Tier2ExecutiveEmail => "tier2_executive_email",
            Self::Tier2ExecutiveSms => "tier2_executive_sms",
            Self::Tier3AuthorityEmail => "tier3_authority_email",
            Self::Tier3AuthoritySms => "tier3_authority_sms",
            Self::AutoVerified => "auto_verified",
            Self::AutoAssigned => "auto_assigned",
            Self::AutoTierRaise => "auto_tier_raise",
            Self::Custom(value) => value,
        }
    }
}

impl Serialize for EscalationAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EscalationAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_tag(value))
    }
}

impl EscalationAction {
    fn from_tag(value: String) -> Self {
        match value.as_str() {
            "tier1_officer_email" => Self::Tier1OfficerEmail,
            "tier2_officer_email" => Self::Tier2OfficerEmail,
            "tier2_executive_email" => Self::Tier2ExecutiveEmail,
            "tier2_executive_sms" => Self::Tier2ExecutiveSms,
            "tier3_authority_email" => Self::Tier3AuthorityEmail,
            "tier3_authority_sms" => Self::Tier3AuthoritySms,
            "auto_verified" => Self::AutoVerified,
            "auto_assigned" => Self::AutoAssigned,
            "auto_tier_raise" => Self::AutoTierRaise,
            _ => Self::Custom(value),
        }
    }
}

impl fmt::Display for EscalationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry in the append-only escalation audit log.
///
/// Rows are never mutated or deleted; they answer "has this notification
/// already fired" and serve as the operational audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationLogEntry {
    pub id: i64,
    pub issue_id: String,
    pub tier: SlaTier,
    pub action: EscalationAction,
    pub recipient: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_allowed_next_is_strict_linear() {
        assert_eq!(IssueState::Submitted.allowed_next(), &[IssueState::Verified]);
        assert_eq!(IssueState::Verified.allowed_next(), &[IssueState::Assigned]);
        assert_eq!(IssueState::Assigned.allowed_next(), &[IssueState::InProgress]);
        assert_eq!(IssueState::InProgress.allowed_next(), &[IssueState::Resolved]);
        assert!(IssueState::Resolved.allowed_next().is_empty());
        assert!(IssueState::Merged.allowed_next().is_empty());
    }

    #[test]
    fn merged_has_no_inbound_edge() {
        for state in [
            IssueState::Submitted,
            IssueState::Verified,
            IssueState::Assigned,
            IssueState::InProgress,
            IssueState::Resolved,
        ] {
            assert!(!state.allowed_next().contains(&IssueState::Merged));
        }
    }

    #[test]
    fn state_serde_roundtrip() {
        let state: IssueState = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(state, IssueState::InProgress);
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"in_progress\"");
    }

    #[test]
    fn category_rejects_unknown() {
        assert!(Category::from_str("pothole").is_ok());
        assert!(Category::from_str("meteor_strike").is_err());
    }

    #[test]
    fn emergency_rule() {
        assert!(is_emergency(Severity::Critical, 1));
        assert!(is_emergency(Severity::Low, 10));
        assert!(!is_emergency(Severity::High, 9));
        assert!(!is_emergency(Severity::Medium, 1));
    }

    #[test]
    fn tier_raised_to_is_monotone() {
        assert_eq!(SlaTier(2).raised_to(SlaTier(1)), SlaTier(2));
        assert_eq!(SlaTier(1).raised_to(SlaTier(3)), SlaTier(3));
        assert_eq!(SlaTier::NONE.raised_to(SlaTier::NONE), SlaTier::NONE);
    }

    #[test]
    fn escalation_action_tag_roundtrip() {
        let action: EscalationAction = serde_json::from_str("\"tier2_executive_sms\"").unwrap();
        assert_eq!(action, EscalationAction::Tier2ExecutiveSms);
        let json = serde_json::to_string(&EscalationAction::AutoVerified).unwrap();
        assert_eq!(json, "\"auto_verified\"");
    }

    #[test]
    fn sla_anchor_prefers_assignment() {
        use chrono::TimeZone;
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let assigned = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();
        let mut issue = test_issue();
        issue.created_at = created;
        assert_eq!(issue.sla_anchor(), created);
        issue.assigned_at = Some(assigned);
        assert_eq!(issue.sla_anchor(), assigned);
    }

    fn test_issue() -> Issue {
        Issue {
            id: "ct-test".to_string(),
            category: Category::Pothole,
            description: "test".to_string(),
            location_text: None,
            coordinate: None,
            zone_id: None,
            parent_id: None,
            supporter_count: 1,
            severity: Severity::Medium,
            is_emergency: false,
            state: IssueState::Submitted,
            created_at: Utc::now(),
            verified_at: None,
            assigned_at: None,
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
}
