//! SLA clock: pure, read-only classification of an issue's urgency.
//!
//! The computed tier derives from elapsed time; the *label* derives from
//! the stored tier (the high-water mark), so a report that has already
//! escalated stays visibly escalated even if it were somehow reassigned.

use crate::model::{Issue, SlaTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hours before tier 1 (ward officer).
pub const TIER1_HOURS: f64 = 72.0;
/// Hours before tier 2 (executive).
pub const TIER2_HOURS: f64 = 120.0;
/// Hours before tier 3 (top authority).
pub const TIER3_HOURS: f64 = 168.0;
/// Hours at tier 0 before the WATCH label applies.
pub const WATCH_HOURS: f64 = 48.0;

/// Human-readable SLA classification for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlaLabel {
    OnTrack,
    Watch,
    Warning,
    Urgent,
    Critical,
}

impl SlaLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "ON_TRACK",
            Self::Watch => "WATCH",
            Self::Warning => "WARNING",
            Self::Urgent => "URGENT",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for SlaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying one issue at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlaStatus {
    /// Hours since the SLA anchor (assignment, falling back to creation).
    pub hours_elapsed: f64,
    /// Tier implied by elapsed time alone (not the stored high-water mark).
    pub computed_tier: SlaTier,
    /// Label derived from the stored tier.
    pub label: SlaLabel,
    /// Hours until the next threshold crossing, `None` at the top tier.
    pub hours_until_next_tier: Option<f64>,
}

/// Highest threshold crossed by `hours`, capped at tier 3.
#[must_use]
pub fn tier_for_hours(hours: f64) -> SlaTier {
    if hours >= TIER3_HOURS {
        SlaTier(3)
    } else if hours >= TIER2_HOURS {
        SlaTier(2)
    } else if hours >= TIER1_HOURS {
        SlaTier(1)
    } else {
        SlaTier(0)
    }
}

/// Classify an issue at `now`.
#[must_use]
pub fn classify(issue: &Issue, now: DateTime<Utc>) -> SlaStatus {
    let elapsed = now.signed_duration_since(issue.sla_anchor());
    let hours_elapsed = elapsed.num_milliseconds() as f64 / 3_600_000.0;
    let computed_tier = tier_for_hours(hours_elapsed);

    let label = match issue.sla_tier.0 {
        t if t >= 3 => SlaLabel::Critical,
        t if t >= 2 => SlaLabel::Urgent,
        t if t >= 1 => SlaLabel::Warning,
        _ if hours_elapsed >= WATCH_HOURS => SlaLabel::Watch,
        _ => SlaLabel::OnTrack,
    };

    let hours_until_next_tier = match computed_tier.0 {
        0 => Some(TIER1_HOURS - hours_elapsed),
        1 => Some(TIER2_HOURS - hours_elapsed),
        2 => Some(TIER3_HOURS - hours_elapsed),
        _ => None,
    };

    SlaStatus {
        hours_elapsed,
        computed_tier,
        label,
        hours_until_next_tier,
    }
}
