//! Periodic sweep bodies.
//!
//! Each sweep is a plain function over storage so it can run from the
//! [`crate::scheduler`] tasks, from the CLI, or directly in tests. Both
//! are idempotent: predicates re-check current state and timestamps, so
//! re-running a sweep against already-processed issues changes nothing.

pub mod escalation;
pub mod promotion;

use chrono::{DateTime, Utc};

/// Fractional hours between two instants.
#[must_use]
pub(crate) fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    later.signed_duration_since(earlier).num_milliseconds() as f64 / 3_600_000.0
}
