//! `civictrack` — civic issue lifecycle engine.
//!
//! Manages citizen-submitted infrastructure issues from submission to
//! resolution: spatial routing to a governing ward, duplicate-merge
//! detection, a guarded workflow state machine, SLA classification, and
//! two periodic sweeps (escalation, auto-promotion) that enforce
//! time-bound accountability.
//!
//! # Architecture
//!
//! - [`model`] - Core types (`Issue`, `IssueState`, `Zone`, audit log entries)
//! - [`geo`] - Coordinates, haversine distance, point-in-polygon
//! - [`storage`] - SQLite persistence with a transactional mutation protocol
//! - [`ingest`] - Submission pipeline (routing + duplicate merge)
//! - [`lifecycle`] - Guarded state transitions with the geofence check
//! - [`sla`] - Pure SLA clock and classification
//! - [`sweep`] - Escalation and auto-promotion sweep bodies
//! - [`scheduler`] - Periodic sweep tasks (tokio interval + stop signal)
//! - [`events`] - Publish/subscribe for live issue updates
//! - [`query`] - Read-model: snapshots, zone aggregates, critical backlog
//! - [`notify`] - Notification dispatcher seam (email/SMS, non-throwing)

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod ingest;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod notify;
pub mod query;
pub mod scheduler;
pub mod sla;
pub mod storage;
pub mod sweep;
pub mod util;
pub mod validation;

pub use error::{CivicError, Result};
