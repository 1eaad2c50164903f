//! Submission ingestion pipeline: spatial routing + duplicate merge.
//!
//! A new submission is validated, routed to the ward whose polygon
//! contains its coordinate, and checked against existing open roots of
//! the same category within [`DUPLICATE_RADIUS_M`]. A match makes the
//! submission a MERGED child of the earliest such root; otherwise it
//! becomes a new SUBMITTED root.
//!
//! The duplicate search, parent supporter bump, and insert all run in
//! one immediate transaction, so a lost update on `supporter_count` is
//! impossible. Two *concurrent* submissions that both see "no existing
//! match" before either commits still become separate roots; that
//! narrow race is accepted rather than paid for with serializable
//! isolation.

use crate::error::{CivicError, Result};
use crate::events::{EventBus, IssueEvent, IssueEventKind};
use crate::geo::Coordinate;
use crate::model::{is_emergency, Category, Issue, IssueState, Severity, SlaTier, Zone};
use crate::storage::SqliteStorage;
use crate::util::id::IdGenerator;
use crate::validation::validate_ingest;
use chrono::Utc;
use tracing::{debug, info};

/// Radius within which a same-category open root is a duplicate.
pub const DUPLICATE_RADIUS_M: f64 = 50.0;

/// A citizen submission, before validation.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub category: Category,
    pub description: String,
    pub location_text: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub severity: Severity,
    pub reporter_ref: Option<String>,
    pub photo_ref: Option<String>,
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestOutcome {
    /// ID of the newly created record (root or merged child).
    pub issue_id: String,
    /// True if the record was merged into an existing root.
    pub merged: bool,
    /// The root it was merged into, when `merged`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Governing zone, if the coordinate fell inside one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

/// Resolves a coordinate to its governing zone by point-in-polygon
/// lookup over the reference polygon set.
#[derive(Debug, Clone)]
pub struct SpatialRouter {
    zones: Vec<Zone>,
}

impl SpatialRouter {
    #[must_use]
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// Load the zone reference set from storage.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub fn from_storage(storage: &SqliteStorage) -> Result<Self> {
        Ok(Self::new(storage.list_zones()?))
    }

    /// First (and, zones being non-overlapping, expected-only) zone whose
    /// polygon contains the coordinate. `None` if outside all zones;
    /// routing failure is not fatal to a submission.
    #[must_use]
    pub fn route(&self, coordinate: Coordinate) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|zone| zone.polygon.contains(coordinate))
    }

    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

/// Ingest a submission: validate, route, dedup, persist.
///
/// # Errors
///
/// Returns a validation error before any persistence, or a database
/// error if the transaction fails. Routing and dedup misses are normal
/// outcomes, not errors.
pub fn ingest(
    storage: &mut SqliteStorage,
    router: &SpatialRouter,
    bus: Option<&EventBus>,
    request: IngestRequest,
) -> Result<IngestOutcome> {
    validate_ingest(&request).map_err(CivicError::from_validation_errors)?;

    let now = Utc::now();
    let zone_id = request
        .coordinate
        .and_then(|coord| router.route(coord))
        .map(|zone| zone.id.clone());
    if zone_id.is_none() && request.coordinate.is_some() {
        debug!("submission coordinate outside all zone polygons");
    }

    // ID generation reads outside the write transaction; the insert still
    // fails on the (vanishingly rare) collision committed in between.
    let id_gen = IdGenerator::with_defaults();
    let count = storage.count_issues()?;
    let id = id_gen.generate(
        &request.description,
        request.category.as_str(),
        now,
        usize::try_from(count).unwrap_or(0),
        |candidate| storage.id_exists(candidate).unwrap_or(false),
    );

    let outcome = storage.mutate("ingest", |tx, _ctx| {
        let duplicate = match request.coordinate {
            Some(coord) => {
                SqliteStorage::find_duplicate_tx(tx, request.category, coord, DUPLICATE_RADIUS_M)?
            }
            None => None,
        };

        let (state, parent_id) = match &duplicate {
            Some(parent) => (IssueState::Merged, Some(parent.id.clone())),
            None => (IssueState::Submitted, None),
        };

        let issue = Issue {
            id: id.clone(),
            category: request.category,
            description: request.description.clone(),
            location_text: request.location_text.clone(),
            coordinate: request.coordinate,
            zone_id: zone_id.clone(),
            parent_id: parent_id.clone(),
            supporter_count: 1,
            severity: request.severity,
            is_emergency: is_emergency(request.severity, 1),
            state,
            created_at: now,
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
            reporter_ref: request.reporter_ref.clone(),
            photo_ref: request.photo_ref.clone(),
        };
        SqliteStorage::insert_issue_tx(tx, &issue)?;

        if let Some(parent) = duplicate {
            let new_count = SqliteStorage::increment_supporters_tx(tx, &parent.id)?;
            SqliteStorage::set_emergency_tx(
                tx,
                &parent.id,
                is_emergency(parent.severity, new_count),
            )?;
            Ok(IngestOutcome {
                issue_id: id.clone(),
                merged: true,
                parent_id: Some(parent.id),
                zone_id: zone_id.clone(),
            })
        } else {
            Ok(IngestOutcome {
                issue_id: id.clone(),
                merged: false,
                parent_id: None,
                zone_id: zone_id.clone(),
            })
        }
    })?;

    info!(
        issue_id = %outcome.issue_id,
        merged = outcome.merged,
        zone = outcome.zone_id.as_deref().unwrap_or("-"),
        "submission ingested"
    );

    if let Some(bus) = bus {
        let kind = outcome.parent_id.as_ref().map_or(
            IssueEventKind::Submitted,
            |parent_id| IssueEventKind::Merged {
                parent_id: parent_id.clone(),
            },
        );
        bus.publish(IssueEvent {
            issue_id: outcome.issue_id.clone(),
            kind,
        });
    }

    Ok(outcome)
}
