use crate::cli::IngestArgs;
use crate::config;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::ingest::{ingest, IngestRequest, SpatialRouter};

/// Execute the ingest command.
///
/// # Errors
///
/// Returns an error if validation fails or the database cannot be
/// written.
pub fn execute(args: IngestArgs, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let mut storage = config::open_storage(&workspace, overrides)?;
    let router = SpatialRouter::from_storage(&storage)?;

    let coordinate = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    };
    let request = IngestRequest {
        category: args.category.parse()?,
        description: args.description,
        location_text: args.location,
        coordinate,
        severity: args.severity.parse()?,
        reporter_ref: args.reporter,
        photo_ref: args.photo,
    };

    let outcome = ingest(&mut storage, &router, None, request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if let Some(parent_id) = &outcome.parent_id {
        println!(
            "Merged duplicate {} into existing report {parent_id}",
            outcome.issue_id
        );
    } else {
        match &outcome.zone_id {
            Some(zone_id) => println!("Created {} (zone {zone_id})", outcome.issue_id),
            None => println!("Created {} (no governing zone)", outcome.issue_id),
        }
    }
    Ok(())
}
