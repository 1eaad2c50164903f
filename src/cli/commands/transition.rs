use crate::cli::TransitionArgs;
use crate::config;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::lifecycle::{transition, GuardContext};
use crate::model::OfficerContact;

/// Execute the transition command.
///
/// # Errors
///
/// Returns an error for unknown IDs, invalid edges, or failed guards.
pub fn execute(args: TransitionArgs, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let mut storage = config::open_storage(&workspace, overrides)?;

    let officer_coordinate = match (args.officer_lat, args.officer_lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    };
    let officer = args.officer_email.map(|email| OfficerContact {
        name: args.officer_name.unwrap_or_else(|| email.clone()),
        email,
        phone: args.officer_phone,
    });
    let guard = GuardContext {
        officer_coordinate,
        officer,
    };

    let updated = transition(&mut storage, None, &args.id, args.to.parse()?, &guard)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("{} -> {}", updated.id, updated.state);
    }
    Ok(())
}
