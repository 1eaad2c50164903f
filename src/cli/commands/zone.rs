use crate::cli::ZoneCommands;
use crate::config;
use crate::error::{CivicError, Result};
use crate::model::Zone;
use std::fs;

/// Execute a zone subcommand.
///
/// # Errors
///
/// Returns an error if the import file is unreadable or malformed, or
/// on database failure.
pub fn execute(command: &ZoneCommands, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let mut storage = config::open_storage(&workspace, overrides)?;

    match command {
        ZoneCommands::Import { file } => {
            let contents = fs::read_to_string(file)?;
            let zones: Vec<Zone> = serde_json::from_str(&contents)
                .map_err(|e| CivicError::Config(format!("{}: {e}", file.display())))?;
            for zone in &zones {
                storage.upsert_zone(zone)?;
            }
            if json {
                println!("{}", serde_json::json!({ "imported": zones.len() }));
            } else {
                println!("Imported {} zone(s)", zones.len());
            }
        }
        ZoneCommands::List => {
            let zones = storage.list_zones()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&zones)?);
            } else if zones.is_empty() {
                println!("No zones configured");
            } else {
                for zone in &zones {
                    println!(
                        "{:<12} {:<10} {:<20} {} <{}>",
                        zone.id, zone.zone_label, zone.name, zone.officer.name, zone.officer.email
                    );
                }
            }
        }
    }
    Ok(())
}
