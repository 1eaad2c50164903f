use crate::config;
use crate::error::Result;
use crate::query;
use chrono::Utc;

/// Execute the show command.
///
/// # Errors
///
/// Returns an error for unknown IDs or database failure.
pub fn execute(id: &str, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let storage = config::open_storage(&workspace, overrides)?;
    let snapshot = query::issue_snapshot(&storage, id, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let issue = &snapshot.issue;
    println!("{}  [{}]  {}", issue.id, issue.state, snapshot.sla.label);
    println!("  category:   {}", issue.category);
    println!("  severity:   {}", issue.severity);
    println!("  description: {}", issue.description);
    if let Some(text) = &issue.location_text {
        println!("  location:   {text}");
    }
    if let Some(coord) = issue.coordinate {
        println!("  coordinate: {:.6}, {:.6}", coord.lat, coord.lon);
    }
    if let Some(zone_id) = &issue.zone_id {
        println!("  zone:       {zone_id}");
    }
    println!("  supporters: {}", issue.supporter_count);
    if issue.is_emergency {
        println!("  emergency:  yes");
    }
    println!(
        "  sla:        {} ({:.1}h elapsed, computed {})",
        issue.sla_tier, snapshot.sla.hours_elapsed, snapshot.sla.computed_tier
    );
    if let Some(hours) = snapshot.sla.hours_until_next_tier {
        println!("  next tier:  in {hours:.1}h");
    }
    if let Some(name) = &issue.officer_name {
        println!(
            "  officer:    {name} <{}>",
            issue.officer_email.as_deref().unwrap_or("-")
        );
    }
    if let Some(parent_id) = &issue.parent_id {
        println!("  merged into: {parent_id}");
    }
    if !snapshot.merged_children.is_empty() {
        println!("  duplicates: {}", snapshot.merged_children.join(", "));
    }
    Ok(())
}
