use crate::config;
use crate::error::Result;
use crate::query;

/// Execute the stats command.
///
/// # Errors
///
/// Returns an error for unknown zones or database failure.
pub fn execute(zone_id: &str, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let storage = config::open_storage(&workspace, overrides)?;
    let stats = query::zone_stats(&storage, zone_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} ({})", stats.zone_label, stats.zone_id);
    println!("  total:       {}", stats.total_issues);
    println!("  open:        {}", stats.open_issues);
    println!("  resolved:    {}", stats.resolved_issues);
    println!("  resolution:  {:.0}%", stats.resolution_rate * 100.0);
    match stats.avg_resolution_hours {
        Some(hours) => println!("  avg close:   {hours:.1}h"),
        None => println!("  avg close:   -"),
    }
    match stats.on_time_rate {
        Some(rate) => println!("  on time:     {:.0}%", rate * 100.0),
        None => println!("  on time:     -"),
    }
    println!("  escalated:   {:.0}%", stats.escalation_rate * 100.0);
    Ok(())
}
