use crate::config;
use crate::error::Result;
use crate::query;
use chrono::Utc;

/// Execute the backlog command.
///
/// # Errors
///
/// Returns an error on database failure.
pub fn execute(json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let storage = config::open_storage(&workspace, overrides)?;
    let backlog = query::critical_backlog(&storage, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&backlog)?);
        return Ok(());
    }

    if backlog.is_empty() {
        println!("Critical backlog is empty");
        return Ok(());
    }
    for snapshot in &backlog {
        let issue = &snapshot.issue;
        println!(
            "{:<12} {:<12} x{:<4} {:.0}h  {}",
            issue.id,
            issue.state.as_str(),
            issue.supporter_count,
            snapshot.sla.hours_elapsed,
            issue.zone_id.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
