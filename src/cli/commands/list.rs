use crate::cli::ListArgs;
use crate::config;
use crate::error::Result;
use crate::model::{Issue, IssueState};

/// Execute the list command.
///
/// # Errors
///
/// Returns an error for invalid state filters or database failure.
pub fn execute(args: &ListArgs, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let storage = config::open_storage(&workspace, overrides)?;

    let states = args
        .states
        .iter()
        .map(|s| s.parse())
        .collect::<Result<Vec<IssueState>>>()?;

    let mut issues = match &args.zone {
        Some(zone_id) => storage.issues_in_zone(zone_id)?,
        None if states.is_empty() => storage.list_issues()?,
        None => storage.issues_in_states(&states)?,
    };
    if args.zone.is_some() && !states.is_empty() {
        issues.retain(|issue| states.contains(&issue.state));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues found");
        return Ok(());
    }
    for issue in &issues {
        println!("{}", format_row(issue));
    }
    Ok(())
}

fn format_row(issue: &Issue) -> String {
    let mut description = issue.description.clone();
    if description.len() > 60 {
        description.truncate(57);
        description.push_str("...");
    }
    format!(
        "{:<12} {:<12} {} {:<12} x{:<4} {}",
        issue.id,
        issue.state.as_str(),
        issue.sla_tier,
        issue.category.as_str(),
        issue.supporter_count,
        description
    )
}
