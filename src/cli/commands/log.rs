use crate::config;
use crate::error::{CivicError, Result};

/// Execute the log command.
///
/// # Errors
///
/// Returns an error for unknown IDs or database failure.
pub fn execute(id: &str, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let storage = config::open_storage(&workspace, overrides)?;

    if storage.get_issue(id)?.is_none() {
        return Err(CivicError::IssueNotFound { id: id.to_string() });
    }
    let entries = storage.escalation_log(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No escalation activity for {id}");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{}  {}  {:<22} {:<30} {}{}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.tier,
            entry.action.as_str(),
            entry.recipient,
            if entry.success { "ok" } else { "FAILED" },
            entry
                .detail
                .as_deref()
                .map(|d| format!("  ({d})"))
                .unwrap_or_default()
        );
    }
    Ok(())
}
