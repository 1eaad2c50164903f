use crate::config;
use crate::error::Result;
use std::path::Path;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the workspace already exists (without `--force`)
/// or cannot be created.
pub fn execute(force: bool, json: bool) -> Result<()> {
    let workspace = config::init_workspace(Path::new("."), force)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "workspace": workspace.display().to_string() })
        );
    } else {
        println!("Initialized civictrack workspace at {}", workspace.display());
    }
    Ok(())
}
