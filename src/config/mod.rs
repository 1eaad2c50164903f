//! Configuration management for `civictrack`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`CIVICTRACK_DB`, `CIVICTRACK_LOCK_TIMEOUT_MS`)
//! 3. Workspace config (.civictrack/config.json)
//! 4. Defaults

use crate::error::{CivicError, Result};
use crate::model::OfficerContact;
use crate::storage::SqliteStorage;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace directory name, discovered by walking up from the cwd.
pub const WORKSPACE_DIR: &str = ".civictrack";
/// Default database filename inside the workspace directory.
pub const DEFAULT_DB_FILENAME: &str = "civictrack.db";
/// Config filename inside the workspace directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Recipients above the ward officer in the escalation chain.
///
/// Tier 2 fans out to the executive; tier 3 to the top authority.
/// Missing contacts are recorded as failed dispatch attempts in the
/// audit log rather than silently skipped.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct EscalationContacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive: Option<OfficerContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<OfficerContact>,
}

/// Workspace configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Escalation sweep period in seconds.
    #[serde(default = "default_escalation_interval")]
    pub escalation_interval_secs: u64,

    /// Auto-promotion sweep period in seconds.
    #[serde(default = "default_promotion_interval")]
    pub promotion_interval_secs: u64,

    /// Escalation chain above the ward officer.
    #[serde(default)]
    pub contacts: EscalationContacts,

    /// `SQLite` busy timeout in ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_timeout_ms: Option<u64>,
}

const fn default_escalation_interval() -> u64 {
    900 // 15 minutes
}

const fn default_promotion_interval() -> u64 {
    1800 // 30 minutes
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escalation_interval_secs: default_escalation_interval(),
            promotion_interval_secs: default_promotion_interval(),
            contacts: EscalationContacts::default(),
            lock_timeout_ms: None,
        }
    }
}

impl Config {
    /// Load config.json from the workspace directory, falling back to
    /// defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(workspace_dir: &Path) -> Result<Self> {
        let path = workspace_dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CivicError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Write config.json to the workspace directory.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or I/O failure.
    pub fn save(&self, workspace_dir: &Path) -> Result<()> {
        let path = workspace_dir.join(CONFIG_FILENAME);
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// CLI-level overrides, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub lock_timeout: Option<u64>,
}

/// Walk up from `start` (or the cwd) looking for a `.civictrack` directory.
///
/// # Errors
///
/// Returns [`CivicError::NotInitialized`] if no workspace is found.
pub fn discover_workspace(start: Option<&Path>) -> Result<PathBuf> {
    let start = match start {
        Some(path) => path.to_path_buf(),
        None => env::current_dir()?,
    };
    let mut dir = start.as_path();
    loop {
        let candidate = dir.join(WORKSPACE_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(CivicError::NotInitialized),
        }
    }
}

/// Create a workspace directory, database, and default config.
///
/// # Errors
///
/// Returns [`CivicError::AlreadyInitialized`] if the workspace exists
/// and `force` is not set.
pub fn init_workspace(parent: &Path, force: bool) -> Result<PathBuf> {
    let workspace = parent.join(WORKSPACE_DIR);
    if workspace.exists() && !force {
        return Err(CivicError::AlreadyInitialized { path: workspace });
    }
    fs::create_dir_all(&workspace)?;
    Config::default().save(&workspace)?;
    // Touch the database so the schema exists from the start.
    let _storage = SqliteStorage::open(&db_path(&workspace, &CliOverrides::default()))?;
    Ok(workspace)
}

/// Resolve the database path from overrides, environment, then default.
#[must_use]
pub fn db_path(workspace_dir: &Path, overrides: &CliOverrides) -> PathBuf {
    if let Some(db) = overrides.db.clone() {
        return db;
    }
    if let Ok(db) = env::var("CIVICTRACK_DB") {
        if !db.trim().is_empty() {
            return PathBuf::from(db);
        }
    }
    workspace_dir.join(DEFAULT_DB_FILENAME)
}

/// Resolve the lock timeout from overrides, environment, then config.
#[must_use]
pub fn lock_timeout_ms(config: &Config, overrides: &CliOverrides) -> Option<u64> {
    if overrides.lock_timeout.is_some() {
        return overrides.lock_timeout;
    }
    if let Ok(value) = env::var("CIVICTRACK_LOCK_TIMEOUT_MS") {
        if let Ok(ms) = value.parse() {
            return Some(ms);
        }
    }
    config.lock_timeout_ms
}

/// Open storage for the discovered workspace with all overrides applied.
///
/// # Errors
///
/// Returns an error if the workspace is missing or the database cannot
/// be opened.
pub fn open_storage(workspace_dir: &Path, overrides: &CliOverrides) -> Result<SqliteStorage> {
    let config = Config::load(workspace_dir)?;
    let path = db_path(workspace_dir, overrides);
    SqliteStorage::open_with_timeout(&path, lock_timeout_ms(&config, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_and_discover() {
        let dir = TempDir::new().unwrap();
        let workspace = init_workspace(dir.path(), false).unwrap();
        assert!(workspace.join(CONFIG_FILENAME).exists());
        assert!(workspace.join(DEFAULT_DB_FILENAME).exists());

        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let found = discover_workspace(Some(&nested)).unwrap();
        assert_eq!(found, workspace);
    }

    #[test]
    fn double_init_requires_force() {
        let dir = TempDir::new().unwrap();
        init_workspace(dir.path(), false).unwrap();
        assert!(matches!(
            init_workspace(dir.path(), false),
            Err(CivicError::AlreadyInitialized { .. })
        ));
        init_workspace(dir.path(), true).unwrap();
    }

    #[test]
    fn config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            escalation_interval_secs: 60,
            promotion_interval_secs: 120,
            contacts: EscalationContacts {
                executive: Some(OfficerContact {
                    name: "Exec".to_string(),
                    email: "exec@city.test".to_string(),
                    phone: Some("+15550199".to_string()),
                }),
                authority: None,
            },
            lock_timeout_ms: Some(500),
        };
        config.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.escalation_interval_secs, 900);
        assert_eq!(config.promotion_interval_secs, 1800);
    }

    #[test]
    fn cli_override_beats_default_db_path() {
        let dir = TempDir::new().unwrap();
        let overrides = CliOverrides {
            db: Some(PathBuf::from("/tmp/custom.db")),
            lock_timeout: None,
        };
        assert_eq!(
            db_path(dir.path(), &overrides),
            PathBuf::from("/tmp/custom.db")
        );
    }
}
