//! Error types and handling for `civictrack`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration at the edges (CLI, config loading)
//! - Provides recovery hints for user-facing errors
//! - Guard failures carry enough context (measured distance, allowed
//!   states) for the caller to render an actionable message

use crate::model::IssueState;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `civictrack` operations.
#[derive(Error, Debug)]
pub enum CivicError {
    // === Storage Errors ===
    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Lookup Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: String },

    /// Zone with the specified ID was not found.
    #[error("Zone not found: {id}")]
    ZoneNotFound { id: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Unknown issue category.
    #[error("Invalid category: {category}")]
    InvalidCategory { category: String },

    /// Unknown severity value.
    #[error("Invalid severity: {severity}")]
    InvalidSeverity { severity: String },

    /// Unknown workflow state value.
    #[error("Invalid state: {state}")]
    InvalidState { state: String },

    // === Workflow Errors ===
    /// Requested transition is not in the allowed-next set.
    #[error("Invalid transition {from} -> {to} (allowed: {allowed:?})")]
    InvalidTransition {
        from: IssueState,
        to: IssueState,
        allowed: Vec<IssueState>,
    },

    /// Geofence guard cannot run because a coordinate is missing.
    #[error("Geofence check unavailable: {reason}")]
    GeofenceUnavailable { reason: String },

    /// Officer is too far from the issue location.
    #[error("Geofence violation: officer is {distance_m:.0}m away (limit {limit_m:.0}m)")]
    GeofenceViolation { distance_m: f64, limit_m: f64 },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("civictrack not initialized: run 'cvt init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapped anyhow error for edge integrations.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl CivicError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseNotFound { .. }
                | Self::NotInitialized
                | Self::IssueNotFound { .. }
                | Self::ZoneNotFound { .. }
                | Self::Validation { .. }
                | Self::ValidationErrors { .. }
                | Self::InvalidCategory { .. }
                | Self::InvalidSeverity { .. }
                | Self::InvalidState { .. }
                | Self::InvalidTransition { .. }
                | Self::GeofenceUnavailable { .. }
                | Self::GeofenceViolation { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: cvt init"),
            Self::DatabaseNotFound { .. } => Some("Check path or run: cvt init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::InvalidCategory { .. } => Some(
                "Valid categories: pothole, streetlight, garbage, flooding, sidewalk, graffiti, other",
            ),
            Self::InvalidSeverity { .. } => Some("Valid severities: low, medium, high, critical"),
            Self::InvalidState { .. } => Some(
                "Valid states: submitted, verified, assigned, in_progress, resolved, merged",
            ),
            Self::InvalidTransition { .. } => {
                Some("States advance one step at a time; check the allowed set")
            }
            Self::GeofenceUnavailable { .. } => {
                Some("Supply --officer-lat/--officer-lon and ensure the issue has a coordinate")
            }
            Self::GeofenceViolation { .. } => {
                Some("Move within 100m of the reported location and retry")
            }
            _ => None,
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        1
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `CivicError`.
pub type Result<T> = std::result::Result<T, CivicError>;
