//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Civic issue lifecycle engine (`SQLite`)
#[derive(Parser, Debug)]
#[command(name = "cvt", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (auto-discover .civictrack/civictrack.db if not set)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a civictrack workspace
    Init {
        /// Overwrite an existing workspace
        #[arg(long)]
        force: bool,
    },

    /// Ingest a citizen submission (routes, dedups, persists)
    Ingest(IngestArgs),

    /// Apply a guarded state transition
    Transition(TransitionArgs),

    /// Show issue details with SLA classification
    Show {
        /// Issue ID
        id: String,
    },

    /// List issues
    List(ListArgs),

    /// List the tier-3 unresolved backlog
    Backlog,

    /// Show the escalation audit log for an issue
    Log {
        /// Issue ID
        id: String,
    },

    /// Show performance statistics for a zone
    Stats {
        /// Zone ID
        zone: String,
    },

    /// Manage ward zones
    Zone {
        #[command(subcommand)]
        command: ZoneCommands,
    },

    /// Run the escalation and auto-promotion sweeps once
    Sweep(SweepArgs),

    /// Run the sweeps on a schedule until interrupted
    Watch,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Issue category (pothole, streetlight, garbage, flooding, sidewalk, graffiti, other)
    #[arg(long)]
    pub category: String,

    /// Free-text description
    pub description: String,

    /// Free-text location
    #[arg(long)]
    pub location: Option<String>,

    /// Latitude in decimal degrees
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude in decimal degrees
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,

    /// Severity (low, medium, high, critical)
    #[arg(long, default_value = "medium")]
    pub severity: String,

    /// Opaque reporter reference
    #[arg(long)]
    pub reporter: Option<String>,

    /// Opaque photo reference
    #[arg(long)]
    pub photo: Option<String>,
}

#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Issue ID
    pub id: String,

    /// Target state (verified, assigned, in_progress, resolved)
    pub to: String,

    /// Acting officer's latitude (required for in_progress)
    #[arg(long, requires = "officer_lon")]
    pub officer_lat: Option<f64>,

    /// Acting officer's longitude (required for in_progress)
    #[arg(long, requires = "officer_lat")]
    pub officer_lon: Option<f64>,

    /// Officer name to record on assignment
    #[arg(long)]
    pub officer_name: Option<String>,

    /// Officer email to record on assignment
    #[arg(long)]
    pub officer_email: Option<String>,

    /// Officer phone to record on assignment
    #[arg(long)]
    pub officer_phone: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by state (repeatable)
    #[arg(long = "state")]
    pub states: Vec<String>,

    /// Filter by zone ID
    #[arg(long)]
    pub zone: Option<String>,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Run only the escalation sweep
    #[arg(long, conflicts_with = "promotion")]
    pub escalation: bool,

    /// Run only the auto-promotion sweep
    #[arg(long, conflicts_with = "escalation")]
    pub promotion: bool,
}

#[derive(Subcommand, Debug)]
pub enum ZoneCommands {
    /// Import zone definitions from a JSON file
    Import {
        /// Path to a JSON array of zones
        file: PathBuf,
    },

    /// List configured zones
    List,
}
