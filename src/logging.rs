//! Tracing setup for the CLI.
//!
//! Diagnostics go to stderr so stdout stays clean for `--json` output.
//! `RUST_LOG` overrides the verbosity flags when set.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber from the CLI verbosity flags.
///
/// `-q` silences everything below errors; each `-v` raises the floor
/// from warn to info to debug.
pub fn init(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("civictrack={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
