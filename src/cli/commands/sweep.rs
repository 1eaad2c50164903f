use crate::cli::SweepArgs;
use crate::config::{self, Config};
use crate::error::Result;
use crate::notify::LogDispatcher;
use crate::sweep::{escalation, promotion};
use chrono::Utc;

/// Execute both sweeps once (or one of them with a flag).
///
/// # Errors
///
/// Returns an error if a candidate scan fails; per-issue failures are
/// reported in the summary instead.
pub fn execute(args: &SweepArgs, json: bool, overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let config = Config::load(&workspace)?;
    let mut storage = config::open_storage(&workspace, overrides)?;
    let now = Utc::now();

    let run_escalation = !args.promotion;
    let run_promotion = !args.escalation;

    let escalation_report = if run_escalation {
        Some(escalation::run(
            &mut storage,
            &LogDispatcher,
            &config.contacts,
            None,
            now,
        )?)
    } else {
        None
    };
    let promotion_report = if run_promotion {
        Some(promotion::run(&mut storage, None, now)?)
    } else {
        None
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "escalation": escalation_report,
                "promotion": promotion_report,
            }))?
        );
        return Ok(());
    }

    if let Some(report) = escalation_report {
        println!(
            "Escalation: scanned {}, escalated {}, dispatched {} ({} failed), errors {}",
            report.scanned,
            report.escalated,
            report.dispatched,
            report.dispatch_failures,
            report.errors
        );
    }
    if let Some(report) = promotion_report {
        println!(
            "Promotion:  scanned {}, verified {}, assigned {}, tier forced {}, errors {}",
            report.scanned,
            report.auto_verified,
            report.auto_assigned,
            report.tier_forced,
            report.errors
        );
    }
    Ok(())
}
