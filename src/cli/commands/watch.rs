use crate::config::{self, Config};
use crate::error::Result;
use crate::events::EventBus;
use crate::notify::LogDispatcher;
use crate::scheduler::{self, SchedulerConfig};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Run the sweep scheduler until interrupted.
///
/// # Errors
///
/// Returns an error if the workspace cannot be opened or the runtime
/// fails to start.
pub fn execute(overrides: &config::CliOverrides) -> Result<()> {
    let workspace = config::discover_workspace(None)?;
    let config = Config::load(&workspace)?;
    let storage = config::open_storage(&workspace, overrides)?;
    let scheduler_config = SchedulerConfig::from(&config);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let handle = scheduler::spawn(
            Arc::new(Mutex::new(storage)),
            Arc::new(LogDispatcher),
            config.contacts.clone(),
            EventBus::new(),
            scheduler_config,
        );
        info!(
            escalation_secs = config.escalation_interval_secs,
            promotion_secs = config.promotion_interval_secs,
            "sweep scheduler running, Ctrl-C to stop"
        );
        eprintln!("Watching (Ctrl-C to stop)");
        tokio::signal::ctrl_c().await?;
        handle.shutdown().await;
        Ok(())
    })
}
