//! Background scheduler for the escalation and auto-promotion sweeps.
//!
//! Two independent tokio tasks, each driven by a `tokio::time::interval`
//! and stopped through a shared `watch` channel. Sweep bodies are
//! synchronous SQLite work, so each tick runs under `spawn_blocking`
//! with the storage mutex held only for the duration of that tick. A
//! failed tick is logged and the loop keeps going.

use crate::config::{Config, EscalationContacts};
use crate::events::EventBus;
use crate::notify::NotificationDispatcher;
use crate::storage::SqliteStorage;
use crate::sweep::{escalation, promotion};
use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Sweep periods.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub escalation_interval: Duration,
    pub promotion_interval: Duration,
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            escalation_interval: Duration::from_secs(config.escalation_interval_secs),
            promotion_interval: Duration::from_secs(config.promotion_interval_secs),
        }
    }
}

/// Handle to the running sweep tasks.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signal both loops to stop and wait for them to finish their
    /// current tick.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "sweep task aborted");
            }
        }
    }
}

/// Spawn both sweep loops on the current tokio runtime.
#[must_use]
pub fn spawn(
    storage: Arc<Mutex<SqliteStorage>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    contacts: EscalationContacts,
    bus: EventBus,
    config: SchedulerConfig,
) -> SchedulerHandle {
    let (stop_tx, stop_rx) = watch::channel(false);

    let escalation_task = tokio::spawn(escalation_loop(
        Arc::clone(&storage),
        dispatcher,
        contacts,
        bus.clone(),
        config.escalation_interval,
        stop_rx.clone(),
    ));
    let promotion_task = tokio::spawn(promotion_loop(
        storage,
        bus,
        config.promotion_interval,
        stop_rx,
    ));

    SchedulerHandle {
        stop: stop_tx,
        tasks: vec![escalation_task, promotion_task],
    }
}

async fn escalation_loop(
    storage: Arc<Mutex<SqliteStorage>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    contacts: EscalationContacts,
    bus: EventBus,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let storage = Arc::clone(&storage);
                let dispatcher = Arc::clone(&dispatcher);
                let contacts = contacts.clone();
                let bus = bus.clone();
                let tick = tokio::task::spawn_blocking(move || {
                    let mut guard = storage.lock().unwrap_or_else(PoisonError::into_inner);
                    escalation::run(&mut guard, dispatcher.as_ref(), &contacts, Some(&bus), Utc::now())
                })
                .await;
                match tick {
                    Ok(Ok(report)) => {
                        debug!(scanned = report.scanned, escalated = report.escalated, "escalation tick");
                    }
                    Ok(Err(e)) => warn!(error = %e, "escalation tick failed"),
                    Err(e) => warn!(error = %e, "escalation tick panicked"),
                }
            }
            _ = stop.changed() => break,
        }
    }
}

async fn promotion_loop(
    storage: Arc<Mutex<SqliteStorage>>,
    bus: EventBus,
    period: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let storage = Arc::clone(&storage);
                let bus = bus.clone();
                let tick = tokio::task::spawn_blocking(move || {
                    let mut guard = storage.lock().unwrap_or_else(PoisonError::into_inner);
                    promotion::run(&mut guard, Some(&bus), Utc::now())
                })
                .await;
                match tick {
                    Ok(Ok(report)) => {
                        debug!(
                            scanned = report.scanned,
                            auto_verified = report.auto_verified,
                            auto_assigned = report.auto_assigned,
                            tier_forced = report.tier_forced,
                            "promotion tick"
                        );
                    }
                    Ok(Err(e)) => warn!(error = %e, "promotion tick failed"),
                    Err(e) => warn!(error = %e, "promotion tick panicked"),
                }
            }
            _ = stop.changed() => break,
        }
    }
}
