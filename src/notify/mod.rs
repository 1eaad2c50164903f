//! Notification dispatch seam.
//!
//! Transport mechanics (SMTP, SMS gateways) live outside this crate.
//! The engine talks to a [`NotificationDispatcher`], whose calls are
//! non-throwing: failures come back as a [`DispatchOutcome`] with
//! `success: false` and are recorded in the audit log, never raised.

use crate::model::{Issue, SlaTier};
use std::sync::Mutex;

/// Result of a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    pub detail: Option<String>,
}

impl DispatchOutcome {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            detail: None,
        }
    }

    #[must_use]
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Some(detail.into()),
        }
    }
}

/// Outbound notification transport, provided by the surrounding system.
///
/// Implementations must not panic or block indefinitely; slow transports
/// should enforce their own per-call timeout.
pub trait NotificationDispatcher: Send + Sync {
    /// Send an escalation email about `issue` at `tier` to `recipient`.
    fn send_email(&self, issue: &Issue, tier: SlaTier, recipient: &str) -> DispatchOutcome;

    /// Send a text message.
    fn send_sms(&self, phone: &str, text: &str) -> DispatchOutcome;
}

/// Dispatcher that logs deliveries via `tracing` and reports success.
///
/// The default for CLI sweeps when no real transport is wired up.
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl NotificationDispatcher for LogDispatcher {
    fn send_email(&self, issue: &Issue, tier: SlaTier, recipient: &str) -> DispatchOutcome {
        tracing::info!(
            issue_id = %issue.id,
            tier = %tier,
            recipient,
            "escalation email"
        );
        DispatchOutcome::ok()
    }

    fn send_sms(&self, phone: &str, text: &str) -> DispatchOutcome {
        tracing::info!(phone, text, "escalation sms");
        DispatchOutcome::ok()
    }
}

/// A recorded dispatch call, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    Email {
        issue_id: String,
        tier: SlaTier,
        recipient: String,
    },
    Sms {
        phone: String,
        text: String,
    },
}

/// In-memory dispatcher recording every call; can simulate failures.
#[derive(Debug, Default)]
pub struct MemoryDispatcher {
    sent: Mutex<Vec<SentNotification>>,
    fail_all: Mutex<bool>,
}

impl MemoryDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent dispatch report failure.
    pub fn fail_all(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }

    /// Snapshot of every call made so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }

    fn outcome(&self) -> DispatchOutcome {
        if *self.fail_all.lock().unwrap() {
            DispatchOutcome::failed("simulated transport failure")
        } else {
            DispatchOutcome::ok()
        }
    }
}

impl NotificationDispatcher for MemoryDispatcher {
    fn send_email(&self, issue: &Issue, tier: SlaTier, recipient: &str) -> DispatchOutcome {
        self.sent.lock().unwrap().push(SentNotification::Email {
            issue_id: issue.id.clone(),
            tier,
            recipient: recipient.to_string(),
        });
        self.outcome()
    }

    fn send_sms(&self, phone: &str, text: &str) -> DispatchOutcome {
        self.sent.lock().unwrap().push(SentNotification::Sms {
            phone: phone.to_string(),
            text: text.to_string(),
        });
        self.outcome()
    }
}
