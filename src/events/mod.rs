//! Publish/subscribe for live issue updates.
//!
//! Replaces an ambient global broadcast registry with an explicit bus
//! owned by the lifecycle/scheduler layer. Subscription lifetime is the
//! receiver's lifetime: dropping the receiver unsubscribes. Lagging
//! subscribers miss events rather than blocking publishers.

use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// What happened to an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueEventKind {
    /// A new root issue was created.
    Submitted,
    /// A duplicate was merged into an existing root.
    Merged { parent_id: String },
    /// A guarded state transition was applied.
    Transitioned {
        from: crate::model::IssueState,
        to: crate::model::IssueState,
    },
    /// The escalation sweep raised the stored tier.
    TierRaised { tier: crate::model::SlaTier },
    /// The auto-promotion sweep force-advanced the issue.
    AutoPromoted { to: crate::model::IssueState },
}

/// A broadcast event about one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEvent {
    pub issue_id: String,
    pub kind: IssueEventKind,
}

/// Broadcast bus for issue events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<IssueEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the event stream. Unsubscribe by dropping the receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IssueEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. With no live subscribers this is a no-op.
    pub fn publish(&self, event: IssueEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("issue event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IssueState;

    #[test]
    fn publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(IssueEvent {
            issue_id: "ct-x".to_string(),
            kind: IssueEventKind::Submitted,
        });
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(IssueEvent {
            issue_id: "ct-y".to_string(),
            kind: IssueEventKind::Transitioned {
                from: IssueState::Submitted,
                to: IssueState::Verified,
            },
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.issue_id, "ct-y");
    }

    #[tokio::test]
    async fn dropped_receiver_unsubscribes() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);
        bus.publish(IssueEvent {
            issue_id: "ct-z".to_string(),
            kind: IssueEventKind::Submitted,
        });
    }
}
