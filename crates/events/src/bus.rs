//! In-process outcome bus backed by `tokio::sync::broadcast` channels.
//!
//! [`OutcomeBus`] is the publish side of the two outbound contracts. It is
//! designed to be shared via `Arc<OutcomeBus>` across the application; the
//! engine publishes, external consumers (live dashboards, bus bridges)
//! subscribe independently.

use tokio::sync::broadcast;

use crate::outcome::{AlertTrigger, RuleEvaluated};

/// Default buffer capacity for each broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out for rule-evaluated and alert-trigger outcomes.
///
/// When a buffer is full, the oldest un-consumed messages are dropped and
/// slow receivers observe a `RecvError::Lagged`. Durable effects never
/// depend on the bus: the aggregator and alert manager are invoked
/// synchronously by the engine before publication.
pub struct OutcomeBus {
    rule_evaluated: broadcast::Sender<RuleEvaluated>,
    alert_trigger: broadcast::Sender<AlertTrigger>,
}

impl OutcomeBus {
    /// Create a bus with a specific per-channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (rule_evaluated, _) = broadcast::channel(capacity);
        let (alert_trigger, _) = broadcast::channel(capacity);
        Self {
            rule_evaluated,
            alert_trigger,
        }
    }

    /// Publish a rule-evaluated outcome to all current subscribers.
    ///
    /// If there are no active subscribers the message is silently dropped.
    pub fn publish_rule_evaluated(&self, outcome: RuleEvaluated) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.rule_evaluated.send(outcome);
    }

    /// Publish an alert trigger to all current subscribers.
    pub fn publish_alert_trigger(&self, trigger: AlertTrigger) {
        let _ = self.alert_trigger.send(trigger);
    }

    /// Subscribe to rule-evaluated outcomes.
    pub fn subscribe_rule_evaluated(&self) -> broadcast::Receiver<RuleEvaluated> {
        self.rule_evaluated.subscribe()
    }

    /// Subscribe to alert triggers.
    pub fn subscribe_alert_trigger(&self) -> broadcast::Receiver<AlertTrigger> {
        self.alert_trigger.subscribe()
    }
}

impl Default for OutcomeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
