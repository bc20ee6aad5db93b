//! Event and subscription types.

use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 1000
    pub buffer_size: usize,

    /// Topics to receive (None = all topics).
    pub topics: Option<Vec<String>>,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1000,
            topics: None,
        }
    }
}

impl SubscriptionConfig {
    /// Subscribe to a single topic.
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topics: Some(vec![topic.into()]),
            ..Default::default()
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub(crate) fn matches(&self, topic: &str) -> bool {
        match &self.topics {
            Some(topics) => topics.iter().any(|t| t == topic),
            None => true,
        }
    }
}

/// Events delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A notification emitted by the engine.
    Notification { topic: String, payload: Vec<u8> },

    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

impl LedgerEvent {
    /// Payload as text, for notifications.
    pub fn payload_text(&self) -> Option<String> {
        match self {
            LedgerEvent::Notification { payload, .. } => {
                Some(String::from_utf8_lossy(payload).into_owned())
            }
            LedgerEvent::Dropped { .. } => None,
        }
    }
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to receive events for one subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    pub receiver: crossbeam_channel::Receiver<LedgerEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<LedgerEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<LedgerEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<LedgerEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<LedgerEvent> {
        self.receiver.try_iter().collect()
    }
}
