//! Event bus broadcasting engine notifications to subscribers.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::types::{DropReason, LedgerEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<LedgerEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if the subscriber must be dropped.
    fn try_send(&self, event: LedgerEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }
}

/// Fan-out of emitted notifications.
///
/// Emission never blocks: a subscriber whose buffer is full, or whose
/// receiver is gone, is removed.
pub struct EventBus {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    next_id: AtomicU64,
    emitted: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            emitted: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size);

        self.subscriptions
            .write()
            .insert(id, Subscription { config, sender });

        SubscriptionHandle { id, receiver }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(sub) = self.subscriptions.write().remove(&id) {
            let _ = sub.sender.try_send(LedgerEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Total notifications emitted since creation.
    pub fn emitted_count(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Emit `payload` on `topic`. Returns the number of subscribers reached.
    pub fn emit(&self, topic: &str, payload: &[u8]) -> usize {
        self.emitted.fetch_add(1, Ordering::SeqCst);

        let event = LedgerEvent::Notification {
            topic: topic.to_string(),
            payload: payload.to_vec(),
        };

        let mut delivered = 0;
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if !sub.config.matches(topic) {
                    continue;
                }
                if sub.try_send(event.clone()) {
                    delivered += 1;
                } else {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    warn!(subscription = id.0, "dropping slow event subscriber");
                    let _ = sub.sender.try_send(LedgerEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }

        debug!(topic, delivered, "emitted event");
        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
