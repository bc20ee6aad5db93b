//! In-process delivery of engine notifications.
//!
//! Every dispatched operation emits one notification on the configured topic.
//! Subscribers receive them through bounded channels:
//!
//! ```ignore
//! let handle = engine.events().subscribe(SubscriptionConfig::topic("evtsender"));
//! engine.dispatch("init_contract_terms", &args)?;
//! let event = handle.recv()?;
//! assert_eq!(event.payload_text().as_deref(), Some("Event Counter is 1"));
//! ```

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{DropReason, LedgerEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId};
