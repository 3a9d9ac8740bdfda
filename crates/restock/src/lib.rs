//! Back-in-stock notifications: subscription registry, subscribe rules, and
//! the replenishment fan-out dispatcher.
//!
//! Consumption is deliberately at-most-once: a subscription is consumed
//! after exactly one delivery attempt on a replenishment event, whether or
//! not that attempt succeeded. A subscriber who could not be reached can
//! subscribe again later.

pub mod dispatcher;
pub mod profile;
pub mod service;
pub mod subscription;

pub use dispatcher::{DispatchSummary, DispatcherConfig, ReplenishmentDispatcher};
pub use profile::{InMemoryProfileStore, ProfileStore, UserProfile};
pub use service::{RestockService, Subscriber};
pub use subscription::{InMemorySubscriptionStore, RestockSubscription, SubscriptionStore};
