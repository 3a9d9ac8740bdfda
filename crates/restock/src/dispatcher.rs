//! Replenishment fan-out.
//!
//! Runs inline with the stock mutation that raised stock above zero: the
//! triggering caller's response waits for the fan-out, so the dispatcher
//! bounds the work instead of queueing it. Concurrency is capped by a
//! semaphore and each delivery attempt is time-bounded inside the channel
//! chain.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use shopfront_catalog::{CatalogStore, Product};
use shopfront_core::{Contact, ProductId, StoreError, StoreResult, UserId};
use shopfront_delivery::{ChannelChain, DeliveryMessage};

use crate::profile::ProfileStore;
use crate::subscription::SubscriptionStore;

/// Fan-out tuning knobs.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum in-flight delivery attempts.
    pub max_concurrent: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

impl DispatcherConfig {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }
}

/// Aggregate outcome of one replenishment event, for observability and
/// tests; the stock-mutating caller gets it whether it cares or not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchSummary {
    pub product_id: Option<ProductId>,
    pub users_attempted: usize,
    pub anonymous_attempted: usize,
    /// Contacts whose delivery attempt reported success.
    pub contacts_reached: Vec<String>,
}

enum Recipient {
    User { id: UserId, contact: Contact },
    Anonymous { contact: Contact },
}

/// Dispatches back-in-stock notices to every subscriber of a product.
pub struct ReplenishmentDispatcher {
    catalog: Arc<dyn CatalogStore>,
    profiles: Arc<dyn ProfileStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    chain: Arc<ChannelChain>,
    config: DispatcherConfig,
}

impl ReplenishmentDispatcher {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        chain: Arc<ChannelChain>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            catalog,
            profiles,
            subscriptions,
            chain,
            config,
        }
    }

    /// Fan out for a product whose stock just rose from depleted to
    /// available.
    ///
    /// The caller evaluates the trigger (`previous <= 0 && current > 0`)
    /// from the values around its own mutation; this method only does the
    /// fan-out. Every subscriber that exists at this moment gets exactly one
    /// delivery attempt and is consumed afterwards, reached or not.
    pub async fn on_stock_replenished(&self, product_id: ProductId) -> StoreResult<DispatchSummary> {
        let product = self
            .catalog
            .find(product_id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("product {product_id}")))?;

        // Snapshot both registries at trigger time.
        let watchers = self.profiles.watchers_of(product_id).await?;
        let pending = self.subscriptions.pending_for(product_id).await?;

        let mut recipients: Vec<Recipient> = Vec::with_capacity(watchers.len() + pending.len());
        recipients.extend(watchers.into_iter().map(|p| Recipient::User {
            id: p.id,
            contact: p.contact,
        }));
        recipients.extend(
            pending
                .into_iter()
                .map(|s| Recipient::Anonymous { contact: s.contact }),
        );

        let mut summary = DispatchSummary {
            product_id: Some(product_id),
            ..DispatchSummary::default()
        };
        if recipients.is_empty() {
            return Ok(summary);
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks = JoinSet::new();

        for recipient in recipients {
            let semaphore = semaphore.clone();
            let chain = self.chain.clone();
            let profiles = self.profiles.clone();
            let subscriptions = self.subscriptions.clone();
            let product = product.clone();

            tasks.spawn(async move {
                // Closed only if the dispatcher is dropped mid-flight.
                let Ok(_permit) = semaphore.acquire().await else {
                    return None;
                };

                let (contact, is_user) = match &recipient {
                    Recipient::User { contact, .. } => (contact.clone(), true),
                    Recipient::Anonymous { contact } => (contact.clone(), false),
                };

                let result = chain.send(&back_in_stock_message(&product, &contact)).await;
                if !result.success {
                    warn!(
                        contact = %contact,
                        product_id = %product.id,
                        detail = result.error_detail.as_deref().unwrap_or("unknown"),
                        "subscriber consumed without successful delivery"
                    );
                }

                // Consume after exactly one attempt, reached or not.
                let consumed = match &recipient {
                    Recipient::User { id, .. } => {
                        profiles.remove_watch(*id, product.id).await
                    }
                    Recipient::Anonymous { contact } => {
                        subscriptions.mark_notified(contact, product.id).await
                    }
                };
                if let Err(e) = consumed {
                    warn!(contact = %contact, product_id = %product.id, error = %e, "failed to consume subscription");
                }

                Some((contact, is_user, result.success))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((contact, is_user, reached))) => {
                    if is_user {
                        summary.users_attempted += 1;
                    } else {
                        summary.anonymous_attempted += 1;
                    }
                    if reached {
                        summary.contacts_reached.push(contact.to_string());
                    }
                }
                Ok(None) => {}
                // A panicking subscriber task never aborts the rest.
                Err(e) => warn!(product_id = %product_id, error = %e, "notification task failed"),
            }
        }

        info!(
            product_id = %product_id,
            users = summary.users_attempted,
            anonymous = summary.anonymous_attempted,
            reached = summary.contacts_reached.len(),
            "replenishment fan-out complete"
        );
        Ok(summary)
    }
}

fn back_in_stock_message(product: &Product, contact: &Contact) -> DeliveryMessage {
    DeliveryMessage::new(
        contact.clone(),
        format!("{} is back in stock", product.name),
        format!(
            "Good news: {} is available again ({} in stock). Subscriptions are \
             one-shot, so order soon or subscribe again.",
            product.name, product.count_in_stock
        ),
    )
}
