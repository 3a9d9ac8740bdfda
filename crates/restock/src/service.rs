//! Subscribe-to-restock rules.

use std::sync::Arc;

use tracing::debug;

use shopfront_catalog::CatalogStore;
use shopfront_core::{Contact, ProductId, StoreError, StoreResult, UserId};

use crate::profile::ProfileStore;
use crate::subscription::SubscriptionStore;

/// Who is asking to be notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscriber {
    User(UserId),
    Anonymous(Contact),
}

/// Registration side of the subscription registry.
pub struct RestockService {
    catalog: Arc<dyn CatalogStore>,
    profiles: Arc<dyn ProfileStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl RestockService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Self {
        Self {
            catalog,
            profiles,
            subscriptions,
        }
    }

    /// Register interest in a depleted product.
    ///
    /// Notify-me is only meaningful for depleted stock: a product with
    /// `count_in_stock > 0` is rejected with `AlreadyAvailable` and no
    /// record is created.
    pub async fn subscribe(
        &self,
        subscriber: Subscriber,
        product_id: ProductId,
    ) -> StoreResult<()> {
        let product = self
            .catalog
            .find(product_id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("product {product_id}")))?;

        if product.count_in_stock > 0 {
            return Err(StoreError::AlreadyAvailable);
        }

        match subscriber {
            Subscriber::User(user_id) => {
                // Idempotent: already-watching is a no-op, not an error.
                self.profiles.add_watch(user_id, product_id).await?;
                debug!(%user_id, %product_id, "user restock watch registered");
            }
            Subscriber::Anonymous(contact) => {
                self.subscriptions
                    .upsert(contact.clone(), product_id)
                    .await?;
                debug!(contact = %contact, %product_id, "anonymous restock subscription registered");
            }
        }
        Ok(())
    }
}
