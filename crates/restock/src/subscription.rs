//! Anonymous restock subscriptions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_core::{Contact, ProductId, StoreError, StoreResult};

/// "Notify `contact` when `product_id` is back in stock."
///
/// One record per `(contact, product_id)` pair; re-subscribing revives a
/// consumed record by resetting `notified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockSubscription {
    pub contact: Contact,
    pub product_id: ProductId,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store for anonymous subscription records.
///
/// Uniqueness of `(contact, product_id)` is the store's job: concurrent
/// duplicate subscribes must collapse to one record without any
/// application-level locking above this trait.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert or revive the record for the pair, resetting `notified`.
    async fn upsert(&self, contact: Contact, product_id: ProductId) -> StoreResult<()>;

    /// All un-notified records for a product.
    async fn pending_for(&self, product_id: ProductId) -> StoreResult<Vec<RestockSubscription>>;

    /// Consume one record (sets `notified = true`).
    async fn mark_notified(&self, contact: &Contact, product_id: ProductId) -> StoreResult<()>;

    async fn find(
        &self,
        contact: &Contact,
        product_id: ProductId,
    ) -> StoreResult<Option<RestockSubscription>>;
}

#[async_trait]
impl<S> SubscriptionStore for Arc<S>
where
    S: SubscriptionStore + ?Sized,
{
    async fn upsert(&self, contact: Contact, product_id: ProductId) -> StoreResult<()> {
        (**self).upsert(contact, product_id).await
    }

    async fn pending_for(&self, product_id: ProductId) -> StoreResult<Vec<RestockSubscription>> {
        (**self).pending_for(product_id).await
    }

    async fn mark_notified(&self, contact: &Contact, product_id: ProductId) -> StoreResult<()> {
        (**self).mark_notified(contact, product_id).await
    }

    async fn find(
        &self,
        contact: &Contact,
        product_id: ProductId,
    ) -> StoreResult<Option<RestockSubscription>> {
        (**self).find(contact, product_id).await
    }
}

/// In-memory subscription store; the map key is the uniqueness constraint.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    inner: RwLock<HashMap<(Contact, ProductId), RestockSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(
        &self,
    ) -> StoreResult<
        std::sync::RwLockWriteGuard<'_, HashMap<(Contact, ProductId), RestockSubscription>>,
    > {
        self.inner
            .write()
            .map_err(|_| StoreError::server("subscription store lock poisoned"))
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert(&self, contact: Contact, product_id: ProductId) -> StoreResult<()> {
        let mut map = self.write()?;
        let now = Utc::now();
        map.entry((contact.clone(), product_id))
            .and_modify(|existing| {
                existing.notified = false;
                existing.updated_at = now;
            })
            .or_insert(RestockSubscription {
                contact,
                product_id,
                notified: false,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn pending_for(&self, product_id: ProductId) -> StoreResult<Vec<RestockSubscription>> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::server("subscription store lock poisoned"))?;
        let mut pending: Vec<RestockSubscription> = map
            .values()
            .filter(|s| s.product_id == product_id && !s.notified)
            .cloned()
            .collect();
        pending.sort_by_key(|s| s.created_at);
        Ok(pending)
    }

    async fn mark_notified(&self, contact: &Contact, product_id: ProductId) -> StoreResult<()> {
        let mut map = self.write()?;
        let record = map
            .get_mut(&(contact.clone(), product_id))
            .ok_or_else(|| StoreError::not_found("subscription"))?;
        record.notified = true;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn find(
        &self,
        contact: &Contact,
        product_id: ProductId,
    ) -> StoreResult<Option<RestockSubscription>> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::server("subscription store lock poisoned"))?;
        Ok(map.get(&(contact.clone(), product_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(s: &str) -> Contact {
        Contact::parse(s).unwrap()
    }

    #[tokio::test]
    async fn double_subscribe_yields_exactly_one_record() {
        let store = InMemorySubscriptionStore::new();
        let product = ProductId::new();
        store.upsert(contact("e1@shop.test"), product).await.unwrap();
        store.upsert(contact("e1@shop.test"), product).await.unwrap();

        assert_eq!(store.pending_for(product).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_revives_a_consumed_record() {
        let store = InMemorySubscriptionStore::new();
        let product = ProductId::new();
        let c = contact("e1@shop.test");

        store.upsert(c.clone(), product).await.unwrap();
        store.mark_notified(&c, product).await.unwrap();
        assert!(store.pending_for(product).await.unwrap().is_empty());

        store.upsert(c.clone(), product).await.unwrap();
        let record = store.find(&c, product).await.unwrap().unwrap();
        assert!(!record.notified);
        assert_eq!(store.pending_for(product).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_subscribes_collapse_to_one_record() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let product = ProductId::new();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert(contact("e1@shop.test"), product).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(store.pending_for(product).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pending_excludes_other_products_and_notified_records() {
        let store = InMemorySubscriptionStore::new();
        let product_a = ProductId::new();
        let product_b = ProductId::new();

        store.upsert(contact("e1@shop.test"), product_a).await.unwrap();
        store.upsert(contact("e2@shop.test"), product_a).await.unwrap();
        store.upsert(contact("e1@shop.test"), product_b).await.unwrap();
        store
            .mark_notified(&contact("e2@shop.test"), product_a)
            .await
            .unwrap();

        let pending = store.pending_for(product_a).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].contact, contact("e1@shop.test"));
    }
}
