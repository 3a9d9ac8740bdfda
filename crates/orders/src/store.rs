//! Order storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use shopfront_core::{OrderId, StoreError, StoreResult};

use crate::order::{Order, PaymentCapture};

/// Durable order storage. Guest orders never reach this store.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: Order) -> StoreResult<()>;

    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Record an external payment capture against the order.
    async fn mark_paid(&self, id: OrderId, capture: PaymentCapture) -> StoreResult<Order>;

    async fn mark_delivered(&self, id: OrderId) -> StoreResult<Order>;
}

#[async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn insert(&self, order: Order) -> StoreResult<()> {
        (**self).insert(order).await
    }

    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>> {
        (**self).find(id).await
    }

    async fn mark_paid(&self, id: OrderId, capture: PaymentCapture) -> StoreResult<Order> {
        (**self).mark_paid(id, capture).await
    }

    async fn mark_delivered(&self, id: OrderId) -> StoreResult<Order> {
        (**self).mark_delivered(id).await
    }
}

/// In-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<OrderId, Order>>> {
        self.inner
            .write()
            .map_err(|_| StoreError::server("order store lock poisoned"))
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> StoreResult<()> {
        let mut map = self.write()?;
        if map.contains_key(&order.id) {
            return Err(StoreError::duplicate(format!("order {}", order.id)));
        }
        map.insert(order.id, order);
        Ok(())
    }

    async fn find(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::server("order store lock poisoned"))?;
        Ok(map.get(&id).cloned())
    }

    async fn mark_paid(&self, id: OrderId, capture: PaymentCapture) -> StoreResult<Order> {
        let mut map = self.write()?;
        let order = map
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("order {id}")))?;
        order.is_paid = true;
        order.paid_at = Some(Utc::now());
        order.payment = Some(capture);
        Ok(order.clone())
    }

    async fn mark_delivered(&self, id: OrderId) -> StoreResult<Order> {
        let mut map = self.write()?;
        let order = map
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("order {id}")))?;
        order.is_delivered = true;
        order.delivered_at = Some(Utc::now());
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderLine, ShippingAddress};
    use shopfront_core::{Actor, ProductId, UserId};

    fn sample_order() -> Order {
        Order {
            id: OrderId::new(),
            owner: Actor::user(UserId::new()),
            lines: vec![OrderLine {
                product_id: ProductId::new(),
                name: "Lamp".into(),
                quantity: 1,
                unit_price_cents: 1500,
            }],
            shipping: ShippingAddress {
                address: "1 Pine St".into(),
                city: "Portland".into(),
                postal_code: "97201".into(),
                zip: None,
                country: "US".into(),
            },
            payment_method: "card".into(),
            is_paid: false,
            paid_at: None,
            payment: None,
            is_delivered: false,
            delivered_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn mark_paid_sets_flag_timestamp_and_capture() {
        let store = InMemoryOrderStore::new();
        let order = sample_order();
        let id = order.id;
        store.insert(order).await.unwrap();

        let updated = store
            .mark_paid(
                id,
                PaymentCapture {
                    capture_id: "cap_123".into(),
                    status: "COMPLETED".into(),
                    payer_contact: None,
                },
            )
            .await
            .unwrap();

        assert!(updated.is_paid);
        assert!(updated.paid_at.is_some());
        assert_eq!(updated.payment.unwrap().capture_id, "cap_123");
    }

    #[tokio::test]
    async fn mark_delivered_on_missing_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let err = store.mark_delivered(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
