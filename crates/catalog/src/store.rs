//! Catalog storage and the inventory ledger.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use shopfront_core::{ProductId, StoreError, StoreResult};

use crate::product::Product;

/// Receipt for a committed conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedDecrement {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Stock remaining after the decrement was applied.
    pub remaining: i64,
}

/// Stock values immediately before and after a mutation.
///
/// The replenishment trigger is evaluated from exactly these two numbers,
/// never re-derived from another signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockTransition {
    pub product_id: ProductId,
    pub previous: i64,
    pub current: i64,
}

impl StockTransition {
    /// Did this mutation raise stock from depleted to available?
    pub fn is_replenishment(&self) -> bool {
        self.previous <= 0 && self.current > 0
    }
}

/// Catalog store + inventory ledger contract.
///
/// `decrement_stock` must be a single conditional write: subtract only if
/// the current count still covers the quantity at write time. A decrement
/// that fails the condition returns `InsufficientStock` even when an earlier
/// `check_available` passed; that post-hoc failure is what closes the
/// check-then-act window between concurrent checkouts.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert(&self, product: Product) -> StoreResult<()>;

    async fn find(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Product>>;

    async fn list(&self) -> StoreResult<Vec<Product>>;

    /// Read-time availability check. `NotFound` if the product is absent.
    async fn check_available(&self, id: ProductId, quantity: i64) -> StoreResult<bool>;

    /// Conditionally subtract `quantity`, failing with
    /// `InsufficientStock { available }` if the condition no longer holds.
    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> StoreResult<CommittedDecrement>;

    /// Set the absolute stock count, returning the before/after pair so the
    /// caller can evaluate the replenishment trigger.
    async fn set_stock(&self, id: ProductId, new_count: i64) -> StoreResult<StockTransition>;
}

#[async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn insert(&self, product: Product) -> StoreResult<()> {
        (**self).insert(product).await
    }

    async fn find(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).find(id).await
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        (**self).find_by_name(name).await
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        (**self).list().await
    }

    async fn check_available(&self, id: ProductId, quantity: i64) -> StoreResult<bool> {
        (**self).check_available(id, quantity).await
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> StoreResult<CommittedDecrement> {
        (**self).decrement_stock(id, quantity).await
    }

    async fn set_stock(&self, id: ProductId, new_count: i64) -> StoreResult<StockTransition> {
        (**self).set_stock(id, new_count).await
    }
}

/// In-memory catalog store.
///
/// Conditional mutations hold the write lock for the whole check+write, so
/// the decrement condition cannot be interleaved with another writer.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<ProductId, Product>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::server("catalog store lock poisoned"))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<ProductId, Product>>> {
        self.inner
            .write()
            .map_err(|_| StoreError::server("catalog store lock poisoned"))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert(&self, product: Product) -> StoreResult<()> {
        let mut map = self.write()?;
        if map.contains_key(&product.id) {
            return Err(StoreError::duplicate(format!("product {}", product.id)));
        }
        map.insert(product.id, product);
        Ok(())
    }

    async fn find(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Product>> {
        let map = self.read()?;
        Ok(map.values().find(|p| p.name == name).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let mut items: Vec<Product> = self.read()?.values().cloned().collect();
        items.sort_by_key(|p| p.created_at);
        Ok(items)
    }

    async fn check_available(&self, id: ProductId, quantity: i64) -> StoreResult<bool> {
        let map = self.read()?;
        let product = map
            .get(&id)
            .ok_or_else(|| StoreError::not_found(format!("product {id}")))?;
        Ok(product.count_in_stock >= quantity)
    }

    async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i64,
    ) -> StoreResult<CommittedDecrement> {
        if quantity <= 0 {
            return Err(StoreError::validation("quantity must be positive"));
        }
        let mut map = self.write()?;
        let product = map
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("product {id}")))?;
        if product.count_in_stock < quantity {
            return Err(StoreError::insufficient_stock(product.count_in_stock));
        }
        product.count_in_stock -= quantity;
        product.updated_at = Utc::now();
        Ok(CommittedDecrement {
            product_id: id,
            quantity,
            remaining: product.count_in_stock,
        })
    }

    async fn set_stock(&self, id: ProductId, new_count: i64) -> StoreResult<StockTransition> {
        if new_count < 0 {
            return Err(StoreError::validation("stock count cannot be negative"));
        }
        let mut map = self.write()?;
        let product = map
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(format!("product {id}")))?;
        let previous = product.count_in_stock;
        product.count_in_stock = new_count;
        product.updated_at = Utc::now();
        Ok(StockTransition {
            product_id: id,
            previous,
            current: new_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::NewProduct;

    use proptest::prelude::*;

    fn seeded(stock: i64) -> (InMemoryCatalogStore, ProductId) {
        let store = InMemoryCatalogStore::new();
        let id = ProductId::new();
        let product = NewProduct {
            name: "Walnut desk".to_string(),
            description: None,
            image_url: None,
            price_cents: 45_000,
            count_in_stock: stock,
        }
        .into_product(id, Utc::now())
        .unwrap();
        futures_block(store.insert(product)).unwrap();
        (store, id)
    }

    // Store futures never actually suspend, so a noop-waker poll is enough
    // for the sync tests here; async behavior is covered in tokio tests.
    fn futures_block<F: std::future::Future>(fut: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
        fn raw() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                raw()
            }
            RawWaker::new(
                std::ptr::null(),
                &RawWakerVTable::new(clone, no_op, no_op, no_op),
            )
        }
        let waker = unsafe { Waker::from_raw(raw()) };
        let mut cx = Context::from_waker(&waker);
        let mut fut = std::pin::pin!(fut);
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => unreachable!("in-memory store futures are immediate"),
        }
    }

    #[test]
    fn decrement_fails_at_write_time_even_after_check_passed() {
        let (store, id) = seeded(1);
        assert!(futures_block(store.check_available(id, 1)).unwrap());

        // Another checkout wins the race between check and decrement.
        futures_block(store.decrement_stock(id, 1)).unwrap();

        let err = futures_block(store.decrement_stock(id, 1)).unwrap_err();
        assert_eq!(err, StoreError::InsufficientStock { available: 0 });
    }

    #[test]
    fn decrement_reports_remaining_stock() {
        let (store, id) = seeded(5);
        let committed = futures_block(store.decrement_stock(id, 2)).unwrap();
        assert_eq!(committed.remaining, 3);
        let product = futures_block(store.find(id)).unwrap().unwrap();
        assert_eq!(product.count_in_stock, 3);
    }

    #[test]
    fn set_stock_reports_transition_pair() {
        let (store, id) = seeded(0);
        let transition = futures_block(store.set_stock(id, 5)).unwrap();
        assert_eq!(transition.previous, 0);
        assert_eq!(transition.current, 5);
        assert!(transition.is_replenishment());

        let transition = futures_block(store.set_stock(id, 9)).unwrap();
        assert!(!transition.is_replenishment());
    }

    #[test]
    fn check_available_unknown_product_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let err = futures_block(store.check_available(ProductId::new(), 1)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let (store, id) = seeded(1);
        let again = futures_block(store.find(id)).unwrap().unwrap();
        let err = futures_block(store.insert(again)).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_orders_for_last_unit_yield_one_winner() {
        let (store, id) = seeded(1);
        let store = Arc::new(store);
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                // Both tasks pass the read-time check before either writes.
                let available = store.check_available(id, 1).await.unwrap();
                barrier.wait().await;
                (available, store.decrement_stock(id, 1).await)
            }));
        }

        let mut successes = 0;
        let mut insufficient = 0;
        for handle in handles {
            let (available, outcome) = handle.await.unwrap();
            assert!(available, "read-time check should pass for both");
            match outcome {
                Ok(_) => successes += 1,
                Err(StoreError::InsufficientStock { available: 0 }) => insufficient += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(insufficient, 1);
        let product = store.find(id).await.unwrap().unwrap();
        assert_eq!(product.count_in_stock, 0);
    }

    proptest! {
        #[test]
        fn stock_is_initial_minus_committed_and_never_negative(
            initial in 0i64..500,
            quantities in proptest::collection::vec(1i64..20, 0..32),
        ) {
            let (store, id) = seeded(initial);
            let mut committed = 0i64;
            for qty in quantities {
                match futures_block(store.decrement_stock(id, qty)) {
                    Ok(receipt) => {
                        committed += receipt.quantity;
                        prop_assert!(receipt.remaining >= 0);
                    }
                    Err(StoreError::InsufficientStock { available }) => {
                        prop_assert!(available < qty);
                    }
                    Err(other) => return Err(TestCaseError::fail(format!("{other:?}"))),
                }
            }
            let product = futures_block(store.find(id)).unwrap().unwrap();
            prop_assert_eq!(product.count_in_stock, initial - committed);
            prop_assert!(product.count_in_stock >= 0);
        }
    }
}
