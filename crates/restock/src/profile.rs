//! Identified-user restock watch lists.
//!
//! For an identified user the subscription is a product reference embedded
//! in their profile: presence means "pending", removal means "consumed".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shopfront_core::{Contact, ProductId, StoreError, StoreResult, UserId};

/// The slice of a user profile this subsystem reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub contact: Contact,
    /// Products the user wants a back-in-stock notice for.
    pub restock_watches: Vec<ProductId>,
}

/// Profile storage boundary (the identity collaborator owns the rest of the
/// profile; this trait covers what the restock core needs).
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert(&self, profile: UserProfile) -> StoreResult<()>;

    async fn find(&self, id: UserId) -> StoreResult<Option<UserProfile>>;

    /// Append the product to the watch list; a no-op (not an error) when the
    /// user already watches it.
    async fn add_watch(&self, user_id: UserId, product_id: ProductId) -> StoreResult<()>;

    /// Remove the product from the watch list (consumption).
    async fn remove_watch(&self, user_id: UserId, product_id: ProductId) -> StoreResult<()>;

    /// All profiles currently watching the product.
    async fn watchers_of(&self, product_id: ProductId) -> StoreResult<Vec<UserProfile>>;
}

#[async_trait]
impl<S> ProfileStore for Arc<S>
where
    S: ProfileStore + ?Sized,
{
    async fn upsert(&self, profile: UserProfile) -> StoreResult<()> {
        (**self).upsert(profile).await
    }

    async fn find(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        (**self).find(id).await
    }

    async fn add_watch(&self, user_id: UserId, product_id: ProductId) -> StoreResult<()> {
        (**self).add_watch(user_id, product_id).await
    }

    async fn remove_watch(&self, user_id: UserId, product_id: ProductId) -> StoreResult<()> {
        (**self).remove_watch(user_id, product_id).await
    }

    async fn watchers_of(&self, product_id: ProductId) -> StoreResult<Vec<UserProfile>> {
        (**self).watchers_of(product_id).await
    }
}

/// In-memory profile store.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    inner: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(
        &self,
    ) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<UserId, UserProfile>>> {
        self.inner
            .write()
            .map_err(|_| StoreError::server("profile store lock poisoned"))
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert(&self, profile: UserProfile) -> StoreResult<()> {
        self.write()?.insert(profile.id, profile);
        Ok(())
    }

    async fn find(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::server("profile store lock poisoned"))?;
        Ok(map.get(&id).cloned())
    }

    async fn add_watch(&self, user_id: UserId, product_id: ProductId) -> StoreResult<()> {
        let mut map = self.write()?;
        let profile = map
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found(format!("user {user_id}")))?;
        if !profile.restock_watches.contains(&product_id) {
            profile.restock_watches.push(product_id);
        }
        Ok(())
    }

    async fn remove_watch(&self, user_id: UserId, product_id: ProductId) -> StoreResult<()> {
        let mut map = self.write()?;
        let profile = map
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found(format!("user {user_id}")))?;
        profile.restock_watches.retain(|p| *p != product_id);
        Ok(())
    }

    async fn watchers_of(&self, product_id: ProductId) -> StoreResult<Vec<UserProfile>> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::server("profile store lock poisoned"))?;
        Ok(map
            .values()
            .filter(|p| p.restock_watches.contains(&product_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, addr: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(),
            name: name.to_string(),
            contact: Contact::parse(addr).unwrap(),
            restock_watches: Vec::new(),
        }
    }

    #[tokio::test]
    async fn add_watch_is_idempotent() {
        let store = InMemoryProfileStore::new();
        let p = profile("Ada", "ada@shop.test");
        let user_id = p.id;
        store.upsert(p).await.unwrap();

        let product = ProductId::new();
        store.add_watch(user_id, product).await.unwrap();
        store.add_watch(user_id, product).await.unwrap();

        let profile = store.find(user_id).await.unwrap().unwrap();
        assert_eq!(profile.restock_watches, vec![product]);
    }

    #[tokio::test]
    async fn remove_watch_consumes_the_reference() {
        let store = InMemoryProfileStore::new();
        let p = profile("Ada", "ada@shop.test");
        let user_id = p.id;
        store.upsert(p).await.unwrap();

        let product = ProductId::new();
        store.add_watch(user_id, product).await.unwrap();
        store.remove_watch(user_id, product).await.unwrap();

        assert!(store.watchers_of(product).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn watchers_of_filters_by_product() {
        let store = InMemoryProfileStore::new();
        let ada = profile("Ada", "ada@shop.test");
        let ada_id = ada.id;
        let ben = profile("Ben", "ben@shop.test");
        let ben_id = ben.id;
        store.upsert(ada).await.unwrap();
        store.upsert(ben).await.unwrap();

        let lamp = ProductId::new();
        let desk = ProductId::new();
        store.add_watch(ada_id, lamp).await.unwrap();
        store.add_watch(ben_id, desk).await.unwrap();

        let watchers = store.watchers_of(lamp).await.unwrap();
        assert_eq!(watchers.len(), 1);
        assert_eq!(watchers[0].id, ada_id);
    }

    #[tokio::test]
    async fn add_watch_for_unknown_user_is_not_found() {
        let store = InMemoryProfileStore::new();
        let err = store
            .add_watch(UserId::new(), ProductId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
