//! An [`ItemRepository`] kept entirely in memory.

use super::item_repository::{Item, ItemId, ItemRepository, NewItem, StoreError, StoreResult};
use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::instrument;

#[derive(Debug, Default)]
struct Items {
    items: BTreeMap<ItemId, Item>,
    last_id: ItemId,
}

/// Items in an ordered map behind an async lock.
///
/// Cloning is cheap and clones share the same items.
#[derive(Clone, Debug, Default)]
pub struct InMemoryItemRepository {
    inner: Arc<RwLock<Items>>,
}

impl InMemoryItemRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.inner.read().await.items.len())
    }

    #[instrument(skip(self))]
    async fn list_ordered(&self, skip: usize, take: usize) -> StoreResult<Vec<Item>> {
        let guard = self.inner.read().await;
        let items: Vec<Item> = guard.items.values().skip(skip).take(take).cloned().collect();
        tracing::debug!("Listed {} items", items.len());
        Ok(items)
    }

    async fn get_by_id(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.inner.read().await.items.get(&id).cloned())
    }

    #[instrument(skip_all)]
    async fn insert(&self, new_item: NewItem) -> StoreResult<Item> {
        let mut guard = self.inner.write().await;
        guard.last_id += 1;
        let item = Item {
            id: guard.last_id,
            name: new_item.name,
            is_complete: new_item.is_complete,
            secret: new_item.secret,
            version: 0,
        };
        guard.items.insert(item.id, item.clone());
        tracing::debug!("Inserted item {}", item.id);
        Ok(item)
    }

    #[instrument(skip(self, item), fields(id = item.id, version = item.version))]
    async fn update(&self, item: Item) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let Some(stored) = guard.items.get_mut(&item.id) else {
            tracing::warn!("Item disappeared before update");
            return Err(StoreError::ConcurrencyConflict { id: item.id });
        };
        if stored.version != item.version {
            tracing::warn!("Stale version, stored is {}", stored.version);
            return Err(StoreError::ConcurrencyConflict { id: item.id });
        }
        stored.name = item.name;
        stored.is_complete = item.is_complete;
        stored.version += 1;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ItemId) -> StoreResult<()> {
        match self.inner.write().await.items.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { id }),
        }
    }

    async fn exists(&self, id: ItemId) -> StoreResult<bool> {
        Ok(self.inner.read().await.items.contains_key(&id))
    }
}
