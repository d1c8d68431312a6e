//! A service for interacting with to-do items.
//!
//! Translates between the stored [`Item`] and the [`ItemView`] clients see.

use super::item_repository::{Item, ItemId, ItemRepository, NewItem, StoreError};
use crate::infra::pagination::PageWindow;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// A to-do item as seen by clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    /// The item's id. Ignored when creating an item.
    #[serde(default)]
    pub id: ItemId,
    /// The item's name.
    #[schema(example = "Buy milk")]
    pub name: Option<String>,
    /// Whether the item is done.
    #[serde(default)]
    pub is_complete: bool,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            is_complete: item.is_complete,
        }
    }
}

/// One page of items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPage {
    /// The number of items in the store.
    pub item_count: usize,
    /// Whether more than a full page of items follows this one.
    pub has_more: bool,
    /// The items on this page.
    pub todo_items: Vec<ItemView>,
}

/// Why an item operation failed.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    /// The id in the path and the id in the body differ.
    #[error("id {path} in path does not match id {body} in body")]
    IdentifierMismatch {
        /// The id from the path.
        path: ItemId,
        /// The id from the body.
        body: ItemId,
    },
    /// No such item.
    #[error("item {0} not found")]
    NotFound(ItemId),
    /// The item changed while being updated. Retry with fresh data.
    #[error("item {0} was modified concurrently")]
    ConcurrencyConflict(ItemId),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD operations on to-do items over some [`ItemRepository`].
#[derive(Clone, Debug)]
pub struct ItemService {
    repository: Arc<dyn ItemRepository>,
}

impl ItemService {
    /// Creates a service backed by `repository`.
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }

    /// Lists page `page` of `page_size` items.
    ///
    /// `page_size` must be positive.
    #[instrument(skip(self))]
    pub async fn list_items(&self, page: u32, page_size: u32) -> Result<ItemPage, ItemError> {
        let item_count = self.repository.count().await?;
        let window = PageWindow::new(item_count, page, page_size);
        let todo_items = if window.take > 0 {
            self.repository
                .list_ordered(window.skip, window.take)
                .await?
                .into_iter()
                .map(ItemView::from)
                .collect()
        } else {
            Vec::new()
        };
        tracing::info!("Listed {} of {} items", todo_items.len(), item_count);
        Ok(ItemPage {
            item_count,
            has_more: window.has_more,
            todo_items,
        })
    }

    /// Reads an item.
    #[instrument(skip(self))]
    pub async fn read_item(&self, id: ItemId) -> Result<ItemView, ItemError> {
        self.repository
            .get_by_id(id)
            .await?
            .map(ItemView::from)
            .ok_or(ItemError::NotFound(id))
    }

    /// Creates an item. The id of `view` is ignored.
    #[instrument(skip(self))]
    pub async fn create_item(&self, view: ItemView) -> Result<ItemView, ItemError> {
        let item = self
            .repository
            .insert(NewItem::new(view.name, view.is_complete))
            .await?;
        tracing::info!("Created item {}", item.id);
        Ok(item.into())
    }

    /// Updates the name and completion of item `id`.
    #[instrument(skip(self))]
    pub async fn update_item(&self, id: ItemId, view: ItemView) -> Result<(), ItemError> {
        if view.id != id {
            return Err(ItemError::IdentifierMismatch { path: id, body: view.id });
        }
        let mut item = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ItemError::NotFound(id))?;
        item.name = view.name;
        item.is_complete = view.is_complete;

        match self.repository.update(item).await {
            Ok(()) => {
                tracing::info!("Updated item");
                Ok(())
            }
            Err(StoreError::ConcurrencyConflict { .. }) => {
                if self.repository.exists(id).await? {
                    tracing::warn!("Item was modified concurrently");
                    Err(ItemError::ConcurrencyConflict(id))
                } else {
                    tracing::warn!("Item was deleted concurrently");
                    Err(ItemError::NotFound(id))
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes an item.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: ItemId) -> Result<(), ItemError> {
        match self.repository.delete(id).await {
            Ok(()) => {
                tracing::info!("Deleted item");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(ItemError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::item::{in_memory::InMemoryItemRepository, item_repository::MockItemRepository};
    use mockall::predicate::eq;

    fn view(id: ItemId, name: &str, is_complete: bool) -> ItemView {
        ItemView {
            id,
            name: Some(name.to_string()),
            is_complete,
        }
    }

    async fn service_with(count: usize) -> ItemService {
        let service = ItemService::new(Arc::new(InMemoryItemRepository::new()));
        for i in 0..count {
            service
                .create_item(view(0, &format!("Item {i}"), false))
                .await
                .unwrap();
        }
        service
    }

    fn stored(id: ItemId, version: u64) -> Item {
        Item {
            id,
            name: Some("Foo".to_string()),
            is_complete: false,
            secret: "secret of Foo".to_string(),
            version,
        }
    }

    #[tokio::test]
    async fn create_then_read_returns_same_view() {
        let service = service_with(0).await;
        let created = service.create_item(view(42, "Buy milk", false)).await.unwrap();
        assert_eq!(view(1, "Buy milk", false), created);
        assert_eq!(created, service.read_item(created.id).await.unwrap());

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(
            serde_json::json!({ "id": 1, "name": "Buy milk", "isComplete": false }),
            json
        );
    }

    #[tokio::test]
    async fn pages_of_seven_items() {
        let service = service_with(7).await;

        let page = service.list_items(0, 5).await.unwrap();
        assert_eq!(7, page.item_count);
        assert!(page.has_more);
        assert_eq!(5, page.todo_items.len());
        assert_eq!(1, page.todo_items[0].id);

        let page = service.list_items(1, 5).await.unwrap();
        assert!(!page.has_more);
        let ids: Vec<ItemId> = page.todo_items.iter().map(|item| item.id).collect();
        assert_eq!(vec![6, 7], ids);

        let page = service.list_items(2, 5).await.unwrap();
        assert_eq!(7, page.item_count);
        assert!(!page.has_more);
        assert!(page.todo_items.is_empty());
    }

    #[tokio::test]
    async fn page_past_the_end_does_not_list() {
        let mut repository = MockItemRepository::new();
        repository.expect_count().return_once(|| Ok(3));
        repository.expect_list_ordered().never();
        let service = ItemService::new(Arc::new(repository));

        let page = service.list_items(4, 5).await.unwrap();
        assert_eq!(3, page.item_count);
        assert!(page.todo_items.is_empty());
    }

    #[tokio::test]
    async fn update_changes_name_and_completion() {
        let service = service_with(1).await;
        service.update_item(1, view(1, "Done", true)).await.unwrap();
        assert_eq!(view(1, "Done", true), service.read_item(1).await.unwrap());
    }

    #[tokio::test]
    async fn update_with_mismatched_id_is_rejected() {
        let mut repository = MockItemRepository::new();
        repository.expect_get_by_id().never();
        repository.expect_update().never();
        let service = ItemService::new(Arc::new(repository));

        assert_eq!(
            Err(ItemError::IdentifierMismatch { path: 3, body: 4 }),
            service.update_item(3, view(4, "Foo", true)).await
        );
    }

    #[tokio::test]
    async fn update_of_missing_item_is_not_found() {
        let service = service_with(1).await;
        assert_eq!(
            Err(ItemError::NotFound(999)),
            service.update_item(999, view(999, "Foo", true)).await
        );
    }

    #[tokio::test]
    async fn conflicting_update_of_existing_item_is_a_conflict() {
        let mut repository = MockItemRepository::new();
        repository
            .expect_get_by_id()
            .with(eq(1))
            .return_once(|_| Ok(Some(stored(1, 0))));
        repository
            .expect_update()
            .return_once(|_| Err(StoreError::ConcurrencyConflict { id: 1 }));
        repository
            .expect_exists()
            .with(eq(1))
            .return_once(|_| Ok(true));
        let service = ItemService::new(Arc::new(repository));

        assert_eq!(
            Err(ItemError::ConcurrencyConflict(1)),
            service.update_item(1, view(1, "Bar", true)).await
        );
    }

    #[tokio::test]
    async fn conflicting_update_of_deleted_item_is_not_found() {
        let mut repository = MockItemRepository::new();
        repository
            .expect_get_by_id()
            .return_once(|_| Ok(Some(stored(1, 0))));
        repository
            .expect_update()
            .return_once(|_| Err(StoreError::ConcurrencyConflict { id: 1 }));
        repository.expect_exists().return_once(|_| Ok(false));
        let service = ItemService::new(Arc::new(repository));

        assert_eq!(
            Err(ItemError::NotFound(1)),
            service.update_item(1, view(1, "Bar", true)).await
        );
    }

    #[tokio::test]
    async fn update_leaves_secret_and_id_alone() {
        let mut repository = MockItemRepository::new();
        repository
            .expect_get_by_id()
            .return_once(|_| Ok(Some(stored(1, 3))));
        repository
            .expect_update()
            .withf(|item| {
                item.id == 1
                    && item.version == 3
                    && item.secret == "secret of Foo"
                    && item.name.as_deref() == Some("Bar")
                    && item.is_complete
            })
            .return_once(|_| Ok(()));
        let service = ItemService::new(Arc::new(repository));

        service.update_item(1, view(1, "Bar", true)).await.unwrap();
    }

    #[tokio::test]
    async fn store_failures_are_propagated() {
        let mut repository = MockItemRepository::new();
        repository
            .expect_insert()
            .return_once(|_| Err(StoreError::Unavailable("disk on fire".to_string())));
        let service = ItemService::new(Arc::new(repository));

        assert_eq!(
            Err(ItemError::Store(StoreError::Unavailable(
                "disk on fire".to_string()
            ))),
            service.create_item(view(0, "Foo", false)).await
        );
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let service = service_with(2).await;
        service.delete_item(1).await.unwrap();
        assert_eq!(Err(ItemError::NotFound(1)), service.read_item(1).await);
        assert_eq!(Err(ItemError::NotFound(1)), service.delete_item(1).await);
        assert_eq!(1, service.list_items(0, 5).await.unwrap().item_count);
    }

    #[tokio::test]
    async fn concurrent_updates_never_lose_silently() {
        let service = service_with(1).await;
        let updates = (0..8).map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .update_item(1, view(1, &format!("Update {i}"), i % 2 == 0))
                    .await
            })
        });
        let results = futures::future::join_all(updates).await;

        let mut succeeded = 0;
        for result in results {
            match result.unwrap() {
                Ok(()) => succeeded += 1,
                Err(ItemError::ConcurrencyConflict(1)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(succeeded >= 1);
    }
}
