//! Types and the storage contract for to-do items.

use async_trait::async_trait;
use std::fmt::Debug;

/// The identifier of a stored item.
pub type ItemId = i64;

/// A stored to-do item, including fields the client never sees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Assigned by the store, never changes.
    pub id: ItemId,
    /// The item's name.
    pub name: Option<String>,
    /// Whether the item is done.
    pub is_complete: bool,
    /// Server-only, derived from the name at creation.
    pub secret: String,
    /// Concurrency token, bumped on every successful update.
    pub version: u64,
}

/// An item that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItem {
    /// The item's name.
    pub name: Option<String>,
    /// Whether the item is done.
    pub is_complete: bool,
    /// Server-only, derived from the name.
    pub secret: String,
}

impl NewItem {
    /// Creates a new item, deriving its secret from the name.
    pub fn new(name: Option<String>, is_complete: bool) -> Self {
        let secret = format!("secret of {}", name.as_deref().unwrap_or_default());
        Self {
            name,
            is_complete,
            secret,
        }
    }
}

/// Failures reported by an [`ItemRepository`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The item changed or disappeared between read and write.
    #[error("item {id} was modified concurrently")]
    ConcurrencyConflict {
        /// The item being written.
        id: ItemId,
    },
    /// The item did not exist when it was deleted.
    #[error("item {id} not found")]
    NotFound {
        /// The missing item.
        id: ItemId,
    },
    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The result of a store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Anything that can hold to-do items.
///
/// Listing returns items in a stable order, ascending by id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Debug + Send + Sync {
    /// Counts all items.
    async fn count(&self) -> StoreResult<usize>;

    /// Lists up to `take` items after skipping `skip`.
    async fn list_ordered(&self, skip: usize, take: usize) -> StoreResult<Vec<Item>>;

    /// Fetches an item.
    async fn get_by_id(&self, id: ItemId) -> StoreResult<Option<Item>>;

    /// Stores a new item and assigns its id.
    async fn insert(&self, new_item: NewItem) -> StoreResult<Item>;

    /// Writes back an item previously read from the store.
    ///
    /// Fails with [`StoreError::ConcurrencyConflict`] if the stored item no
    /// longer has the same version.
    async fn update(&self, item: Item) -> StoreResult<()>;

    /// Removes an item permanently.
    async fn delete(&self, id: ItemId) -> StoreResult<()>;

    /// Whether an item exists.
    async fn exists(&self, id: ItemId) -> StoreResult<bool>;
}
