//! Global application state.
//!
//! Handlers extract the parts they need with [`axum::extract::State`].

use super::config::{Config, PaginationConfig};
use crate::feature::item::{item_repository::ItemRepository, item_service::ItemService};
use axum::extract::FromRef;
use std::sync::Arc;

/// Global application state.
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    items: ItemService,
    pagination: PaginationConfig,
}

impl AppState {
    /// Constructs a new [`AppState`] around an item store.
    pub fn new(repository: Arc<dyn ItemRepository>, config: &Config) -> Self {
        Self {
            items: ItemService::new(repository),
            pagination: config.pagination,
        }
    }
}
