use axum::Router;

use crate::infra::state::AppState;

pub mod item;

/// Constructs the REST API.
pub fn api(state: AppState) -> Router {
    Router::new()
        .merge(item::item_api::routes())
        .with_state(state)
}
