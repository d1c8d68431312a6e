//! The to-do item API implementation.

use crate::{
    feature::item::{
        item_repository::ItemId,
        item_service::{ItemPage, ItemService, ItemView},
    },
    infra::{
        config::PaginationConfig,
        error::{ApiResult, ClientError, ErrorBody},
        extract::{Json, Query},
        pagination::PaginationParams,
        state::AppState,
    },
};
use axum::{extract::State, response::IntoResponse, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::{header::LOCATION, StatusCode};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

/// The to-do item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_get(list_items)
        .typed_post(create_item)
        .typed_get(get_item)
        .typed_put(update_item)
        .typed_delete(delete_item)
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/todoitems", rejection(ClientError))]
pub struct TodoItems;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/todoitems/:id", rejection(ClientError))]
pub struct TodoItemsId(ItemId);

/// Lists one page of to-do items.
#[utoipa::path(
    get,
    path = "/api/todoitems",
    params(PaginationParams),
    responses(
        (status = 200, description = "Success", body = ItemPage),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 422, description = "Unprocessable Entity", body = ErrorBody),
    )
)]
#[instrument(skip(items, pagination))]
pub async fn list_items(
    _: TodoItems,
    State(items): State<ItemService>,
    State(pagination): State<PaginationConfig>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<ItemPage>> {
    params.validate()?;
    let page_size = params.page_size_or(pagination.default_page_size);
    let page = items.list_items(params.page(), page_size).await?;
    Ok(Json(page))
}

/// Gets a to-do item.
#[utoipa::path(
    get,
    path = "/api/todoitems/{id}",
    params(("id" = i64, Path, description = "The item id")),
    responses(
        (status = 200, description = "Ok", body = ItemView),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
pub async fn get_item(
    TodoItemsId(id): TodoItemsId,
    State(items): State<ItemService>,
) -> ApiResult<Json<ItemView>> {
    let item = items.read_item(id).await?;
    Ok(Json(item))
}

/// Creates a to-do item.
#[utoipa::path(
    post,
    path = "/api/todoitems",
    request_body = ItemView,
    responses(
        (status = 201, description = "Created", body = ItemView,
            headers(("location" = String, description = "Where the new item lives"))),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 415, description = "Unsupported Media Type", body = ErrorBody),
        (status = 422, description = "Unprocessable Entity", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
pub async fn create_item(
    _: TodoItems,
    State(items): State<ItemService>,
    Json(view): Json<ItemView>,
) -> ApiResult<impl IntoResponse> {
    let item = items.create_item(view).await?;
    let location = format!("/api{}", TodoItemsId(item.id).to_uri());
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(item)))
}

/// Updates the name and completion of a to-do item.
#[utoipa::path(
    put,
    path = "/api/todoitems/{id}",
    params(("id" = i64, Path, description = "The item id")),
    request_body = ItemView,
    responses(
        (status = 204, description = "No Content"),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Conflict", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
pub async fn update_item(
    TodoItemsId(id): TodoItemsId,
    State(items): State<ItemService>,
    Json(view): Json<ItemView>,
) -> ApiResult<StatusCode> {
    items.update_item(id, view).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a to-do item.
#[utoipa::path(
    delete,
    path = "/api/todoitems/{id}",
    params(("id" = i64, Path, description = "The item id")),
    responses(
        (status = 204, description = "No Content"),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(items))]
pub async fn delete_item(
    TodoItemsId(id): TodoItemsId,
    State(items): State<ItemService>,
) -> ApiResult<StatusCode> {
    items.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
