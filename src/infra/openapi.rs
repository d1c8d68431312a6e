//! OpenAPI configuration.

use crate::feature::item::{item_api, item_service};

/// OpenApi configuration.
#[derive(utoipa::OpenApi)]
#[openapi(
    info(description = "A to-do list backend"),
    paths(
        item_api::list_items,
        item_api::get_item,
        item_api::create_item,
        item_api::update_item,
        item_api::delete_item,
    ),
    components(
        schemas(
            item_service::ItemView,
            item_service::ItemPage,
            crate::infra::error::ErrorBody
        )
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;
