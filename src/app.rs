//! The axum application.
//!
//! # Examples
//!
//! Create an item, then fetch it.
//!
//! ```rust
//! # use todo_api::feature::item::item_service::ItemView;
//! # tokio_test::block_on(async {
//! # let url = todo_api::app::spawn_app().await;
//! let client = reqwest::Client::new();
//! let new_item = ItemView { id: 0, name: Some("Buy milk".to_string()), is_complete: false };
//! let response = client.post(format!("{url}/todoitems")).json(&new_item).send().await.unwrap();
//! assert_eq!(201, response.status());
//! let location = response.headers()["location"].to_str().unwrap().to_string();
//! let created = response.json::<ItemView>().await.unwrap();
//! assert_eq!(ItemView { id: 1, ..new_item }, created);
//! assert_eq!("/api/todoitems/1", location);
//!
//! let response = reqwest::get(format!("{url}/todoitems/1")).await.unwrap();
//! assert_eq!(200, response.status());
//! assert_eq!(created, response.json::<ItemView>().await.unwrap());
//! # });
//! ```
//!
//! Missing items give a 404.
//!
//! ```rust
//! # tokio_test::block_on(async {
//! # let url = todo_api::app::spawn_app().await;
//! let response = reqwest::get(format!("{url}/todoitems/999")).await.unwrap();
//! assert_eq!(404, response.status());
//! # });
//! ```

use crate::feature::item::in_memory::InMemoryItemRepository;
use crate::infra::error::{handle_middleware_error, PanicHandler};
use crate::infra::middleware::MakeRequestIdSpan;
use crate::infra::openapi::ApiDoc;
use crate::infra::{config::Config, state::AppState};
use axum::error_handling::HandleErrorLayer;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// Constructs the full axum application.
pub fn app(state: AppState, config: &Config) -> Router {
    // Fallible middleware from tower, mapped to infallible response with [`HandleErrorLayer`].
    // The limit's semaphore is shared by every route the layer is applied to.
    let tower_middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .load_shed()
        .layer(GlobalConcurrencyLimitLayer::new(
            config.server.concurrency_limit,
        ));

    // The REST API and its documentation, with the front-end served for everything else.
    Router::new()
        .merge(SwaggerUi::new("/api/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/api/redoc", ApiDoc::openapi()))
        .merge(RapiDoc::new("/api/openapi.json").path("/api/rapidoc"))
        .nest("/api", crate::feature::api(state))
        .fallback_service(ServeDir::new(&config.server.static_dir))
        // Layers
        .layer(TimeoutLayer::new(config.server.request_timeout))
        .layer(axum::middleware::from_fn(
            crate::infra::middleware::log_request_response,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(tower_middleware)
        .layer(CatchPanicLayer::custom(PanicHandler))
}

/// Starts the axum server, serving until ctrl-c is pressed.
pub async fn run_app(listener: TcpListener, config: Config) -> std::io::Result<()> {
    let state = AppState::new(Arc::new(InMemoryItemRepository::new()), &config);
    let app = app(state, &config).into_make_service();

    tracing::info!("Starting axum on {}", listener.local_addr()?);
    let exit_result = axum::serve(listener, app)
        .with_graceful_shutdown(crate::infra::shutdown::shutdown_signal())
        .await;

    match &exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }

    exit_result
}

/// Spawn a server with an empty store on a random port.
///
/// Returns the base url of the API.
pub async fn spawn_app() -> String {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(run_app(listener, Config::default()));
    format!("http://{address}:{port}/api")
}
