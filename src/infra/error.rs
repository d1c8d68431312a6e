//! Types for reporting errors that happened during a request.
//!
//! If your handler talks to the item store or validates user input,
//! you likely want to return an [`ApiResult`].

use super::extract::Json;
use crate::feature::item::{item_repository::StoreError, item_service::ItemError};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::HeaderValue,
    response::IntoResponse,
    BoxError,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::catch_panic::ResponseForPanic;
use utoipa::ToSchema;

/// A standard error response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// A description of the error.
    message: String,
    /// When the error happened.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    timestamp: OffsetDateTime,
}

impl ErrorBody {
    pub(crate) fn new(message: String) -> Self {
        Self {
            message,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// When the error happened.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// An error from our API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error caused by the client.
    #[error("{0}")]
    ClientError(#[from] ClientError),
    /// An internal error.
    #[error("{0}")]
    InternalError(#[from] InternalError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::ClientError(e) => e.into_response(),
            ApiError::InternalError(e) => {
                tracing::error!("internal error: {}", e);
                e.into_response()
            }
        }
    }
}

/// The result of calling API-related functions.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::ClientError(ClientError::NotFound),
            StoreError::ConcurrencyConflict { .. } => ApiError::ClientError(ClientError::Conflict),
            e @ StoreError::Unavailable(_) => ApiError::InternalError(InternalError::StoreError(e)),
        }
    }
}

impl From<ItemError> for ApiError {
    fn from(e: ItemError) -> Self {
        match e {
            e @ ItemError::IdentifierMismatch { .. } => {
                ApiError::ClientError(ClientError::BadRequest(e.to_string()))
            }
            ItemError::NotFound(_) => ApiError::ClientError(ClientError::NotFound),
            ItemError::ConcurrencyConflict(_) => ApiError::ClientError(ClientError::Conflict),
            ItemError::Store(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        let mut invalid_fields = String::new();
        for (k, v) in e.field_errors() {
            let mut codes = String::new();
            for e in v {
                codes += &format!("{},", e.code);
            }
            let codes = codes.trim_end_matches(',');
            invalid_fields += &format!("{k} ({codes}),");
        }
        let invalid_fields = invalid_fields.trim_end_matches(',');
        ApiError::ClientError(ClientError::UnprocessableEntity(format!(
            "invalid field(s): {invalid_fields}"
        )))
    }
}

/// Errors caused by the client.
/// The client can do something to fix these.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input validation failed, or some illegal operation was attempted.
    #[error("{0}")]
    BadRequest(String),
    /// The resource was not found.
    #[error("not found")]
    NotFound,
    /// The resource changed while we were writing it.
    #[error("conflict")]
    Conflict,
    /// Validation errors.
    #[error("{0}")]
    UnprocessableEntity(String),
    /// Custom error.
    #[error("{1}")]
    Custom(StatusCode, String),
}

// The rejection of unit `TypedPath`s such as `/todoitems` when the path does not match.
impl Default for ClientError {
    fn default() -> Self {
        Self::BadRequest("Bad Request".to_string())
    }
}

impl From<JsonRejection> for ClientError {
    fn from(value: JsonRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl From<QueryRejection> for ClientError {
    fn from(value: QueryRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl From<PathRejection> for ClientError {
    fn from(value: PathRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> axum::response::Response {
        let msg = self.to_string();
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Custom(status, _) => status,
        };
        (status, Json(ErrorBody::new(msg))).into_response()
    }
}

/// An internal error.
/// The client cannot do anything about this.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    /// The item store failed.
    #[error("store error: {0}")]
    StoreError(StoreError),
    /// Too many requests in flight.
    #[error("overloaded")]
    Overloaded,
    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl IntoResponse for InternalError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Self::StoreError(_) => StatusCode::BAD_GATEWAY,
            Self::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut response =
            (status, Json(ErrorBody::new("internal error".to_string()))).into_response();
        response
            .headers_mut()
            .insert("Retry-After", HeaderValue::from_static("5"));
        response
    }
}

/// Maps failures from fallible tower middleware to a response.
pub(crate) async fn handle_middleware_error(e: BoxError) -> axum::response::Response {
    let e = if e.is::<tower::load_shed::error::Overloaded>() {
        InternalError::Overloaded
    } else {
        InternalError::Other(format!("Tower middleware failed: {e}"))
    };
    ApiError::InternalError(e).into_response()
}

/// A handler for converting panics into proper responses for the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanicHandler;

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        _: Box<dyn std::any::Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        ApiError::InternalError(InternalError::Other("Panic".to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_errors_map_to_status_codes() {
        let cases = [
            (
                ItemError::IdentifierMismatch { path: 3, body: 4 },
                StatusCode::BAD_REQUEST,
            ),
            (ItemError::NotFound(999), StatusCode::NOT_FOUND),
            (ItemError::ConcurrencyConflict(1), StatusCode::CONFLICT),
            (
                ItemError::Store(StoreError::Unavailable("down".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, status) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(status, response.status());
        }
    }

    #[test]
    fn internal_errors_ask_client_to_retry() {
        let response = InternalError::Overloaded.into_response();
        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, response.status());
        assert_eq!("5", response.headers()["Retry-After"]);
    }

    #[test]
    fn error_body_timestamp_is_rfc3339() {
        let body = ErrorBody::new("not found".to_string());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!("not found", json["message"]);
        let timestamp = json["timestamp"].as_str().unwrap();
        let parsed = OffsetDateTime::parse(
            timestamp,
            &time::format_description::well_known::Rfc3339,
        )
        .unwrap();
        assert_eq!(body.timestamp(), parsed);
    }
}
