pub mod admin;
pub mod catalog;
pub mod server;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use prodent_backend::catalog::CatalogError;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            code: 400,
            message: message.to_string(),
            data: None,
        }
    }
}

/// Map catalog errors to HTTP responses. A store failure is a 503 with a
/// generic message; details go to the log only / 存储故障返回503，细节仅记日志
pub fn catalog_error_response(err: CatalogError) -> Response {
    match err {
        CatalogError::StoreUnavailable(source) => {
            tracing::error!("catalog store unavailable: {:#}", source);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::<()>::error("Katalog vorübergehend nicht verfügbar")),
            )
                .into_response()
        }
        CatalogError::InvalidRequest(message) => {
            tracing::warn!("invalid catalog request: {}", message);
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(&message)),
            )
                .into_response()
        }
    }
}
