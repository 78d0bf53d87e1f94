use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use std::sync::Arc;

use prodent_backend::ingest;

use super::{catalog_error_response, ApiResponse};
use crate::state::AppState;

/// POST /api/admin/catalog/import - CSV导入
///
/// Body is the raw feed; the report lists every rejected row / 请求体为原始CSV
pub async fn import_catalog(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    if body.is_empty() {
        return Json(ApiResponse::<()>::error("Leerer Import")).into_response();
    }

    match ingest::import_csv(&state.store, &body).await {
        Ok(report) => Json(ApiResponse::success(report)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

/// POST /api/admin/catalog/reindex - 全量重建搜索索引
pub async fn reindex_catalog(State(state): State<Arc<AppState>>) -> Response {
    match state.store.rebuild_search_index().await {
        Ok(indexed) => Json(ApiResponse::success(json!({ "indexed": indexed }))).into_response(),
        Err(err) => catalog_error_response(err),
    }
}
