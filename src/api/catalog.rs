use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prodent_backend::catalog::pagination::{self, PaginationState};
use prodent_backend::models::{FacetCount, Product, SearchRequest};

use super::{catalog_error_response, ApiResponse};
use crate::state::AppState;

/// Query parameters of the public search surface. `page` is parsed
/// leniently: anything non-numeric lands on page 1 / 公共搜索参数，页码宽松解析
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

impl SearchParams {
    fn into_request(self) -> SearchRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);

        SearchRequest {
            text: self.q.trim().to_string(),
            manufacturer: self.manufacturer,
            category: self.category,
            page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub products: Vec<Product>,
    pub total_count: i64,
    pub manufacturer_facets: Vec<FacetCount>,
    pub category_facets: Vec<FacetCount>,
    pub pagination: PaginationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

/// GET /api/catalog/search - 搜索与列表
pub async fn search_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let request = params.into_request();

    match state.search.search(&request).await {
        Ok(bundle) => {
            let pg = PaginationState::new(bundle.total_count, request.page);

            // page links round-trip every active filter / 翻页链接保留全部过滤条件
            let prev_link = pg.prev_page.map(|page| {
                format!("/api/catalog/search?{}", pagination::page_query(&request, page))
            });
            let next_link = pg.next_page.map(|page| {
                format!("/api/catalog/search?{}", pagination::page_query(&request, page))
            });

            Json(ApiResponse::success(SearchResponse {
                products: bundle.items,
                total_count: bundle.total_count,
                manufacturer_facets: bundle.manufacturer_facets,
                category_facets: bundle.category_facets,
                pagination: pg,
                prev_link,
                next_link,
            }))
            .into_response()
        }
        Err(err) => catalog_error_response(err),
    }
}

/// GET /api/catalog/products/:sku - 商品详情
///
/// Inactive and unknown skus are indistinguishable from the outside: both
/// are a 404 / 下架与不存在皆为404
pub async fn product_detail(
    State(state): State<Arc<AppState>>,
    Path(sku): Path<String>,
) -> Response {
    match state.store.product_by_sku(&sku).await {
        Ok(Some(product)) => Json(ApiResponse::success(product)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error("Produkt nicht gefunden")),
        )
            .into_response(),
        Err(err) => catalog_error_response(err),
    }
}
