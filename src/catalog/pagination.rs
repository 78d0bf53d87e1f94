//! Pagination policy / 分页策略
//!
//! Pure derivation of navigation state from a total count and the requested
//! page. Zero rows means zero pages, not one empty page / 零行即零页
//!
//! Page links must round-trip every active filter, so consumers build them
//! through [`page_query`] rather than hand-assembling query strings.

use serde::Serialize;

use crate::models::SearchRequest;

use super::query::clean_filter;

/// Fixed window size shared by listing and search / 固定每页条数
pub const PAGE_SIZE: i64 = 48;

/// Navigation state for one result page / 一页结果的导航状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationState {
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
}

impl PaginationState {
    /// Derive pagination from (total_count, page) / 由总数与页码推导
    pub fn new(total_count: i64, page: i64) -> Self {
        let total_pages = (total_count.max(0) + PAGE_SIZE - 1) / PAGE_SIZE;
        let page = page.max(1);

        let has_prev = total_pages > 0 && page > 1;
        let has_next = page < total_pages;

        Self {
            page,
            page_size: PAGE_SIZE,
            total_pages,
            has_prev,
            has_next,
            prev_page: has_prev.then(|| page - 1),
            next_page: has_next.then(|| page + 1),
        }
    }
}

/// Build the query string for a page link, round-tripping q, manufacturer
/// and category and omitting the ones that are empty / 构造翻页链接的查询串
pub fn page_query(request: &SearchRequest, page: i64) -> String {
    let mut parts = Vec::new();

    let text = request.text.trim();
    if !text.is_empty() {
        parts.push(format!("q={}", urlencoding::encode(text)));
    }
    if let Some(manufacturer) = clean_filter(request.manufacturer.as_deref()) {
        parts.push(format!("manufacturer={}", urlencoding::encode(&manufacturer)));
    }
    if let Some(category) = clean_filter(request.category.as_deref()) {
        parts.push(format!("category={}", urlencoding::encode(&category)));
    }
    parts.push(format!("page={}", page));

    parts.join("&")
}
