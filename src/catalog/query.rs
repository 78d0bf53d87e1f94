//! Query construction / 查询构造
//!
//! Turns a [`SearchRequest`] into fully parameterized SQL. Pure module:
//! request in, SQL text plus bind values out, no I/O / 纯函数模块，无I/O
//!
//! Drift safety / 防漂移：
//! - Each optional filter becomes one [`Predicate`] in an ordered list
//! - One renderer turns that list into WHERE text and the parallel bind
//!   array, and the result query and count query share it verbatim, so the
//!   two can never disagree about which rows are in scope
//!
//! Ordering contract / 排序契约：
//! - With text: bm25 relevance over the four index tiers, then sku
//!   (bm25 returns lower-is-better, so ascending means best first)
//! - Without text: name alphabetical, case folded, then sku

use crate::models::SearchRequest;

use super::fts;
use super::pagination::PAGE_SIZE;

/// Product columns selected by every row query / 行查询的列清单
pub const PRODUCT_COLUMNS: &str = "p.id, p.sku, p.name, p.variant_name, p.manufacturer, \
     p.manufacturer_number, p.product_group, p.category, p.description, p.image_url, \
     p.active, p.created_at, p.updated_at";

/// bm25 weights for title_text, brand_text, sku_text, body_text / 四层权重
pub const RANK_WEIGHTS: &str = "10.0, 4.0, 2.0, 1.0";

/// A bound parameter value / 绑定参数值
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
}

/// One WHERE predicate: a clause containing a single placeholder plus the
/// value bound to it / 单个WHERE谓词
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub clause: &'static str,
    pub value: SqlValue,
}

/// A rendered query: SQL text plus bind values in placeholder order / 渲染完成的查询
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Build the filter predicates for a request / 构造过滤谓词
///
/// Returns the ordered predicate list and whether a text filter is present.
/// Empty or whitespace-only filter values contribute nothing; unknown values
/// are still valid and simply match zero rows / 未知取值合法，只是命中零行
fn filter_predicates(request: &SearchRequest) -> (Vec<Predicate>, bool) {
    let mut predicates = Vec::new();
    let mut has_text = false;

    if let Some(expression) = fts::match_expression(&request.text) {
        predicates.push(Predicate {
            clause: "products_fts MATCH ?",
            value: SqlValue::Text(expression),
        });
        has_text = true;
    }

    if let Some(manufacturer) = clean_filter(request.manufacturer.as_deref()) {
        predicates.push(Predicate {
            clause: "p.manufacturer = ?",
            value: SqlValue::Text(manufacturer),
        });
    }

    if let Some(category) = clean_filter(request.category.as_deref()) {
        predicates.push(Predicate {
            clause: "p.category = ?",
            value: SqlValue::Text(category),
        });
    }

    (predicates, has_text)
}

/// Trimmed, non-empty filter value or nothing / 清洗过滤值
pub fn clean_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The single WHERE renderer shared by result and count queries / 共享的WHERE渲染器
///
/// Inactive rows are invisible to every query in scope, so the active guard
/// is part of the base clause rather than an optional predicate.
fn render_where(predicates: &[Predicate]) -> (String, Vec<SqlValue>) {
    let mut clause = String::from("p.active = 1");
    let mut binds = Vec::with_capacity(predicates.len());

    for predicate in predicates {
        clause.push_str(" AND ");
        clause.push_str(predicate.clause);
        binds.push(predicate.value.clone());
    }

    (clause, binds)
}

/// Text queries join the index table, listing queries do not / FROM子句
fn from_clause(has_text: bool) -> &'static str {
    if has_text {
        "products p JOIN products_fts ON products_fts.rowid = p.id"
    } else {
        "products p"
    }
}

/// The primary result query: filtered, ordered, windowed / 主结果查询
pub fn result_query(request: &SearchRequest) -> SqlQuery {
    let (predicates, has_text) = filter_predicates(request);
    let (where_sql, mut binds) = render_where(&predicates);

    let order_sql = if has_text {
        format!("bm25(products_fts, {}) ASC, p.sku ASC", RANK_WEIGHTS)
    } else {
        "p.name COLLATE NOCASE ASC, p.sku ASC".to_string()
    };

    // saturate so an absurd page value cannot overflow the offset / 防溢出
    let page = request.page.max(1);
    let offset = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    binds.push(SqlValue::Int(PAGE_SIZE));
    binds.push(SqlValue::Int(offset));

    SqlQuery {
        sql: format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            PRODUCT_COLUMNS,
            from_clause(has_text),
            where_sql,
            order_sql
        ),
        binds,
    }
}

/// The matching count query: same FROM and WHERE, no ordering or window / 计数查询
pub fn count_query(request: &SearchRequest) -> SqlQuery {
    let (predicates, has_text) = filter_predicates(request);
    let (where_sql, binds) = render_where(&predicates);

    SqlQuery {
        sql: format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            from_clause(has_text),
            where_sql
        ),
        binds,
    }
}

/// Manufacturer facet: counts over the whole active catalog, deliberately
/// ignoring every filter so the navigation stays stable / 厂商分面，忽略所有过滤
pub fn manufacturer_facet_query() -> SqlQuery {
    SqlQuery {
        sql: "SELECT p.manufacturer AS name, COUNT(*) AS count FROM products p \
              WHERE p.active = 1 GROUP BY p.manufacturer ORDER BY p.manufacturer ASC"
            .to_string(),
        binds: Vec::new(),
    }
}

/// Category facet: counts within one manufacturer, ignoring text and
/// category filters. Rows without a category are not navigable / 分类分面
pub fn category_facet_query(manufacturer: &str) -> SqlQuery {
    SqlQuery {
        sql: "SELECT p.category AS name, COUNT(*) AS count FROM products p \
              WHERE p.active = 1 AND p.manufacturer = ? \
              AND p.category IS NOT NULL AND p.category <> '' \
              GROUP BY p.category ORDER BY p.category ASC"
            .to_string(),
        binds: vec![SqlValue::Text(manufacturer.to_string())],
    }
}
