use serde::{Deserialize, Serialize};

/// One catalog entry. `sku` is the natural key, stable across re-imports / 一条商品记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub variant_name: Option<String>,
    pub manufacturer: String,
    pub manufacturer_number: Option<String>,
    pub product_group: Option<String>,
    /// Flattened leaf category / 扁平化的叶子分类
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Incoming product data for the ingestion write path / 导入写入的商品数据
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub variant_name: Option<String>,
    pub manufacturer: String,
    pub manufacturer_number: Option<String>,
    pub product_group: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
}

impl Default for ProductInput {
    fn default() -> Self {
        Self {
            sku: String::new(),
            name: String::new(),
            variant_name: None,
            manufacturer: String::new(),
            manufacturer_number: None,
            product_group: None,
            category: None,
            description: None,
            image_url: None,
            active: true,
        }
    }
}

/// A structured search request. Filters are independent and ANDed together / 结构化搜索请求
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Free text, empty means no text filter / 自由文本，空串表示不过滤
    pub text: String,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub page: i64,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            manufacturer: None,
            category: None,
            page: 1,
        }
    }
}

/// One facet entry: grouping value plus its product count / 一条分面统计
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FacetCount {
    pub name: String,
    pub count: i64,
}

/// Everything one search call produces / 一次搜索调用的全部结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBundle {
    pub items: Vec<Product>,
    pub total_count: i64,
    /// Counts over the whole active catalog, never narrowed by filters / 全目录统计
    pub manufacturer_facets: Vec<FacetCount>,
    /// Counts within the selected manufacturer, empty when none selected / 厂商内分类统计
    pub category_facets: Vec<FacetCount>,
}

/// Outcome of one CSV import run / 一次CSV导入的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub received: u64,
    pub upserted: u64,
    pub skipped: u64,
    pub errors: Vec<String>,
}
