//! Search engine - the one entry point for catalog reads / 目录搜索引擎
//!
//! Wraps query construction and store execution into a single call that
//! assembles the full [`ResultBundle`]. The four reads of one search run
//! concurrently; the corpus only changes via out-of-band bulk ingestion, so
//! same-pool consistency is enough / 四个只读查询并发执行
//!
//! Zero matches is a normal result. Only a store failure is an error, and it
//! propagates unmodified so callers can tell a 5xx from an empty page.

use tracing::debug;

use crate::models::{ResultBundle, SearchRequest};

use super::error::CatalogError;
use super::query;
use super::store::CatalogRead;

/// Generic over the store seam so tests can inject a fake / 泛型存储接口
pub struct CatalogSearch<S> {
    store: S,
}

impl<S: CatalogRead> CatalogSearch<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute one search request / 执行一次搜索
    ///
    /// The category facet is contextual to the selected manufacturer: no
    /// manufacturer selected means no category list. That is a product
    /// decision, not an optimization / 未选厂商则分类分面为空，这是产品决策
    pub async fn search(&self, request: &SearchRequest) -> Result<ResultBundle, CatalogError> {
        debug!(
            text = %request.text,
            manufacturer = request.manufacturer.as_deref().unwrap_or(""),
            category = request.category.as_deref().unwrap_or(""),
            page = request.page,
            "catalog search"
        );

        let result = query::result_query(request);
        let count = query::count_query(request);
        let manufacturers = query::manufacturer_facet_query();
        let categories = query::clean_filter(request.manufacturer.as_deref())
            .map(|manufacturer| query::category_facet_query(&manufacturer));

        let category_read = async {
            match &categories {
                Some(q) => self.store.group_count(q).await,
                None => Ok(Vec::new()),
            }
        };

        let (items, total_count, manufacturer_facets, category_facets) = tokio::try_join!(
            self.store.query_active_products(&result),
            self.store.count_active_products(&count),
            self.store.group_count(&manufacturers),
            category_read,
        )?;

        Ok(ResultBundle {
            items,
            total_count,
            manufacturer_facets,
            category_facets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::query::SqlQuery;
    use crate::catalog::store::CatalogStore;
    use crate::models::{FacetCount, Product, ProductInput};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::time::Duration;

    // ---- fake-store tests / 假存储测试 ----

    /// Records every executed query; optionally fails all reads / 记录查询的假存储
    struct FakeStore {
        group_queries: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeStore {
        fn new(fail: bool) -> Self {
            Self {
                group_queries: Mutex::new(Vec::new()),
                fail,
            }
        }

        fn check(&self) -> Result<(), CatalogError> {
            if self.fail {
                Err(CatalogError::StoreUnavailable(anyhow::anyhow!(
                    "connection refused"
                )))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CatalogRead for FakeStore {
        async fn query_active_products(
            &self,
            _query: &SqlQuery,
        ) -> Result<Vec<Product>, CatalogError> {
            self.check()?;
            Ok(Vec::new())
        }

        async fn count_active_products(&self, _query: &SqlQuery) -> Result<i64, CatalogError> {
            self.check()?;
            Ok(0)
        }

        async fn group_count(&self, query: &SqlQuery) -> Result<Vec<FacetCount>, CatalogError> {
            self.check()?;
            self.group_queries.lock().push(query.sql.clone());
            Ok(vec![FacetCount {
                name: "Brand X".to_string(),
                count: 1,
            }])
        }
    }

    #[tokio::test]
    async fn test_no_results_is_ok_not_error() {
        let engine = CatalogSearch::new(FakeStore::new(false));
        let bundle = engine.search(&SearchRequest::default()).await.unwrap();
        assert!(bundle.items.is_empty());
        assert_eq!(bundle.total_count, 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let engine = CatalogSearch::new(FakeStore::new(true));
        let err = engine.search(&SearchRequest::default()).await.unwrap_err();
        assert!(matches!(err, CatalogError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_no_manufacturer_means_no_category_read() {
        let engine = CatalogSearch::new(FakeStore::new(false));
        let bundle = engine.search(&SearchRequest::default()).await.unwrap();

        assert!(bundle.category_facets.is_empty());
        // only the manufacturer facet hit group_count / 仅厂商分面执行了分组查询
        let queries = engine.store().group_queries.lock().clone();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("GROUP BY p.manufacturer"));
    }

    #[tokio::test]
    async fn test_selected_manufacturer_adds_category_read() {
        let engine = CatalogSearch::new(FakeStore::new(false));
        let request = SearchRequest {
            manufacturer: Some("Brand X".to_string()),
            ..Default::default()
        };
        let bundle = engine.search(&request).await.unwrap();

        assert_eq!(bundle.category_facets.len(), 1);
        let queries = engine.store().group_queries.lock().clone();
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().any(|q| q.contains("GROUP BY p.category")));
    }

    // ---- end-to-end tests over in-memory SQLite / 内存库端到端测试 ----

    async fn seeded_engine(products: Vec<ProductInput>) -> CatalogSearch<CatalogStore> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        let store = CatalogStore::new(pool, Duration::from_secs(5));
        store.upsert_batch(&products).await.unwrap();
        CatalogSearch::new(store)
    }

    fn product(sku: &str, name: &str, manufacturer: &str, category: Option<&str>) -> ProductInput {
        ProductInput {
            sku: sku.to_string(),
            name: name.to_string(),
            manufacturer: manufacturer.to_string(),
            category: category.map(str::to_string),
            ..Default::default()
        }
    }

    fn text_request(text: &str) -> SearchRequest {
        SearchRequest {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn dental_catalog() -> Vec<ProductInput> {
        let mut rows = vec![
            product("IMP-001", "Implantat-System", "Brand Z", Some("Implantate")),
            product("BOH-001", "Bohrer rund", "Brand X", Some("Rotierende Instrumente")),
            product("BOH-002", "Bohrer spitz", "Brand X", Some("Rotierende Instrumente")),
            product("POL-001", "Politurpaste", "Brand X", Some("Prophylaxe")),
            product("ABF-001", "Abformmasse", "Brand Y", None),
        ];
        // inactive rows are invisible everywhere / 下架商品处处不可见
        let mut retired = product("ALT-001", "Implantat alt", "Brand Z", Some("Implantate"));
        retired.active = false;
        rows.push(retired);
        rows
    }

    #[tokio::test]
    async fn test_empty_request_lists_alphabetically() {
        let engine = seeded_engine(dental_catalog()).await;
        let bundle = engine.search(&SearchRequest::default()).await.unwrap();

        assert_eq!(bundle.total_count, 5);
        let names: Vec<&str> = bundle.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Abformmasse",
                "Bohrer rund",
                "Bohrer spitz",
                "Implantat-System",
                "Politurpaste",
            ]
        );
    }

    #[tokio::test]
    async fn test_text_search_finds_implantat() {
        let engine = seeded_engine(dental_catalog()).await;
        let bundle = engine.search(&text_request("Implantat")).await.unwrap();

        assert!(bundle.total_count >= 1);
        assert!(bundle.items.iter().any(|p| p.name == "Implantat-System"));
        // the retired Implantat never shows / 下架的Implantat不出现
        assert!(bundle.items.iter().all(|p| p.sku != "ALT-001"));
    }

    #[tokio::test]
    async fn test_title_match_outranks_description_match() {
        let mut rows = vec![product("T-1", "Implantatbohrer", "Brand X", None)];
        let mut body_hit = product("T-2", "Winkelstück", "Brand Y", None);
        body_hit.description = Some("<p>passend für jeden Implantatbohrer</p>".to_string());
        rows.push(body_hit);

        let engine = seeded_engine(rows).await;
        let bundle = engine.search(&text_request("implantatbohrer")).await.unwrap();

        assert_eq!(bundle.total_count, 2);
        assert_eq!(bundle.items[0].sku, "T-1");
        assert_eq!(bundle.items[1].sku, "T-2");
    }

    #[tokio::test]
    async fn test_diacritics_fold_in_the_index() {
        let rows = vec![product("M-1", "Matrizen", "Müller & Söhne", None)];
        let engine = seeded_engine(rows).await;

        //查询无变音符号也能命中
        let bundle = engine.search(&text_request("muller")).await.unwrap();
        assert_eq!(bundle.total_count, 1);
        assert_eq!(bundle.items[0].manufacturer, "Müller & Söhne");
    }

    #[tokio::test]
    async fn test_manufacturer_facets_ignore_filters() {
        let engine = seeded_engine(dental_catalog()).await;

        let unfiltered = engine.search(&SearchRequest::default()).await.unwrap();
        let filtered = engine
            .search(&SearchRequest {
                text: "bohrer".to_string(),
                manufacturer: Some("Brand X".to_string()),
                category: Some("Rotierende Instrumente".to_string()),
                page: 1,
            })
            .await
            .unwrap();

        // 厂商分面始终覆盖全目录
        assert_eq!(unfiltered.manufacturer_facets, filtered.manufacturer_facets);
        assert_eq!(
            filtered.manufacturer_facets,
            vec![
                FacetCount { name: "Brand X".to_string(), count: 3 },
                FacetCount { name: "Brand Y".to_string(), count: 1 },
                FacetCount { name: "Brand Z".to_string(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_category_facets_scoped_to_manufacturer() {
        let engine = seeded_engine(dental_catalog()).await;
        let bundle = engine
            .search(&SearchRequest {
                manufacturer: Some("Brand X".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(bundle.items.iter().all(|p| p.manufacturer == "Brand X"));
        assert_eq!(
            bundle.category_facets,
            vec![
                FacetCount { name: "Prophylaxe".to_string(), count: 1 },
                FacetCount { name: "Rotierende Instrumente".to_string(), count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_rows_without_category_are_not_a_facet() {
        let engine = seeded_engine(dental_catalog()).await;
        let bundle = engine
            .search(&SearchRequest {
                manufacturer: Some("Brand Y".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(bundle.total_count, 1);
        assert!(bundle.category_facets.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_manufacturer_yields_empty_not_error() {
        let engine = seeded_engine(dental_catalog()).await;
        let bundle = engine
            .search(&SearchRequest {
                manufacturer: Some("Niemand GmbH".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(bundle.items.is_empty());
        assert_eq!(bundle.total_count, 0);
        assert!(bundle.category_facets.is_empty());
        // 全目录厂商分面不受影响
        assert_eq!(bundle.manufacturer_facets.len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_search_is_idempotent() {
        let engine = seeded_engine(dental_catalog()).await;
        let request = SearchRequest {
            text: "bohrer".to_string(),
            manufacturer: Some("Brand X".to_string()),
            ..Default::default()
        };

        let first = engine.search(&request).await.unwrap();
        let second = engine.search(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_two_pages_are_disjoint_and_exhaustive() {
        // 正好96件商品，两页各48件，无重叠
        let rows: Vec<ProductInput> = (0..96)
            .map(|i| {
                product(
                    &format!("SKU-{:03}", i),
                    &format!("Produkt {:03}", i),
                    "Brand X",
                    None,
                )
            })
            .collect();
        let engine = seeded_engine(rows).await;

        let page1 = engine
            .search(&SearchRequest { page: 1, ..Default::default() })
            .await
            .unwrap();
        let page2 = engine
            .search(&SearchRequest { page: 2, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page1.total_count, 96);
        assert_eq!(page1.items.len(), 48);
        assert_eq!(page2.items.len(), 48);

        let mut skus: Vec<String> = page1
            .items
            .iter()
            .chain(page2.items.iter())
            .map(|p| p.sku.clone())
            .collect();
        skus.sort();
        skus.dedup();
        assert_eq!(skus.len(), 96);

        let page3 = engine
            .search(&SearchRequest { page: 3, ..Default::default() })
            .await
            .unwrap();
        assert!(page3.items.is_empty());
        assert_eq!(page3.total_count, 96);
    }
}
