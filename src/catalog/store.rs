//! Catalog store - query execution and index maintenance / 目录存储
//!
//! The read side executes rendered [`SqlQuery`] values against SQLite and is
//! the only place the search engine touches a connection pool. Every read is
//! bounded by the configured query timeout; a timeout surfaces as
//! [`CatalogError::StoreUnavailable`], never as an empty result / 超时即错误
//!
//! The write side belongs to the ingestion pipeline: upsert-by-sku with the
//! FTS row recomputed inside the same transaction as the product row, so the
//! index can never drift from the source fields / 索引与行同事务维护

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::time::timeout;

use crate::models::{FacetCount, Product, ProductInput};

use super::error::CatalogError;
use super::fts::SearchDocument;
use super::query::{SqlQuery, SqlValue, PRODUCT_COLUMNS};

/// Read seam between the search engine and the store. Tests substitute a
/// fake implementation / 引擎与存储之间的读取接口
#[async_trait]
pub trait CatalogRead: Send + Sync {
    async fn query_active_products(&self, query: &SqlQuery) -> Result<Vec<Product>, CatalogError>;

    async fn count_active_products(&self, query: &SqlQuery) -> Result<i64, CatalogError>;

    async fn group_count(&self, query: &SqlQuery) -> Result<Vec<FacetCount>, CatalogError>;
}

/// SQLite-backed catalog store / 基于SQLite的目录存储
#[derive(Clone)]
pub struct CatalogStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl CatalogStore {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch one active product by its natural key / 按sku读取一条在售商品
    pub async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, CatalogError> {
        let sql = format!(
            "SELECT {} FROM products p WHERE p.sku = ? AND p.active = 1",
            PRODUCT_COLUMNS
        );
        let row = timeout(
            self.query_timeout,
            sqlx::query_as::<_, Product>(&sql)
                .bind(sku)
                .fetch_optional(&self.pool),
        )
        .await??;
        Ok(row)
    }

    /// Upsert one product and its index row in a single transaction / 单条写入
    pub async fn upsert_product(&self, input: &ProductInput) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_in_tx(&mut tx, input).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Upsert a batch in file order, one transaction for the whole batch.
    /// Later rows win on duplicate sku / 批量写入，重复sku后行覆盖前行
    pub async fn upsert_batch(&self, inputs: &[ProductInput]) -> Result<u64, CatalogError> {
        let mut tx = self.pool.begin().await?;
        for input in inputs {
            Self::upsert_in_tx(&mut tx, input).await?;
        }
        tx.commit().await?;
        Ok(inputs.len() as u64)
    }

    async fn upsert_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        input: &ProductInput,
    ) -> Result<(), CatalogError> {
        let now = Utc::now().to_rfc3339();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (
                sku, name, variant_name, manufacturer, manufacturer_number,
                product_group, category, description, image_url, active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(sku) DO UPDATE SET
                name = excluded.name,
                variant_name = excluded.variant_name,
                manufacturer = excluded.manufacturer,
                manufacturer_number = excluded.manufacturer_number,
                product_group = excluded.product_group,
                category = excluded.category,
                description = excluded.description,
                image_url = excluded.image_url,
                active = excluded.active,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.variant_name)
        .bind(&input.manufacturer)
        .bind(&input.manufacturer_number)
        .bind(&input.product_group)
        .bind(&input.category)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(input.active)
        .bind(&now)
        .bind(&now)
        .fetch_one(&mut **tx)
        .await?;

        let document = SearchDocument::from_input(input);
        Self::write_index_row(tx, id, &document).await?;

        Ok(())
    }

    /// Replace the FTS row for one product / 重写一条索引
    async fn write_index_row(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        document: &SearchDocument,
    ) -> Result<(), CatalogError> {
        sqlx::query("DELETE FROM products_fts WHERE rowid = ?")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "INSERT INTO products_fts (rowid, title_text, brand_text, sku_text, body_text) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&document.title_text)
        .bind(&document.brand_text)
        .bind(&document.sku_text)
        .bind(&document.body_text)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Rebuild the whole search index from the products table / 全量重建索引
    ///
    /// Inactive rows are indexed too; visibility is enforced at query time,
    /// the index itself is a pure function of the stored fields.
    pub async fn rebuild_search_index(&self) -> Result<u64, CatalogError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM products_fts")
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {} FROM products p", PRODUCT_COLUMNS);
        let products: Vec<Product> = sqlx::query_as(&sql).fetch_all(&mut *tx).await?;

        for product in &products {
            let document = SearchDocument::from_product(product);
            Self::write_index_row(&mut tx, product.id, &document).await?;
        }

        tx.commit().await?;

        tracing::info!("Search index rebuilt: {} products", products.len());
        Ok(products.len() as u64)
    }
}

#[async_trait]
impl CatalogRead for CatalogStore {
    async fn query_active_products(&self, query: &SqlQuery) -> Result<Vec<Product>, CatalogError> {
        // bind values in placeholder order / 按占位符顺序绑定
        let mut q = sqlx::query_as::<_, Product>(&query.sql);
        for value in &query.binds {
            q = match value {
                SqlValue::Text(v) => q.bind(v.clone()),
                SqlValue::Int(v) => q.bind(*v),
            };
        }
        let rows = timeout(self.query_timeout, q.fetch_all(&self.pool)).await??;
        Ok(rows)
    }

    async fn count_active_products(&self, query: &SqlQuery) -> Result<i64, CatalogError> {
        let mut q = sqlx::query_scalar::<_, i64>(&query.sql);
        for value in &query.binds {
            q = match value {
                SqlValue::Text(v) => q.bind(v.clone()),
                SqlValue::Int(v) => q.bind(*v),
            };
        }
        let count = timeout(self.query_timeout, q.fetch_one(&self.pool)).await??;
        Ok(count)
    }

    async fn group_count(&self, query: &SqlQuery) -> Result<Vec<FacetCount>, CatalogError> {
        let mut q = sqlx::query_as::<_, FacetCount>(&query.sql);
        for value in &query.binds {
            q = match value {
                SqlValue::Text(v) => q.bind(v.clone()),
                SqlValue::Int(v) => q.bind(*v),
            };
        }
        let rows = timeout(self.query_timeout, q.fetch_all(&self.pool)).await??;
        Ok(rows)
    }
}
