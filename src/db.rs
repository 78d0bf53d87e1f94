//! Database schema and migrations / 数据库结构与迁移
//!
//! Owns the products table and the FTS5 search index table. The index is a
//! standalone FTS5 table whose rowid mirrors products.id; its four columns
//! are the weighted text tiers described in [`crate::catalog::fts`] and are
//! written only by the store's write path, inside the same transaction as
//! the row itself / 索引与行同事务写入

use anyhow::Result;
use sqlx::SqlitePool;

/// Tune SQLite for concurrent reads / 并发读取调优
pub async fn apply_pragmas(pool: &SqlitePool) -> Result<()> {
    // WAL mode so readers never block each other / WAL模式，读互不阻塞
    sqlx::query("PRAGMA journal_mode=WAL").execute(pool).await?;

    // Wait on locks instead of failing immediately / 锁等待而非立即失败
    sqlx::query("PRAGMA busy_timeout=5000").execute(pool).await?;

    // NORMAL is durable enough for a bulk-loaded catalog / 批量加载目录足够
    sqlx::query("PRAGMA synchronous=NORMAL").execute(pool).await?;

    Ok(())
}

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            variant_name TEXT,
            manufacturer TEXT NOT NULL,
            manufacturer_number TEXT,
            product_group TEXT,
            category TEXT,
            description TEXT,
            image_url TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Facet grouping and the no-text listing order hit these / 分面与列表排序索引
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_manufacturer ON products(active, manufacturer)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_products_category ON products(active, manufacturer, category)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_name ON products(name COLLATE NOCASE)")
        .execute(pool)
        .await?;

    // Weighted text index: four tiers, porter stemming, diacritic folding,
    // rowid = products.id / 四层加权全文索引
    sqlx::query(
        r#"
        CREATE VIRTUAL TABLE IF NOT EXISTS products_fts USING fts5(
            title_text,
            brand_text,
            sku_text,
            body_text,
            tokenize = 'porter unicode61 remove_diacritics 2'
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migration completed");

    Ok(())
}
