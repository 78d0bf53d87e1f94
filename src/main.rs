use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use prodent_backend::catalog::CatalogStore;
use prodent_backend::{config, db};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prodent_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration into the process-wide instance, then work from a
    // read-only snapshot / 配置载入全局实例后取只读快照
    config::init_config().expect("Failed to load configuration");
    let app_config = config::config();
    tracing::info!(
        "Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());

    // The pool bounds concurrent in-flight store queries / 连接池限制并发查询
    let pool = SqlitePoolOptions::new()
        .max_connections(app_config.database.max_connections)
        .acquire_timeout(app_config.get_query_timeout())
        .connect(&database_url)
        .await?;

    db::apply_pragmas(&pool).await?;
    db::run_migrations(&pool).await?;

    let store = CatalogStore::new(pool, app_config.get_query_timeout());
    let state = Arc::new(AppState::new(store));

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/catalog/search", get(api::catalog::search_catalog))
        .route("/api/catalog/products/:sku", get(api::catalog::product_detail))
        .route("/api/admin/catalog/import", post(api::admin::import_catalog))
        .route("/api/admin/catalog/reindex", post(api::admin::reindex_catalog))
        .with_state(state)
        // CSV feeds can be large / CSV数据可能很大
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
