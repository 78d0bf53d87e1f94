use prodent_backend::catalog::{CatalogSearch, CatalogStore};

/// Shared application state, built once at startup and injected into every
/// handler. The store owns the pool; the engine holds a clone of the
/// store / 共享应用状态
pub struct AppState {
    /// Write path and detail lookups / 写入与详情查询
    pub store: CatalogStore,
    /// Read path for listing and search / 列表与搜索读取
    pub search: CatalogSearch<CatalogStore>,
}

impl AppState {
    pub fn new(store: CatalogStore) -> Self {
        let search = CatalogSearch::new(store.clone());
        Self { store, search }
    }
}
