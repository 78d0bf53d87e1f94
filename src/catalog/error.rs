use thiserror::Error;

/// Catalog failure taxonomy. Zero matches is a normal result, never an error / 目录错误类型
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed request data. Page values are clamped rather than rejected,
    /// so this only fires on inputs the clamping rules cannot repair / 非法请求
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The store could not be reached or a query failed or timed out.
    /// Safe to retry, must never be conflated with an empty result / 存储不可用
    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable(err.into())
    }
}

impl From<tokio::time::error::Elapsed> for CatalogError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::StoreUnavailable(err.into())
    }
}
