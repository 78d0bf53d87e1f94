//! Catalog search module - query construction, execution and pagination / 目录搜索模块
//!
//! Architecture principles / 架构原则：
//! - query builder is pure: request in, parameterized SQL out, no I/O
//! - store executes rendered queries and owns schema + index consistency
//! - engine orchestrates one result query plus the facet count queries
//! - Call direction: engine → query/store (unidirectional) / 调用方向
//!
//! Index features / 索引特性：
//! - SQLite FTS5 with porter stemming and diacritic folding
//! - Four weighted field tiers ranked via bm25
//! - All user values flow through bind parameters, never into SQL text

pub mod engine;
pub mod error;
pub mod fts;
pub mod pagination;
pub mod query;
pub mod store;

pub use engine::CatalogSearch;
pub use error::CatalogError;
pub use pagination::{PaginationState, PAGE_SIZE};
pub use store::{CatalogRead, CatalogStore};
