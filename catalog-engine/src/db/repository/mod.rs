//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.
//!
//! ID 约定：全部使用 `surrealdb::RecordId` ("table:key" 格式)。
//! 事务批次 (多语句 BEGIN/COMMIT) 由服务层构建；仓库层只提供
//! 单语句的原子读写。

pub mod ai_config;
pub mod attribute;
pub mod attribute_value;
pub mod product;
pub mod shop_override;
pub mod variant;

// Re-exports
pub use ai_config::AiConfigRepository;
pub use attribute::AttributeRepository;
pub use attribute_value::AttributeValueRepository;
pub use product::ProductRepository;
pub use shop_override::OverrideRepository;
pub use variant::VariantRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // 唯一索引冲突: "Database index `..` already contains .."
        if msg.contains("already contains") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
