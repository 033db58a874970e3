//! Database Module
//!
//! 嵌入式 SurrealDB。生产环境走 RocksDB，测试走内存引擎。
//! 唯一约束在启动时以 `DEFINE INDEX ... UNIQUE` 声明，
//! 事务内的唯一索引冲突会使整个事务批次中止。

pub mod models;
pub mod repository;

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::core::{AppError, AppResult};

const NAMESPACE: &str = "catalog";
const DATABASE: &str = "catalog";

/// 唯一约束定义
///
/// - 全局属性 label 唯一 / 店铺属性 (label, shop) 唯一
/// - 全局值 (attribute, value) 唯一 / 店铺值 (attribute, value, shop) 唯一
/// - 覆盖 (shop, attribute_value) 唯一
/// - 变体 (product, variant_key) 唯一
/// - AI 配置每个商品一份
const SCHEMA: &str = "
    DEFINE INDEX IF NOT EXISTS attribute_identity ON TABLE attribute FIELDS label, shop UNIQUE;
    DEFINE INDEX IF NOT EXISTS attribute_value_identity ON TABLE attribute_value FIELDS attribute, value, shop UNIQUE;
    DEFINE INDEX IF NOT EXISTS shop_override_identity ON TABLE shop_override FIELDS shop, attribute_value UNIQUE;
    DEFINE INDEX IF NOT EXISTS variant_identity ON TABLE product_variant FIELDS product, variant_key UNIQUE;
    DEFINE INDEX IF NOT EXISTS ai_config_product ON TABLE ai_config FIELDS product UNIQUE;
";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct Database {
    db: Surreal<Db>,
}

impl Database {
    /// 打开 RocksDB 存储并应用 schema
    pub async fn open(path: &str) -> AppResult<Self> {
        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;
        Self::bootstrap(db).await
    }

    /// 打开内存引擎 (测试用)
    pub async fn memory() -> AppResult<Self> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {e}")))?;
        Self::bootstrap(db).await
    }

    async fn bootstrap(db: Surreal<Db>) -> AppResult<Self> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::Database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .map_err(|e| AppError::Database(format!("Failed to apply schema: {e}")))?
            .check()
            .map_err(|e| AppError::Database(format!("Failed to apply schema: {e}")))?;

        tracing::info!("Database ready (unique indexes applied)");
        Ok(Self { db })
    }

    /// 底层数据库句柄
    pub fn inner(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// 生成一条新记录的 id (uuid v4 键)
///
/// 事务批次需要在执行前绑定全部文档内容，因此 id 在客户端生成
pub fn new_id(table: &str) -> RecordId {
    RecordId::from_table_key(table, uuid::Uuid::new_v4().simple().to_string())
}
