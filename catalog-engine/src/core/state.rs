//! 引擎状态 - 持有所有服务的单例引用
//!
//! `EngineState` 把配置、数据库、文件存储、索引通知和三个业务服务
//! 装配在一起。所有字段都是浅拷贝友好的 (内部 Arc / Clone)。

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::{AppResult, Config};
use crate::db::Database;
use crate::services::indexer::{HttpImageIndexer, ImageIndexer};
use crate::services::{AttributeService, FileStore, IndexerService, ProductService, VariantService};

/// 引擎状态
///
/// # 使用示例
///
/// ```ignore
/// let state = EngineState::initialize(Config::from_env()).await?;
/// state.products.create_product(&actor, input).await?;
/// ```
#[derive(Clone)]
pub struct EngineState {
    /// 引擎配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Database,
    /// 上传文件存储
    pub files: FileStore,
    /// 后台索引通知
    pub indexer: IndexerService,
    /// 商品事务协调器
    pub products: ProductService,
    /// 变体生命周期服务
    pub variants: VariantService,
    /// 属性 / 值 / 覆盖服务
    pub attributes: AttributeService,
}

impl EngineState {
    /// 初始化引擎：打开数据库、装配服务，索引协作方走 HTTP 适配器
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let db = Database::open(&config.data_dir).await?;
        let files = FileStore::new(PathBuf::from(&config.upload_dir));
        let http = HttpImageIndexer::new(&config.indexer_url, files.clone());
        Self::assemble(config, db, files, Arc::new(http))
    }

    /// 使用注入的索引实现装配引擎 (测试 / 替换适配器)
    pub fn assemble(
        config: Config,
        db: Database,
        files: FileStore,
        indexer: Arc<dyn ImageIndexer>,
    ) -> AppResult<Self> {
        let indexer = IndexerService::new(indexer);
        let products = ProductService::new(db.clone(), files.clone(), indexer.clone());
        let variants = VariantService::new(db.clone(), files.clone(), indexer.clone());
        let attributes = AttributeService::new(db.clone(), files.clone());

        tracing::info!(
            upload_dir = %config.upload_dir,
            environment = %config.environment,
            "Catalog engine assembled"
        );

        Ok(Self {
            config,
            db,
            files,
            indexer,
            products,
            variants,
            attributes,
        })
    }
}
