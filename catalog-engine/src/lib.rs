//! Catalog Engine - 多租户商品目录一致性引擎
//!
//! # 架构概述
//!
//! 本 crate 实现一个多租户商品目录的核心引擎。商品由共享/店铺属性的
//! 组合生成变体，每个变体携带独立库存、价格调整和图片。引擎的核心不是
//! CRUD，而是让三个独立资源保持一致：
//!
//! - **文档存储** (`db`): 嵌入式 SurrealDB，事务性读写 + 唯一索引
//! - **文件存储** (`services::FileStore`): 路径寻址的上传图片区
//! - **外部索引服务** (`services::indexer`): best-effort 图片索引协作方
//!
//! # 模块结构
//!
//! ```text
//! catalog-engine/src/
//! ├── core/          # 配置、错误、操作者、引擎状态
//! ├── catalog/       # 纯逻辑：变体键、组合生成、覆盖合并、图片对账
//! ├── db/            # 数据库层 (models + repositories)
//! ├── services/      # 事务协调器、文件暂存事务、后台索引通知
//! └── utils/         # 日志等工具
//! ```

pub mod catalog;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Actor, AppError, AppResult, Config, EngineState};
pub use db::Database;
pub use services::{
    AttributeService, FileStore, IndexEvent, IndexerService, ProductService, StagedFileTransaction,
    VariantService,
};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
