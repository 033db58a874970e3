//! 服务层 - 事务协调与副作用
//!
//! # 服务列表
//!
//! - [`FileStore`] - 上传文件区的路径映射与幂等文件操作
//! - [`StagedFileTransaction`] - 备份 → 提交/回滚 的文件暂存事务
//! - [`IndexerService`] - 外部索引的 fire-and-forget 派发
//! - [`ProductService`] - 商品生命周期的事务协调器
//! - [`VariantService`] - 变体生命周期与组合生成
//! - [`AttributeService`] - 属性 / 值 / 店铺覆盖

pub mod attribute_service;
pub mod file_store;
pub mod indexer;
pub mod product_service;
pub mod staged_files;
pub mod variant_service;

pub use attribute_service::{AttributeService, AttributeWithValues};
pub use file_store::FileStore;
pub use indexer::{HttpImageIndexer, ImageIndexer, IndexEvent, IndexerService, NullIndexer};
pub use product_service::{CreateProductInput, CreatedProduct, ProductService};
pub use staged_files::StagedFileTransaction;
pub use variant_service::{AttributeUsage, ValueUsage, VariantService, VariantUpdateInput};

use std::collections::HashMap;

use surrealdb::RecordId;

use crate::core::{AppError, AppResult};
use crate::db::models::{AttributeValue, VariantPair};
use crate::db::repository::AttributeValueRepository;

/// 校验 pair 集合：每个 valueId 必须存在且确实属于声明的 attributeId
pub(crate) async fn validate_pairs(
    values: &AttributeValueRepository,
    pairs: &[VariantPair],
) -> AppResult<()> {
    if pairs.is_empty() {
        return Err(AppError::validation(
            "variant requires at least one (attribute, value) pair",
        ));
    }

    let ids: Vec<RecordId> = pairs.iter().map(|p| p.value.clone()).collect();
    let found = values.find_by_ids(ids).await?;
    let by_id: HashMap<String, &AttributeValue> = found
        .iter()
        .filter_map(|v| v.id.as_ref().map(|id| (id.to_string(), v)))
        .collect();

    for pair in pairs {
        let Some(value) = by_id.get(&pair.value.to_string()) else {
            return Err(AppError::not_found(format!(
                "Attribute value {} not found",
                pair.value
            )));
        };
        if value.attribute != pair.attribute {
            return Err(AppError::validation(format!(
                "value {} does not belong to attribute {}",
                pair.value, pair.attribute
            )));
        }
    }
    Ok(())
}

/// 失败路径的上传回滚：删除上传层已暂存、但永远不会被文档引用的文件
pub(crate) async fn discard_staged_uploads(files: &FileStore, uploads: &[String]) {
    for path in uploads {
        files.delete_if_exists(path).await;
    }
}
