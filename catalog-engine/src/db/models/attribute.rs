//! Attribute Model
//!
//! 属性只是一个命名轴 (如 Color / Size)，值单独存放在 attribute_value 表。
//! 全局属性 shop 为空；店铺属性 shop 指向所属店铺。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::default_true;

pub type AttributeId = RecordId;

/// Attribute model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttributeId>,
    pub label: String,
    /// true = 全系统共享，仅平台可变更
    #[serde(default)]
    pub is_global: bool,
    /// 所属店铺 (全局属性为空)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<RecordId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
