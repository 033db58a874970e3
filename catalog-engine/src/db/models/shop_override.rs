//! Shop Override Model
//!
//! 稀疏表：只有当店铺想定制一个不归自己所有的值的展示 (文本 / 图片 / 价格)
//! 时才存在一行。每个 (shop, attribute_value) 至多一行。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::default_true;

/// Shop-local customization of a shared attribute value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub shop: RecordId,
    pub attribute_value: RecordId,
    /// 覆盖字段均为可选：None 表示保留基础值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_price_adjustment: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// upsert 输入：None 字段不改动已有覆盖
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopOverrideUpsert {
    pub custom_value: Option<String>,
    pub custom_image: Option<String>,
    pub custom_price_adjustment: Option<i64>,
    pub is_active: Option<bool>,
}
