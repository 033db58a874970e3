//! Attribute Value Model
//!
//! 值可以是全局的 (shop 为空，挂在全局属性下)，也可以是店铺贡献的
//! (shop 非空，可挂在全局属性或店铺自己的属性下)。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::default_true;

pub type AttributeValueId = RecordId;

/// Attribute value model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttributeValueId>,
    /// Record link to owning attribute
    pub attribute: RecordId,
    /// 展示文本，如 "Red" / "M"
    pub value: String,
    /// 贡献店铺 (全局值为空)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<RecordId>,
    #[serde(default)]
    pub image: String,
    /// 相对 base_price 的价格调整 (分，可正可负)
    #[serde(default)]
    pub price_adjustment: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 新值的输入 (归属由服务层根据操作者决定)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeValueCreate {
    pub value: String,
    pub image: Option<String>,
    pub price_adjustment: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeValueUpdate {
    pub value: Option<String>,
    /// Some("") 表示清除图片；Some(path) 表示替换为已暂存的新图
    pub image: Option<String>,
    pub price_adjustment: Option<i64>,
}
