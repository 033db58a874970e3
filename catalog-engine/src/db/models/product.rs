//! Product Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::default_true;

pub type ProductId = RecordId;

/// Product model
///
/// 商品归属唯一店铺；images 为有序、去重的公共相对路径列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    /// 基础价 (分)，变体价 = base_price + price_adjustment
    pub base_price: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Record link to shop (owner)
    pub shop: RecordId,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 基础信息的部分更新 (不含图片，图片走图片对账流程)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub base_price: Option<i64>,
    pub description: Option<String>,
}
