//! Product Variant Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type VariantId = RecordId;

/// (attributeId, valueId) 对，变体身份的最小单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPair {
    pub attribute: RecordId,
    pub value: RecordId,
}

/// Product variant model
///
/// variant_key 由 pair 集合推导 (见 catalog::variant_key)，
/// (product, variant_key) 由唯一索引保证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VariantId>,
    pub product: RecordId,
    pub variant_key: String,
    pub attributes: Vec<VariantPair>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub image: String,
    /// 相对 base_price 的调整 (分，可正可负)
    #[serde(default)]
    pub price_adjustment: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// 变体部分更新 (repository 层，variant_key 已由服务层算好)
#[derive(Debug, Clone, Default)]
pub struct VariantUpdate {
    pub attributes: Option<Vec<VariantPair>>,
    pub variant_key: Option<String>,
    pub stock: Option<i64>,
    pub price_adjustment: Option<i64>,
    pub image: Option<String>,
}

/// 创建变体的请求单元 (key 由引擎计算，不接受外部传入)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSpec {
    pub attributes: Vec<VariantPair>,
    pub stock: Option<i64>,
    pub image: Option<String>,
    pub price_adjustment: Option<i64>,
}
