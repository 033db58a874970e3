//! Product AI Config Model
//!
//! 外部索引协作方的商品级配置，随商品一起创建，一件商品一份。

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// 索引服务的分类提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetGroup {
    UpperBody,
    LowerBody,
    FullBody,
}

impl Default for TargetGroup {
    fn default() -> Self {
        Self::FullBody
    }
}

impl TargetGroup {
    /// 线上协议里的字符串形式
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::FullBody => "full_body",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub product: RecordId,
    #[serde(default)]
    pub target_group: TargetGroup,
    pub last_indexed_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
