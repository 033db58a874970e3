//! 操作者身份
//!
//! 路由 / 令牌解析在引擎之外完成，引擎只接收解析后的身份。

use surrealdb::RecordId;

/// 发起变更的操作者
///
/// - `Platform`: 平台级管理员，唯一可以管理全局属性及其值的角色
/// - `Shop`: 店铺，只能管理归属自己的资源
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    Platform,
    Shop(RecordId),
}

impl Actor {
    /// 是否为平台管理员
    pub fn is_platform(&self) -> bool {
        matches!(self, Actor::Platform)
    }

    /// 店铺操作者的 shop id (平台返回 None)
    pub fn shop_id(&self) -> Option<&RecordId> {
        match self {
            Actor::Platform => None,
            Actor::Shop(id) => Some(id),
        }
    }

    /// 是否可以管理指定店铺的资源 (平台或该店铺本身)
    pub fn can_manage_shop(&self, shop: &RecordId) -> bool {
        match self {
            Actor::Platform => true,
            Actor::Shop(id) => id == shop,
        }
    }
}
