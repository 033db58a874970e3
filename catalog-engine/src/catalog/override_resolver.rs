//! Attribute/Value Override Resolver
//!
//! 纯函数：把基础值和店铺覆盖合并成店铺视角的展示值。
//! 唯一索引保证每个 (shop, value) 至多一条激活覆盖，无需决胜规则。

use std::collections::HashMap;

use serde::Serialize;
use surrealdb::RecordId;

use crate::db::models::{AttributeValue, ShopOverride};

/// 店铺视角下的一个属性值
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedValue {
    pub id: RecordId,
    pub attribute: RecordId,
    pub value: String,
    pub image: String,
    pub price_adjustment: i64,
    pub is_active: bool,
    /// 是否命中了激活的覆盖
    pub is_overridden: bool,
}

/// 合并基础值与覆盖
///
/// 每个覆盖字段只在非空时替换对应基础字段；未激活的覆盖被忽略
pub fn resolve(base_values: &[AttributeValue], overrides: &[ShopOverride]) -> Vec<ResolvedValue> {
    let by_value: HashMap<String, &ShopOverride> = overrides
        .iter()
        .filter(|o| o.is_active)
        .map(|o| (o.attribute_value.to_string(), o))
        .collect();

    base_values
        .iter()
        .filter_map(|base| {
            let id = base.id.clone()?;
            let mut resolved = ResolvedValue {
                attribute: base.attribute.clone(),
                value: base.value.clone(),
                image: base.image.clone(),
                price_adjustment: base.price_adjustment,
                is_active: base.is_active,
                is_overridden: false,
                id: id.clone(),
            };

            if let Some(ov) = by_value.get(&id.to_string()) {
                if let Some(custom) = &ov.custom_value {
                    resolved.value = custom.clone();
                }
                if let Some(custom) = &ov.custom_image {
                    resolved.image = custom.clone();
                }
                if let Some(custom) = ov.custom_price_adjustment {
                    resolved.price_adjustment = custom;
                }
                resolved.is_overridden = true;
            }
            Some(resolved)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(key: &str, value: &str, image: &str) -> AttributeValue {
        AttributeValue {
            id: Some(RecordId::from_table_key("attribute_value", key)),
            attribute: RecordId::from_table_key("attribute", "color"),
            value: value.to_string(),
            shop: None,
            image: image.to_string(),
            price_adjustment: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn override_for(key: &str, image: Option<&str>, active: bool) -> ShopOverride {
        ShopOverride {
            id: Some(RecordId::from_table_key("shop_override", key)),
            shop: RecordId::from_table_key("shop", "s1"),
            attribute_value: RecordId::from_table_key("attribute_value", key),
            custom_value: None,
            custom_image: image.map(str::to_string),
            custom_price_adjustment: None,
            is_active: active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_override_replaces_only_non_null_fields() {
        // 全局 Color = {Red, Blue}，店铺只覆盖 Red 的图片
        let values = vec![
            base("red", "Red", "/uploads/attributes/red.png"),
            base("blue", "Blue", "/uploads/attributes/blue.png"),
        ];
        let overrides = vec![override_for("red", Some("/uploads/shop/red.png"), true)];

        let resolved = resolve(&values, &overrides);
        assert_eq!(resolved.len(), 2);

        let red = &resolved[0];
        assert_eq!(red.image, "/uploads/shop/red.png");
        assert_eq!(red.value, "Red", "non-overridden field keeps base value");
        assert!(red.is_overridden);

        let blue = &resolved[1];
        assert_eq!(blue.image, "/uploads/attributes/blue.png");
        assert!(!blue.is_overridden);
    }

    #[test]
    fn test_inactive_override_is_ignored() {
        let values = vec![base("red", "Red", "/uploads/attributes/red.png")];
        let overrides = vec![override_for("red", Some("/uploads/shop/red.png"), false)];

        let resolved = resolve(&values, &overrides);
        assert_eq!(resolved[0].image, "/uploads/attributes/red.png");
        assert!(!resolved[0].is_overridden);
    }

    #[test]
    fn test_price_adjustment_override() {
        let values = vec![base("red", "Red", "")];
        let mut ov = override_for("red", None, true);
        ov.custom_price_adjustment = Some(-150);

        let resolved = resolve(&values, &[ov]);
        assert_eq!(resolved[0].price_adjustment, -150);
        assert!(resolved[0].is_overridden);
    }
}
