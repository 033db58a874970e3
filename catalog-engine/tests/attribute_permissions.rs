//! 全局 / 店铺归属规则与覆盖解析

mod common;

use catalog_engine::core::{Actor, AppError};
use catalog_engine::db::models::{AttributeValueCreate, AttributeValueUpdate, ShopOverrideUpsert};

use common::{engine, shop, value_input};

#[tokio::test]
async fn shop_cannot_modify_global_value() {
    let t = engine().await;
    let (_, values) = t
        .state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![value_input("Red")])
        .await
        .unwrap();
    let red = values[0].id.clone().unwrap();

    let err = t
        .state
        .attributes
        .update_value(
            &red,
            &Actor::Shop(shop("s1")),
            AttributeValueUpdate {
                value: Some("Crimson".to_string()),
                image: None,
                price_adjustment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    assert_eq!(t.state.attributes.get_value(&red).await.unwrap().value, "Red");
}

#[tokio::test]
async fn rejected_value_update_keeps_a_resubmitted_current_image() {
    let t = engine().await;
    t.seed_upload("/uploads/values/red.png").await;
    let (_, values) = t
        .state
        .attributes
        .create_attribute(
            &Actor::Platform,
            "Color",
            vec![AttributeValueCreate {
                value: "Red".to_string(),
                image: Some("/uploads/values/red.png".to_string()),
                price_adjustment: None,
            }],
        )
        .await
        .unwrap();
    let red = values[0].id.clone().unwrap();

    // 校验失败 + 当前图片原样重新提交：清理不能碰在用文件
    let err = t
        .state
        .attributes
        .update_value(
            &red,
            &Actor::Platform,
            AttributeValueUpdate {
                value: Some("  ".to_string()),
                image: Some("/uploads/values/red.png".to_string()),
                price_adjustment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(t.state.files.exists("/uploads/values/red.png").await);
    let unchanged = t.state.attributes.get_value(&red).await.unwrap();
    assert_eq!(unchanged.image, "/uploads/values/red.png");
}

#[tokio::test]
async fn platform_cannot_modify_shop_attribute() {
    let t = engine().await;
    let (attribute, _) = t
        .state
        .attributes
        .create_attribute(&Actor::Shop(shop("s1")), "Material", vec![])
        .await
        .unwrap();
    let id = attribute.id.unwrap();

    let err = t
        .state
        .attributes
        .rename_attribute(&id, &Actor::Platform, "Fabric")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}

#[tokio::test]
async fn shop_attaches_own_value_to_global_attribute() {
    let t = engine().await;
    let shop_id = shop("s1");
    let (color, _) = t
        .state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![value_input("Red")])
        .await
        .unwrap();
    let color_id = color.id.unwrap();

    let attached = t
        .state
        .attributes
        .add_values(&color_id, &Actor::Shop(shop_id.clone()), vec![value_input("Neon")])
        .await
        .unwrap();
    assert_eq!(attached[0].shop.as_ref(), Some(&shop_id));

    // 店铺值只出现在自己店铺的视图里
    let platform_view = t.state.attributes.list_for_platform().await.unwrap();
    let color_entry = platform_view
        .iter()
        .find(|e| e.attribute.label == "Color")
        .unwrap();
    assert!(color_entry.values.iter().all(|v| v.value != "Neon"));

    let shop_view = t.state.attributes.list_for_shop(&shop_id).await.unwrap();
    let color_entry = shop_view
        .iter()
        .find(|e| e.attribute.label == "Color")
        .unwrap();
    assert!(color_entry.values.iter().any(|v| v.value == "Neon"));

    let other_view = t.state.attributes.list_for_shop(&shop("s2")).await.unwrap();
    let color_entry = other_view
        .iter()
        .find(|e| e.attribute.label == "Color")
        .unwrap();
    assert!(color_entry.values.iter().all(|v| v.value != "Neon"));
}

#[tokio::test]
async fn override_changes_only_own_shops_view() {
    let t = engine().await;
    let shop_id = shop("s1");
    let (color, values) = t
        .state
        .attributes
        .create_attribute(
            &Actor::Platform,
            "Color",
            vec![value_input("Red"), value_input("Blue")],
        )
        .await
        .unwrap();
    let color_id = color.id.unwrap();
    let red = values.iter().find(|v| v.value == "Red").unwrap().id.clone().unwrap();

    t.seed_upload("/uploads/shop/red.png").await;
    t.state
        .attributes
        .upsert_override(
            &Actor::Shop(shop_id.clone()),
            &red,
            ShopOverrideUpsert {
                custom_value: None,
                custom_image: Some("/uploads/shop/red.png".to_string()),
                custom_price_adjustment: None,
                is_active: None,
            },
        )
        .await
        .unwrap();

    let resolved = t
        .state
        .attributes
        .resolve_for_shop(&color_id, &shop_id)
        .await
        .unwrap();
    let red_view = resolved.iter().find(|v| v.value == "Red").unwrap();
    assert_eq!(red_view.image, "/uploads/shop/red.png");
    assert!(red_view.is_overridden);
    let blue_view = resolved.iter().find(|v| v.value == "Blue").unwrap();
    assert!(!blue_view.is_overridden);

    // 别的店铺看到的还是基础值
    let other = t
        .state
        .attributes
        .resolve_for_shop(&color_id, &shop("s2"))
        .await
        .unwrap();
    assert!(other.iter().all(|v| !v.is_overridden));
}

#[tokio::test]
async fn toggling_override_off_restores_base_view() {
    let t = engine().await;
    let shop_id = shop("s1");
    let (color, values) = t
        .state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![value_input("Red")])
        .await
        .unwrap();
    let color_id = color.id.unwrap();
    let red = values[0].id.clone().unwrap();
    let actor = Actor::Shop(shop_id.clone());

    let row = t
        .state
        .attributes
        .upsert_override(
            &actor,
            &red,
            ShopOverrideUpsert {
                custom_value: Some("Rouge".to_string()),
                custom_image: None,
                custom_price_adjustment: None,
                is_active: None,
            },
        )
        .await
        .unwrap();

    t.state
        .attributes
        .toggle_override(&row.id.clone().unwrap(), &actor)
        .await
        .unwrap();

    let resolved = t
        .state
        .attributes
        .resolve_for_shop(&color_id, &shop_id)
        .await
        .unwrap();
    assert_eq!(resolved[0].value, "Red");
    assert!(!resolved[0].is_overridden);
}

#[tokio::test]
async fn shop_cannot_override_its_own_value() {
    let t = engine().await;
    let shop_id = shop("s1");
    let actor = Actor::Shop(shop_id.clone());
    let (_, values) = t
        .state
        .attributes
        .create_attribute(&actor, "Material", vec![value_input("Cotton")])
        .await
        .unwrap();
    let cotton = values[0].id.clone().unwrap();

    let err = t
        .state
        .attributes
        .upsert_override(
            &actor,
            &cotton,
            ShopOverrideUpsert {
                custom_value: Some("Organic Cotton".to_string()),
                custom_image: None,
                custom_price_adjustment: None,
                is_active: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn duplicate_labels_conflict_within_scope_only() {
    let t = engine().await;
    t.state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![])
        .await
        .unwrap();

    let err = t
        .state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![])
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "got: {err}");

    // 店铺作用域可以复用全局的名字
    t.state
        .attributes
        .create_attribute(&Actor::Shop(shop("s1")), "Color", vec![])
        .await
        .unwrap();
}

#[tokio::test]
async fn toggle_attribute_cascades_to_values() {
    let t = engine().await;
    let (color, values) = t
        .state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![value_input("Red")])
        .await
        .unwrap();
    let color_id = color.id.unwrap();
    let red = values[0].id.clone().unwrap();

    let toggled = t
        .state
        .attributes
        .toggle_attribute(&color_id, &Actor::Platform)
        .await
        .unwrap();
    assert!(!toggled.is_active);
    assert!(!t.state.attributes.get_value(&red).await.unwrap().is_active);
}
