//! 创建失败时三套存储保持原状：文档回滚、暂存文件删除、索引零事件

mod common;

use catalog_engine::core::{Actor, AppError};
use catalog_engine::db::models::{VariantPair, VariantSpec};
use catalog_engine::services::CreateProductInput;
use surrealdb::RecordId;

use common::{engine, shop, value_input};

fn spec(pairs: Vec<VariantPair>, image: Option<&str>) -> VariantSpec {
    VariantSpec {
        attributes: pairs,
        stock: Some(5),
        image: image.map(str::to_string),
        price_adjustment: None,
    }
}

#[tokio::test]
async fn failed_create_leaves_no_documents_or_files() {
    let t = engine().await;
    let shop_id = shop("s1");
    let actor = Actor::Shop(shop_id.clone());

    t.seed_upload("/uploads/products/main.png").await;
    t.seed_upload("/uploads/variants/v1.png").await;

    // pair 指向不存在的值
    let bogus = VariantPair {
        attribute: RecordId::from_table_key("attribute", "ghost"),
        value: RecordId::from_table_key("attribute_value", "ghost"),
    };
    let input = CreateProductInput {
        shop: shop_id.clone(),
        name: "Jacket".to_string(),
        base_price: 4999,
        description: String::new(),
        images: vec!["/uploads/products/main.png".to_string()],
        target_group: Default::default(),
        variants: vec![spec(vec![bogus], Some("/uploads/variants/v1.png"))],
    };

    let err = t.state.products.create_product(&actor, input).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got: {err}");

    assert!(t.state.products.list_by_shop(&shop_id).await.unwrap().is_empty());
    assert!(!t.state.files.exists("/uploads/products/main.png").await);
    assert!(!t.state.files.exists("/uploads/variants/v1.png").await);
    assert!(t.indexer_log.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_key_within_request_is_conflict() {
    let t = engine().await;
    let shop_id = shop("s1");
    let actor = Actor::Shop(shop_id.clone());

    let (color, values) = t
        .state
        .attributes
        .create_attribute(&Actor::Platform, "Color", vec![value_input("Red")])
        .await
        .unwrap();
    let color_id = color.id.unwrap();
    let red = values[0].id.clone().unwrap();

    let pair = VariantPair {
        attribute: color_id,
        value: red,
    };
    let input = CreateProductInput {
        shop: shop_id.clone(),
        name: "Jacket".to_string(),
        base_price: 4999,
        description: String::new(),
        images: vec![],
        target_group: Default::default(),
        variants: vec![spec(vec![pair.clone()], None), spec(vec![pair], None)],
    };

    let err = t.state.products.create_product(&actor, input).await.unwrap_err();
    assert!(err.is_conflict(), "got: {err}");
    assert!(t.state.products.list_by_shop(&shop_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn bulk_create_conflicting_with_existing_variant_rolls_back() {
    let t = engine().await;
    let shop_id = shop("s1");
    let actor = Actor::Shop(shop_id.clone());

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
    let blue = values.iter().find(|v| v.value == "Blue").unwrap().id.clone().unwrap();

    let red_pair = VariantPair {
        attribute: color_id.clone(),
        value: red,
    };
    let blue_pair = VariantPair {
        attribute: color_id,
        value: blue,
    };

    let input = CreateProductInput {
        shop: shop_id.clone(),
        name: "Jacket".to_string(),
        base_price: 4999,
        description: String::new(),
        images: vec![],
        target_group: Default::default(),
        variants: vec![spec(vec![red_pair.clone()], None)],
    };
    let created = t.state.products.create_product(&actor, input).await.unwrap();
    let product_id = created.product.id.clone().unwrap();

    // 批次里混入已存在的键：全批拒绝，蓝色也不落库，暂存图删除
    t.seed_upload("/uploads/variants/blue.png").await;
    let err = t
        .state
        .variants
        .create_variants(
            &product_id,
            &actor,
            vec![
                spec(vec![blue_pair], Some("/uploads/variants/blue.png")),
                spec(vec![red_pair], None),
            ],
        )
        .await
        .unwrap_err();
    assert!(err.is_conflict(), "got: {err}");

    let variants = t.state.variants.list_by_product(&product_id).await.unwrap();
    assert_eq!(variants.len(), 1, "only the original variant survives");
    assert!(!t.state.files.exists("/uploads/variants/blue.png").await);
}
