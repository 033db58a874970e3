//! Database Models

pub mod ai_config;
pub mod attribute;
pub mod attribute_value;
pub mod product;
pub mod shop_override;
pub mod variant;

// Re-exports
pub use ai_config::{AiConfig, TargetGroup};
pub use attribute::Attribute;
pub use attribute_value::{AttributeValue, AttributeValueCreate, AttributeValueUpdate};
pub use product::{Product, ProductUpdate};
pub use shop_override::{ShopOverride, ShopOverrideUpsert};
pub use variant::{ProductVariant, VariantPair, VariantSpec, VariantUpdate};

pub(crate) fn default_true() -> bool {
    true
}
