//! 纯目录逻辑 - 无 I/O，全部可单测
//!
//! - [`variant_key`]: 变体键推导与组合枚举
//! - [`override_resolver`]: 店铺覆盖合并
//! - [`image_plan`]: 图片集合对账 (replace / add / keep)

pub mod image_plan;
pub mod override_resolver;
pub mod variant_key;

pub use image_plan::{ImagePlan, ImageUpdateMode, reconcile};
pub use override_resolver::{ResolvedValue, resolve};
pub use variant_key::{Combination, CombinationAxis, canonical_key, generate_combinations};
