//! 变体服务 - 变体生命周期与组合生成
//!
//! 变体键唯一性全部交给唯一索引裁决，服务层只在单次请求内预查重。
//! 键冲突时数据库拒绝写入，文件侧回滚，两边都保持原状。

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use surrealdb::RecordId;
use tracing::warn;

use crate::catalog::{Combination, CombinationAxis, canonical_key, generate_combinations};
use crate::core::{Actor, AppError, AppResult};
use crate::db::models::{
    Attribute, AttributeValue, ProductVariant, TargetGroup, VariantPair, VariantSpec,
    VariantUpdate,
};
use crate::db::repository::{
    AiConfigRepository, AttributeRepository, AttributeValueRepository, ProductRepository,
    RepoError, VariantRepository,
};
use crate::db::{Database, new_id};
use crate::services::{
    FileStore, IndexEvent, IndexerService, StagedFileTransaction, discard_staged_uploads,
    validate_pairs,
};
use crate::utils::now_millis;

/// 变体部分更新请求
///
/// `image` 的三态：`None` 保持现图，`Some("")` 删除现图，
/// `Some(path)` 用上传层已暂存的新图替换
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantUpdateInput {
    pub attributes: Option<Vec<VariantPair>>,
    pub stock: Option<i64>,
    pub price_adjustment: Option<i64>,
    pub image: Option<String>,
}

/// "加轴" 视图里的一个值及其占用状态
#[derive(Debug, Clone)]
pub struct ValueUsage {
    pub value: AttributeValue,
    pub is_used: bool,
}

/// 商品变体当前用到的一个属性及店铺可见的值
#[derive(Debug, Clone)]
pub struct AttributeUsage {
    pub attribute: Attribute,
    pub values: Vec<ValueUsage>,
}

#[derive(Clone)]
pub struct VariantService {
    db: Database,
    files: FileStore,
    indexer: IndexerService,
    products: ProductRepository,
    variants: VariantRepository,
    attributes: AttributeRepository,
    values: AttributeValueRepository,
    ai: AiConfigRepository,
}

impl VariantService {
    pub fn new(db: Database, files: FileStore, indexer: IndexerService) -> Self {
        let handle = db.inner().clone();
        Self {
            products: ProductRepository::new(handle.clone()),
            variants: VariantRepository::new(handle.clone()),
            attributes: AttributeRepository::new(handle.clone()),
            values: AttributeValueRepository::new(handle.clone()),
            ai: AiConfigRepository::new(handle),
            db,
            files,
            indexer,
        }
    }

    pub async fn list_by_product(&self, product: &RecordId) -> AppResult<Vec<ProductVariant>> {
        Ok(self.variants.find_by_product(product).await?)
    }

    pub async fn get_variant(&self, id: &RecordId) -> AppResult<ProductVariant> {
        Ok(self.variants.get(id).await?)
    }

    /// 为已有商品批量创建变体，单事务
    pub async fn create_variants(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        specs: Vec<VariantSpec>,
    ) -> AppResult<Vec<ProductVariant>> {
        let staged: Vec<String> = specs.iter().filter_map(|s| s.image.clone()).collect();
        match self.create_variants_tx(product_id, actor, specs).await {
            Ok(created) => {
                self.dispatch_variant_index(product_id, &created).await;
                Ok(created)
            }
            Err(e) => {
                discard_staged_uploads(&self.files, &staged).await;
                Err(e)
            }
        }
    }

    async fn create_variants_tx(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        specs: Vec<VariantSpec>,
    ) -> AppResult<Vec<ProductVariant>> {
        if specs.is_empty() {
            return Err(AppError::validation("no variants supplied"));
        }
        let product = self.products.get(product_id).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }

        let now = now_millis();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut variant_ids: Vec<RecordId> = Vec::with_capacity(specs.len());
        let mut variant_docs: Vec<ProductVariant> = Vec::with_capacity(specs.len());
        for spec in &specs {
            validate_pairs(&self.values, &spec.attributes).await?;
            if let Some(stock) = spec.stock
                && stock < 0
            {
                return Err(AppError::validation("stock cannot be negative"));
            }
            let variant_key = canonical_key(&spec.attributes);
            if !seen_keys.insert(variant_key.clone()) {
                return Err(AppError::conflict(format!(
                    "duplicate variant key in request: {variant_key}"
                )));
            }
            variant_ids.push(new_id("product_variant"));
            variant_docs.push(ProductVariant {
                id: None,
                product: product_id.clone(),
                variant_key,
                attributes: spec.attributes.clone(),
                stock: spec.stock.unwrap_or(0),
                image: spec.image.clone().unwrap_or_default(),
                price_adjustment: spec.price_adjustment.unwrap_or(0),
                created_at: now,
                updated_at: now,
            });
        }

        let mut statements = String::from("BEGIN TRANSACTION;");
        for idx in 0..variant_docs.len() {
            statements.push_str(&format!(" CREATE $variant_id_{idx} CONTENT $variant_{idx};"));
        }
        statements.push_str(" COMMIT TRANSACTION;");

        let mut query = self.db.inner().query(statements);
        for (idx, (variant_id, doc)) in variant_ids.iter().zip(&variant_docs).enumerate() {
            query = query
                .bind((format!("variant_id_{idx}"), variant_id.clone()))
                .bind((format!("variant_{idx}"), doc.clone()));
        }

        query
            .await
            .map_err(RepoError::from)?
            .check()
            .map_err(RepoError::from)?;

        let mut created = variant_docs;
        for (doc, id) in created.iter_mut().zip(variant_ids) {
            doc.id = Some(id);
        }
        Ok(created)
    }

    /// 部分更新一个变体
    ///
    /// pair 集合变化会重算变体键；新键撞上兄弟变体时两边都不动
    pub async fn update_variant(
        &self,
        variant_id: &RecordId,
        actor: &Actor,
        input: VariantUpdateInput,
    ) -> AppResult<ProductVariant> {
        let uploads: Vec<String> = input
            .image
            .iter()
            .filter(|path| !path.is_empty())
            .cloned()
            .collect();
        match self.update_variant_inner(variant_id, actor, input).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                // 与在用图同路径的 "上传" 不能删
                let current = self
                    .variants
                    .find_by_id(variant_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|v| v.image);
                let discard: Vec<String> = uploads
                    .into_iter()
                    .filter(|path| Some(path) != current.as_ref())
                    .collect();
                discard_staged_uploads(&self.files, &discard).await;
                Err(e)
            }
        }
    }

    async fn update_variant_inner(
        &self,
        variant_id: &RecordId,
        actor: &Actor,
        input: VariantUpdateInput,
    ) -> AppResult<ProductVariant> {
        let variant = self.variants.get(variant_id).await?;
        let product = self.products.get(&variant.product).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }
        if let Some(stock) = input.stock
            && stock < 0
        {
            return Err(AppError::validation("stock cannot be negative"));
        }

        let mut patch = VariantUpdate {
            stock: input.stock,
            price_adjustment: input.price_adjustment,
            ..VariantUpdate::default()
        };
        if let Some(pairs) = input.attributes {
            validate_pairs(&self.values, &pairs).await?;
            let new_key = canonical_key(&pairs);
            if new_key != variant.variant_key {
                patch.variant_key = Some(new_key);
            }
            patch.attributes = Some(pairs);
        }

        let mut removals: Vec<String> = Vec::new();
        let mut additions: Vec<String> = Vec::new();
        match &input.image {
            None => {}
            Some(path) if path.is_empty() => {
                if !variant.image.is_empty() {
                    removals.push(variant.image.clone());
                }
                patch.image = Some(String::new());
            }
            // 重复提交当前路径是 no-op，不能让 abort 删掉在用文件
            Some(path) if *path == variant.image => {}
            Some(path) => {
                if !variant.image.is_empty() {
                    removals.push(variant.image.clone());
                }
                additions.push(path.clone());
                patch.image = Some(path.clone());
            }
        }

        let staged = StagedFileTransaction::stage(&self.files, &removals, &additions).await?;

        match self.variants.update(variant_id, patch).await {
            Ok(updated) => {
                staged.commit().await;
                if !removals.is_empty() {
                    self.indexer.enqueue(IndexEvent::RemoveBatch {
                        product: variant.product.clone(),
                        images: removals,
                    });
                }
                for image in additions {
                    let target_group = self.target_group(&variant.product).await;
                    self.indexer.enqueue(IndexEvent::Index {
                        product: variant.product.clone(),
                        image,
                        target_group,
                    });
                    if let Err(e) = self.ai.touch_indexed(&variant.product).await {
                        warn!(
                            "Failed to record index timestamp for {}: {}",
                            variant.product, e
                        );
                    }
                }
                Ok(updated)
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    /// 删除一个变体及其图片
    pub async fn delete_variant(&self, variant_id: &RecordId, actor: &Actor) -> AppResult<()> {
        let variant = self.variants.get(variant_id).await?;
        let product = self.products.get(&variant.product).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }

        let removals: Vec<String> = if variant.image.is_empty() {
            vec![]
        } else {
            vec![variant.image.clone()]
        };
        let staged = StagedFileTransaction::stage(&self.files, &removals, &[]).await?;

        match self.variants.delete(variant_id).await {
            Ok(()) => {
                staged.commit().await;
                if !removals.is_empty() {
                    self.indexer.enqueue(IndexEvent::RemoveBatch {
                        product: variant.product.clone(),
                        images: removals,
                    });
                }
                Ok(())
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    /// 绝对库存设置 (负数拒绝)
    pub async fn set_stock(
        &self,
        variant_id: &RecordId,
        actor: &Actor,
        stock: i64,
    ) -> AppResult<ProductVariant> {
        if stock < 0 {
            return Err(AppError::validation("stock cannot be negative"));
        }
        self.check_variant_owner(variant_id, actor).await?;
        Ok(self.variants.set_stock(variant_id, stock).await?)
    }

    /// 库存增加 n
    pub async fn increment_stock(
        &self,
        variant_id: &RecordId,
        actor: &Actor,
        n: i64,
    ) -> AppResult<ProductVariant> {
        if n < 0 {
            return Err(AppError::validation("increment cannot be negative"));
        }
        self.check_variant_owner(variant_id, actor).await?;
        Ok(self.variants.increment_stock(variant_id, n).await?)
    }

    /// 库存减少 n，越过零时夹到零
    pub async fn decrement_stock(
        &self,
        variant_id: &RecordId,
        actor: &Actor,
        n: i64,
    ) -> AppResult<ProductVariant> {
        if n < 0 {
            return Err(AppError::validation("decrement cannot be negative"));
        }
        self.check_variant_owner(variant_id, actor).await?;
        Ok(self.variants.decrement_stock(variant_id, n).await?)
    }

    /// 枚举轴列表的全部组合 (纯计算，不写库)
    pub fn generate_combinations(&self, axes: &[CombinationAxis]) -> AppResult<Vec<Combination>> {
        generate_combinations(axes)
    }

    /// 只枚举商品尚未拥有的组合
    ///
    /// 输入轴之外、但现有变体正在使用的属性会以其在用值并入组合空间
    pub async fn generate_new_combinations(
        &self,
        product_id: &RecordId,
        axes: &[CombinationAxis],
    ) -> AppResult<Vec<Combination>> {
        self.products.get(product_id).await?;
        let existing = self.variants.find_by_product(product_id).await?;

        let supplied: HashSet<String> = axes.iter().map(|a| a.attribute.to_string()).collect();
        let mut in_use: HashMap<String, CombinationAxis> = HashMap::new();
        let mut in_use_order: Vec<String> = Vec::new();
        for variant in &existing {
            for pair in &variant.attributes {
                let attr_key = pair.attribute.to_string();
                if supplied.contains(&attr_key) {
                    continue;
                }
                let axis = in_use.entry(attr_key.clone()).or_insert_with(|| {
                    in_use_order.push(attr_key.clone());
                    CombinationAxis {
                        attribute: pair.attribute.clone(),
                        values: vec![],
                    }
                });
                if !axis.values.contains(&pair.value) {
                    axis.values.push(pair.value.clone());
                }
            }
        }

        let mut merged: Vec<CombinationAxis> = axes.to_vec();
        for attr_key in &in_use_order {
            if let Some(axis) = in_use.remove(attr_key) {
                merged.push(axis);
            }
        }

        let combos = generate_combinations(&merged)?;
        let existing_keys: HashSet<String> =
            existing.into_iter().map(|v| v.variant_key).collect();
        Ok(combos
            .into_iter()
            .filter(|c| !existing_keys.contains(&c.variant_key))
            .collect())
    }

    /// "加轴" 视图：商品变体在用的属性 + 店铺可见的值，标注占用状态
    pub async fn attributes_in_use(
        &self,
        product_id: &RecordId,
        shop: &RecordId,
    ) -> AppResult<Vec<AttributeUsage>> {
        let variants = self.variants.find_by_product(product_id).await?;

        let mut used_values: HashSet<String> = HashSet::new();
        let mut attr_ids: Vec<RecordId> = Vec::new();
        for variant in &variants {
            for pair in &variant.attributes {
                used_values.insert(pair.value.to_string());
                if !attr_ids.contains(&pair.attribute) {
                    attr_ids.push(pair.attribute.clone());
                }
            }
        }

        let mut usages = Vec::with_capacity(attr_ids.len());
        for attr_id in attr_ids {
            let attribute = self.attributes.get(&attr_id).await?;
            let visible = self.values.find_visible_for_shop(&attr_id, shop).await?;
            let values = visible
                .into_iter()
                .map(|value| {
                    let is_used = value
                        .id
                        .as_ref()
                        .is_some_and(|id| used_values.contains(&id.to_string()));
                    ValueUsage { value, is_used }
                })
                .collect();
            usages.push(AttributeUsage { attribute, values });
        }
        Ok(usages)
    }

    async fn check_variant_owner(&self, variant_id: &RecordId, actor: &Actor) -> AppResult<()> {
        let variant = self.variants.get(variant_id).await?;
        let product = self.products.get(&variant.product).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }
        Ok(())
    }

    async fn dispatch_variant_index(&self, product_id: &RecordId, created: &[ProductVariant]) {
        let mut any = false;
        let target_group = self.target_group(product_id).await;
        for variant in created {
            if !variant.image.is_empty() {
                self.indexer.enqueue(IndexEvent::Index {
                    product: product_id.clone(),
                    image: variant.image.clone(),
                    target_group,
                });
                any = true;
            }
        }
        if any && let Err(e) = self.ai.touch_indexed(product_id).await {
            warn!("Failed to record index timestamp for {}: {}", product_id, e);
        }
    }

    async fn target_group(&self, product: &RecordId) -> TargetGroup {
        self.ai
            .find_by_product(product)
            .await
            .ok()
            .flatten()
            .map(|c| c.target_group)
            .unwrap_or_default()
    }
}
