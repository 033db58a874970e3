//! 商品服务 - 跨存储事务协调
//!
//! 三套存储的一致性策略：
//! 文档变更整批进数据库事务；文件走 备份 → 提交/回滚；
//! 索引只在数据库提交后异步派发，失败不回滚任何东西。

use std::collections::HashSet;

use serde::Deserialize;
use surrealdb::RecordId;
use tracing::warn;
use validator::Validate;

use crate::catalog::{ImageUpdateMode, canonical_key, reconcile};
use crate::core::{Actor, AppError, AppResult};
use crate::db::models::{
    AiConfig, Product, ProductUpdate, ProductVariant, TargetGroup, VariantSpec,
};
use crate::db::repository::{
    AiConfigRepository, AttributeValueRepository, ProductRepository, RepoError, VariantRepository,
};
use crate::db::{Database, new_id};
use crate::services::{
    FileStore, IndexEvent, IndexerService, StagedFileTransaction, discard_staged_uploads,
    validate_pairs,
};
use crate::utils::now_millis;

/// 创建商品的完整请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    pub shop: RecordId,
    #[validate(length(min = 1, max = 200, message = "name must be 1..=200 chars"))]
    pub name: String,
    #[validate(range(min = 0, message = "base_price cannot be negative"))]
    pub base_price: i64,
    #[serde(default)]
    pub description: String,
    /// 上传层已暂存的商品图片
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub target_group: TargetGroup,
    /// 随商品一起创建的初始变体
    #[serde(default)]
    pub variants: Vec<VariantSpec>,
}

/// 创建成功后的完整结果
#[derive(Debug, Clone)]
pub struct CreatedProduct {
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    pub ai_config: AiConfig,
}

#[derive(Clone)]
pub struct ProductService {
    db: Database,
    files: FileStore,
    indexer: IndexerService,
    products: ProductRepository,
    variants: VariantRepository,
    values: AttributeValueRepository,
    ai: AiConfigRepository,
}

impl ProductService {
    pub fn new(db: Database, files: FileStore, indexer: IndexerService) -> Self {
        let handle = db.inner().clone();
        Self {
            products: ProductRepository::new(handle.clone()),
            variants: VariantRepository::new(handle.clone()),
            values: AttributeValueRepository::new(handle.clone()),
            ai: AiConfigRepository::new(handle),
            db,
            files,
            indexer,
        }
    }

    pub async fn get_product(&self, id: &RecordId) -> AppResult<Product> {
        Ok(self.products.get(id).await?)
    }

    pub async fn list_by_shop(&self, shop: &RecordId) -> AppResult<Vec<Product>> {
        Ok(self.products.find_by_shop(shop).await?)
    }

    /// 创建商品 + AI 配置 + 初始变体，单事务
    ///
    /// 任何失败都会删掉上传层暂存的全部文件
    pub async fn create_product(
        &self,
        actor: &Actor,
        input: CreateProductInput,
    ) -> AppResult<CreatedProduct> {
        let staged: Vec<String> = input
            .images
            .iter()
            .cloned()
            .chain(input.variants.iter().filter_map(|s| s.image.clone()))
            .collect();

        match self.create_product_tx(actor, input).await {
            Ok(created) => {
                self.dispatch_product_index(&created).await;
                Ok(created)
            }
            Err(e) => {
                discard_staged_uploads(&self.files, &staged).await;
                Err(e)
            }
        }
    }

    async fn create_product_tx(
        &self,
        actor: &Actor,
        input: CreateProductInput,
    ) -> AppResult<CreatedProduct> {
        input.validate()?;
        if !actor.can_manage_shop(&input.shop) {
            return Err(AppError::permission(
                "cannot create products for another shop",
            ));
        }

        let mut images: Vec<String> = Vec::with_capacity(input.images.len());
        for img in &input.images {
            if !images.contains(img) {
                images.push(img.clone());
            }
        }

        let now = now_millis();
        let product_id = new_id("product");
        let product = Product {
            id: None,
            name: input.name.trim().to_string(),
            base_price: input.base_price,
            description: input.description,
            images,
            shop: input.shop,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut variant_ids: Vec<RecordId> = Vec::with_capacity(input.variants.len());
        let mut variant_docs: Vec<ProductVariant> = Vec::with_capacity(input.variants.len());
        for spec in &input.variants {
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

        let ai_id = new_id("ai_config");
        let ai_config = AiConfig {
            id: None,
            product: product_id.clone(),
            target_group: input.target_group,
            last_indexed_at: 0,
            created_at: now,
            updated_at: now,
        };

        let mut statements = String::from("BEGIN TRANSACTION;");
        statements.push_str(" CREATE $product_id CONTENT $product;");
        statements.push_str(" CREATE $ai_id CONTENT $ai;");
        for idx in 0..variant_docs.len() {
            statements.push_str(&format!(" CREATE $variant_id_{idx} CONTENT $variant_{idx};"));
        }
        statements.push_str(" COMMIT TRANSACTION;");

        let mut query = self
            .db
            .inner()
            .query(statements)
            .bind(("product_id", product_id.clone()))
            .bind(("product", product.clone()))
            .bind(("ai_id", ai_id.clone()))
            .bind(("ai", ai_config.clone()));
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

        let mut product = product;
        product.id = Some(product_id);
        let mut ai_config = ai_config;
        ai_config.id = Some(ai_id);
        let mut variants = variant_docs;
        for (doc, id) in variants.iter_mut().zip(variant_ids) {
            doc.id = Some(id);
        }

        Ok(CreatedProduct {
            product,
            variants,
            ai_config,
        })
    }

    async fn dispatch_product_index(&self, created: &CreatedProduct) {
        let Some(product_id) = created.product.id.clone() else {
            return;
        };
        let target_group = created.ai_config.target_group;

        let mut any = false;
        for image in &created.product.images {
            self.indexer.enqueue(IndexEvent::Index {
                product: product_id.clone(),
                image: image.clone(),
                target_group,
            });
            any = true;
        }
        for variant in &created.variants {
            if !variant.image.is_empty() {
                self.indexer.enqueue(IndexEvent::Index {
                    product: product_id.clone(),
                    image: variant.image.clone(),
                    target_group,
                });
                any = true;
            }
        }
        if any && let Err(e) = self.ai.touch_indexed(&product_id).await {
            warn!("Failed to record index timestamp for {}: {}", product_id, e);
        }
    }

    /// 基础字段部分更新
    pub async fn update_basic(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        patch: ProductUpdate,
    ) -> AppResult<Product> {
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(AppError::validation("name cannot be empty"));
        }
        if let Some(price) = patch.base_price
            && price < 0
        {
            return Err(AppError::validation("base_price cannot be negative"));
        }

        let product = self.products.get(product_id).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }
        Ok(self.products.update_basic(product_id, patch).await?)
    }

    /// 激活 / 停用商品
    pub async fn set_active(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        active: bool,
    ) -> AppResult<Product> {
        let product = self.products.get(product_id).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }
        Ok(self.products.set_active(product_id, active).await?)
    }

    /// 更新商品的分类提示
    pub async fn set_target_group(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        target_group: TargetGroup,
    ) -> AppResult<AiConfig> {
        let product = self.products.get(product_id).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }
        Ok(self.ai.set_target_group(product_id, target_group).await?)
    }

    /// 按模式对账并替换商品图片集合
    ///
    /// 数据库更新失败时文件侧完整回滚；失败路径总是清掉暂存的上传文件
    pub async fn update_images(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        mode: ImageUpdateMode,
        keep: Option<Vec<String>>,
        uploaded: Vec<String>,
    ) -> AppResult<Product> {
        match self
            .update_images_inner(product_id, actor, mode, keep, &uploaded)
            .await
        {
            Ok(product) => Ok(product),
            Err(e) => {
                // 与文档在用图同路径的 "上传" 不能删
                let current = self
                    .products
                    .find_by_id(product_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|p| p.images)
                    .unwrap_or_default();
                let discard: Vec<String> = uploaded
                    .into_iter()
                    .filter(|path| !current.contains(path))
                    .collect();
                discard_staged_uploads(&self.files, &discard).await;
                Err(e)
            }
        }
    }

    async fn update_images_inner(
        &self,
        product_id: &RecordId,
        actor: &Actor,
        mode: ImageUpdateMode,
        keep: Option<Vec<String>>,
        uploaded: &[String],
    ) -> AppResult<Product> {
        let product = self.products.get(product_id).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot modify another shop's product"));
        }

        let plan = reconcile(&product.images, mode, keep.as_deref(), uploaded);
        let staged =
            StagedFileTransaction::stage(&self.files, &plan.to_remove, &plan.to_add).await?;

        match self
            .products
            .set_images(product_id, plan.final_images.clone())
            .await
        {
            Ok(updated) => {
                staged.commit().await;
                if !plan.to_remove.is_empty() {
                    self.indexer.enqueue(IndexEvent::RemoveBatch {
                        product: product_id.clone(),
                        images: plan.to_remove.clone(),
                    });
                }
                if !plan.to_add.is_empty() {
                    let target_group = self.target_group(product_id).await;
                    for image in &plan.to_add {
                        self.indexer.enqueue(IndexEvent::Index {
                            product: product_id.clone(),
                            image: image.clone(),
                            target_group,
                        });
                    }
                    if let Err(e) = self.ai.touch_indexed(product_id).await {
                        warn!(
                            "Failed to record index timestamp for {}: {}",
                            product_id, e
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

    /// 删除商品及其变体、AI 配置、全部图片和索引数据
    pub async fn delete_product(&self, product_id: &RecordId, actor: &Actor) -> AppResult<()> {
        let product = self.products.get(product_id).await?;
        if !actor.can_manage_shop(&product.shop) {
            return Err(AppError::permission("cannot delete another shop's product"));
        }

        let variants = self.variants.find_by_product(product_id).await?;
        let mut removals = product.images.clone();
        removals.extend(
            variants
                .iter()
                .filter(|v| !v.image.is_empty())
                .map(|v| v.image.clone()),
        );

        let staged = StagedFileTransaction::stage(&self.files, &removals, &[]).await?;

        let result = self
            .db
            .inner()
            .query(
                "BEGIN TRANSACTION; \
                 DELETE product_variant WHERE product = $product; \
                 DELETE ai_config WHERE product = $product; \
                 DELETE $product; \
                 COMMIT TRANSACTION;",
            )
            .bind(("product", product_id.clone()))
            .await
            .map_err(RepoError::from)
            .and_then(|response| response.check().map_err(RepoError::from));

        match result {
            Ok(_) => {
                staged.commit().await;
                self.indexer.enqueue(IndexEvent::RemoveProduct {
                    product: product_id.clone(),
                });
                Ok(())
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    /// 清空外部索引，维护入口
    ///
    /// 索引侧失败只记日志，对调用方永远非致命
    pub async fn clear_search_index(&self, actor: &Actor) -> AppResult<()> {
        if !actor.is_platform() {
            return Err(AppError::permission("only the platform may clear the index"));
        }
        if let Err(e) = self.indexer.dispatch(IndexEvent::ClearAll).await {
            warn!("Failed to clear the search index: {}", e);
        }
        Ok(())
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
