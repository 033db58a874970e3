//! 属性服务 - 属性 / 值 / 店铺覆盖
//!
//! 归属规则：平台只管理全局属性和全局值；店铺只管理自己的属性和值，
//! 但可以向全局属性挂接店铺值，也可以对非自有值建立覆盖。
//! 越权一律在任何写入前拒绝。

use serde::Serialize;
use surrealdb::RecordId;

use crate::catalog::{ResolvedValue, resolve};
use crate::core::{Actor, AppError, AppResult};
use crate::db::models::{
    Attribute, AttributeValue, AttributeValueCreate, AttributeValueUpdate, ShopOverride,
    ShopOverrideUpsert,
};
use crate::db::repository::{
    AttributeRepository, AttributeValueRepository, OverrideRepository, RepoError,
};
use crate::db::{Database, new_id};
use crate::services::{FileStore, StagedFileTransaction, discard_staged_uploads};
use crate::utils::now_millis;

/// 属性及其值的列表视图
#[derive(Debug, Clone, Serialize)]
pub struct AttributeWithValues {
    pub attribute: Attribute,
    pub values: Vec<AttributeValue>,
}

#[derive(Clone)]
pub struct AttributeService {
    db: Database,
    files: FileStore,
    attributes: AttributeRepository,
    values: AttributeValueRepository,
    overrides: OverrideRepository,
}

impl AttributeService {
    pub fn new(db: Database, files: FileStore) -> Self {
        let handle = db.inner().clone();
        Self {
            attributes: AttributeRepository::new(handle.clone()),
            values: AttributeValueRepository::new(handle.clone()),
            overrides: OverrideRepository::new(handle),
            db,
            files,
        }
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// 创建属性及初始值，单事务；作用域由操作者决定
    pub async fn create_attribute(
        &self,
        actor: &Actor,
        label: &str,
        initial_values: Vec<AttributeValueCreate>,
    ) -> AppResult<(Attribute, Vec<AttributeValue>)> {
        let staged: Vec<String> = initial_values
            .iter()
            .filter_map(|v| v.image.clone())
            .collect();
        match self.create_attribute_tx(actor, label, initial_values).await {
            Ok(result) => Ok(result),
            Err(e) => {
                discard_staged_uploads(&self.files, &staged).await;
                Err(e)
            }
        }
    }

    async fn create_attribute_tx(
        &self,
        actor: &Actor,
        label: &str,
        initial_values: Vec<AttributeValueCreate>,
    ) -> AppResult<(Attribute, Vec<AttributeValue>)> {
        let label = label.trim();
        if label.is_empty() {
            return Err(AppError::validation("label cannot be empty"));
        }

        let (is_global, scope) = match actor {
            Actor::Platform => (true, None),
            Actor::Shop(shop) => (false, Some(shop.clone())),
        };

        let now = now_millis();
        let attr_id = new_id("attribute");
        let attribute = Attribute {
            id: None,
            label: label.to_string(),
            is_global,
            shop: scope.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let value_docs = build_value_docs(&attr_id, &scope, initial_values, now)?;

        let mut statements = String::from("BEGIN TRANSACTION;");
        statements.push_str(" CREATE $attr_id CONTENT $attr;");
        if !value_docs.is_empty() {
            statements.push_str(" INSERT INTO attribute_value $values;");
        }
        statements.push_str(" COMMIT TRANSACTION;");

        let mut query = self
            .db
            .inner()
            .query(statements)
            .bind(("attr_id", attr_id.clone()))
            .bind(("attr", attribute.clone()));
        if !value_docs.is_empty() {
            query = query.bind(("values", value_docs.clone()));
        }

        let mut response = query
            .await
            .map_err(RepoError::from)?
            .check()
            .map_err(RepoError::from)?;

        let created_attrs: Vec<Attribute> = response.take(0).map_err(RepoError::from)?;
        let attribute = created_attrs
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database("attribute creation returned nothing".to_string()))?;
        let values: Vec<AttributeValue> = if value_docs.is_empty() {
            vec![]
        } else {
            response.take(1).map_err(RepoError::from)?
        };

        Ok((attribute, values))
    }

    pub async fn get_attribute(&self, id: &RecordId) -> AppResult<Attribute> {
        Ok(self.attributes.get(id).await?)
    }

    /// 改名；作用域内重名 -> Conflict
    pub async fn rename_attribute(
        &self,
        id: &RecordId,
        actor: &Actor,
        label: &str,
    ) -> AppResult<Attribute> {
        let label = label.trim();
        if label.is_empty() {
            return Err(AppError::validation("label cannot be empty"));
        }
        let attribute = self.attributes.get(id).await?;
        check_attribute_owner(&attribute, actor)?;
        Ok(self.attributes.update_label(id, label.to_string()).await?)
    }

    /// 切换激活状态，级联到该属性的全部值
    pub async fn toggle_attribute(&self, id: &RecordId, actor: &Actor) -> AppResult<Attribute> {
        let attribute = self.attributes.get(id).await?;
        check_attribute_owner(&attribute, actor)?;
        Ok(self
            .attributes
            .set_active_cascade(id, !attribute.is_active)
            .await?)
    }

    /// 删除属性及其全部值和值图片
    pub async fn delete_attribute(&self, id: &RecordId, actor: &Actor) -> AppResult<()> {
        let attribute = self.attributes.get(id).await?;
        check_attribute_owner(&attribute, actor)?;

        let values = self.values.find_by_attribute(id).await?;
        let removals: Vec<String> = values
            .iter()
            .filter(|v| !v.image.is_empty())
            .map(|v| v.image.clone())
            .collect();

        let staged = StagedFileTransaction::stage(&self.files, &removals, &[]).await?;

        let result = self
            .db
            .inner()
            .query(
                "BEGIN TRANSACTION; \
                 DELETE attribute_value WHERE attribute = $attr; \
                 DELETE $attr; \
                 COMMIT TRANSACTION;",
            )
            .bind(("attr", id.clone()))
            .await
            .map_err(RepoError::from)
            .and_then(|response| response.check().map_err(RepoError::from));

        match result {
            Ok(_) => {
                staged.commit().await;
                Ok(())
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    /// 平台列表：全部全局属性及其全局值 (含停用)
    pub async fn list_for_platform(&self) -> AppResult<Vec<AttributeWithValues>> {
        let attributes = self.attributes.find_global().await?;
        let mut result = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let Some(id) = attribute.id.clone() else {
                continue;
            };
            let values = self.values.find_global_by_attribute(&id).await?;
            result.push(AttributeWithValues { attribute, values });
        }
        Ok(result)
    }

    /// 店铺列表：可用全局属性 + 自有属性，各自带店铺可见的值
    pub async fn list_for_shop(&self, shop: &RecordId) -> AppResult<Vec<AttributeWithValues>> {
        let attributes = self.attributes.find_for_shop(shop).await?;
        let mut result = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let Some(id) = attribute.id.clone() else {
                continue;
            };
            let values = self.values.find_visible_for_shop(&id, shop).await?;
            result.push(AttributeWithValues { attribute, values });
        }
        Ok(result)
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// 向属性追加值，作用域跟随操作者
    ///
    /// 店铺可以向全局属性挂接自己的值；平台只能给全局属性加全局值
    pub async fn add_values(
        &self,
        attribute_id: &RecordId,
        actor: &Actor,
        new_values: Vec<AttributeValueCreate>,
    ) -> AppResult<Vec<AttributeValue>> {
        let staged: Vec<String> = new_values.iter().filter_map(|v| v.image.clone()).collect();
        match self.add_values_inner(attribute_id, actor, new_values).await {
            Ok(values) => Ok(values),
            Err(e) => {
                discard_staged_uploads(&self.files, &staged).await;
                Err(e)
            }
        }
    }

    async fn add_values_inner(
        &self,
        attribute_id: &RecordId,
        actor: &Actor,
        new_values: Vec<AttributeValueCreate>,
    ) -> AppResult<Vec<AttributeValue>> {
        if new_values.is_empty() {
            return Err(AppError::validation("no values supplied"));
        }
        let attribute = self.attributes.get(attribute_id).await?;
        let scope = match actor {
            Actor::Platform => {
                if !attribute.is_global {
                    return Err(AppError::permission(
                        "the platform only manages global attributes",
                    ));
                }
                None
            }
            Actor::Shop(shop) => {
                if !attribute.is_global && attribute.shop.as_ref() != Some(shop) {
                    return Err(AppError::permission(
                        "cannot attach values to another shop's attribute",
                    ));
                }
                Some(shop.clone())
            }
        };

        let docs = build_value_docs(attribute_id, &scope, new_values, now_millis())?;
        Ok(self.values.insert_many(docs).await?)
    }

    pub async fn get_value(&self, id: &RecordId) -> AppResult<AttributeValue> {
        Ok(self.values.get(id).await?)
    }

    /// 部分更新一个值
    ///
    /// `image` 的三态与变体一致：None 保持，空串删除，路径替换
    pub async fn update_value(
        &self,
        value_id: &RecordId,
        actor: &Actor,
        patch: AttributeValueUpdate,
    ) -> AppResult<AttributeValue> {
        let uploads: Vec<String> = patch
            .image
            .iter()
            .filter(|path| !path.is_empty())
            .cloned()
            .collect();
        match self.update_value_inner(value_id, actor, patch).await {
            Ok(value) => Ok(value),
            Err(e) => {
                // 与在用图同路径的 "上传" 不能删
                let current = self
                    .values
                    .find_by_id(value_id)
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

    async fn update_value_inner(
        &self,
        value_id: &RecordId,
        actor: &Actor,
        patch: AttributeValueUpdate,
    ) -> AppResult<AttributeValue> {
        let value = self.values.get(value_id).await?;
        check_value_owner(&value, actor)?;
        if let Some(text) = &patch.value
            && text.trim().is_empty()
        {
            return Err(AppError::validation("value text cannot be empty"));
        }

        let mut removals: Vec<String> = Vec::new();
        let mut additions: Vec<String> = Vec::new();
        // 重复提交当前路径是 no-op，不能让 abort 删掉在用文件
        if let Some(new_image) = &patch.image
            && *new_image != value.image
        {
            if !value.image.is_empty() {
                removals.push(value.image.clone());
            }
            if !new_image.is_empty() {
                additions.push(new_image.clone());
            }
        }

        let staged = StagedFileTransaction::stage(&self.files, &removals, &additions).await?;

        match self.values.update(value_id, patch).await {
            Ok(updated) => {
                staged.commit().await;
                Ok(updated)
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    /// 激活 / 停用一个值
    pub async fn toggle_value(&self, value_id: &RecordId, actor: &Actor) -> AppResult<AttributeValue> {
        let value = self.values.get(value_id).await?;
        check_value_owner(&value, actor)?;
        Ok(self.values.set_active(value_id, !value.is_active).await?)
    }

    /// 删除一个值及其图片
    pub async fn delete_value(&self, value_id: &RecordId, actor: &Actor) -> AppResult<()> {
        let value = self.values.get(value_id).await?;
        check_value_owner(&value, actor)?;

        let removals: Vec<String> = if value.image.is_empty() {
            vec![]
        } else {
            vec![value.image.clone()]
        };
        let staged = StagedFileTransaction::stage(&self.files, &removals, &[]).await?;

        match self.values.delete(value_id).await {
            Ok(()) => {
                staged.commit().await;
                Ok(())
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Shop overrides
    // =========================================================================

    /// 建立或更新店铺对某个值的覆盖 ((shop, value) 至多一条)
    pub async fn upsert_override(
        &self,
        actor: &Actor,
        value_id: &RecordId,
        data: ShopOverrideUpsert,
    ) -> AppResult<ShopOverride> {
        let uploads: Vec<String> = data.custom_image.iter().cloned().collect();
        match self.upsert_override_inner(actor, value_id, data).await {
            Ok(row) => Ok(row),
            Err(e) => {
                let current = match actor.shop_id() {
                    Some(shop) => self
                        .overrides
                        .find_by_shop_value(shop, value_id)
                        .await
                        .ok()
                        .flatten()
                        .and_then(|o| o.custom_image),
                    None => None,
                };
                self.discard_foreign_uploads(uploads, current).await;
                Err(e)
            }
        }
    }

    async fn upsert_override_inner(
        &self,
        actor: &Actor,
        value_id: &RecordId,
        data: ShopOverrideUpsert,
    ) -> AppResult<ShopOverride> {
        let Some(shop) = actor.shop_id() else {
            return Err(AppError::permission("only shops hold overrides"));
        };
        let value = self.values.get(value_id).await?;
        match &value.shop {
            None => {}
            Some(owner) if owner == shop => {
                return Err(AppError::validation(
                    "cannot override a value the shop owns, edit it directly",
                ));
            }
            Some(_) => {
                return Err(AppError::permission(
                    "cannot override another shop's value",
                ));
            }
        }

        if let Some(existing) = self.overrides.find_by_shop_value(shop, value_id).await? {
            let id = existing
                .id
                .clone()
                .ok_or_else(|| AppError::Database("override row missing id".to_string()))?;
            return self.apply_override_update(&id, existing, data).await;
        }

        let now = now_millis();
        let row = ShopOverride {
            id: None,
            shop: shop.clone(),
            attribute_value: value_id.clone(),
            custom_value: data.custom_value,
            custom_image: data.custom_image,
            custom_price_adjustment: data.custom_price_adjustment,
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        Ok(self.overrides.create(row).await?)
    }

    /// 更新已有覆盖
    pub async fn update_override(
        &self,
        override_id: &RecordId,
        actor: &Actor,
        data: ShopOverrideUpsert,
    ) -> AppResult<ShopOverride> {
        let uploads: Vec<String> = data.custom_image.iter().cloned().collect();
        let result = async {
            let existing = self.overrides.get(override_id).await?;
            if !actor.can_manage_shop(&existing.shop) {
                return Err(AppError::permission("cannot modify another shop's override"));
            }
            self.apply_override_update(override_id, existing, data).await
        }
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) => {
                let current = self
                    .overrides
                    .find_by_id(override_id)
                    .await
                    .ok()
                    .flatten()
                    .and_then(|o| o.custom_image);
                self.discard_foreign_uploads(uploads, current).await;
                Err(e)
            }
        }
    }

    /// 失败清理：丢弃暂存上传，但跳过与在用图同路径的提交
    async fn discard_foreign_uploads(&self, uploads: Vec<String>, current: Option<String>) {
        let discard: Vec<String> = uploads
            .into_iter()
            .filter(|path| Some(path) != current.as_ref())
            .collect();
        discard_staged_uploads(&self.files, &discard).await;
    }

    async fn apply_override_update(
        &self,
        override_id: &RecordId,
        existing: ShopOverride,
        data: ShopOverrideUpsert,
    ) -> AppResult<ShopOverride> {
        let mut removals: Vec<String> = Vec::new();
        let mut additions: Vec<String> = Vec::new();
        // 重复提交当前路径是 no-op，不能让 abort 删掉在用文件
        if let Some(new_image) = &data.custom_image
            && existing.custom_image.as_ref() != Some(new_image)
        {
            if let Some(old) = &existing.custom_image {
                removals.push(old.clone());
            }
            additions.push(new_image.clone());
        }

        let staged = StagedFileTransaction::stage(&self.files, &removals, &additions).await?;

        match self.overrides.update(override_id, data).await {
            Ok(updated) => {
                staged.commit().await;
                Ok(updated)
            }
            Err(e) => {
                staged.abort().await;
                Err(e.into())
            }
        }
    }

    /// 激活 / 停用覆盖；停用后店铺立即回到基础值
    pub async fn toggle_override(
        &self,
        override_id: &RecordId,
        actor: &Actor,
    ) -> AppResult<ShopOverride> {
        let existing = self.overrides.get(override_id).await?;
        if !actor.can_manage_shop(&existing.shop) {
            return Err(AppError::permission("cannot modify another shop's override"));
        }
        Ok(self
            .overrides
            .set_active(override_id, !existing.is_active)
            .await?)
    }

    /// 删除覆盖及其自定义图片
    pub async fn delete_override(&self, override_id: &RecordId, actor: &Actor) -> AppResult<()> {
        let existing = self.overrides.get(override_id).await?;
        if !actor.can_manage_shop(&existing.shop) {
            return Err(AppError::permission("cannot modify another shop's override"));
        }
        self.overrides.delete(override_id).await?;
        if let Some(image) = &existing.custom_image {
            self.files.delete_if_exists(image).await;
        }
        Ok(())
    }

    /// 店铺视角：某属性下的值，覆盖已合并
    pub async fn resolve_for_shop(
        &self,
        attribute_id: &RecordId,
        shop: &RecordId,
    ) -> AppResult<Vec<ResolvedValue>> {
        self.attributes.get(attribute_id).await?;
        let values = self.values.find_visible_for_shop(attribute_id, shop).await?;
        let overrides = self.overrides.find_by_shop(shop).await?;
        Ok(resolve(&values, &overrides))
    }
}

fn check_attribute_owner(attribute: &Attribute, actor: &Actor) -> AppResult<()> {
    match actor {
        Actor::Platform if attribute.is_global => Ok(()),
        Actor::Platform => Err(AppError::permission(
            "the platform only manages global attributes",
        )),
        Actor::Shop(shop) => match &attribute.shop {
            Some(owner) if owner == shop => Ok(()),
            _ => Err(AppError::permission(
                "cannot modify an attribute owned elsewhere",
            )),
        },
    }
}

fn check_value_owner(value: &AttributeValue, actor: &Actor) -> AppResult<()> {
    match actor {
        Actor::Platform if value.shop.is_none() => Ok(()),
        Actor::Platform => Err(AppError::permission(
            "the platform only manages global values",
        )),
        Actor::Shop(shop) => match &value.shop {
            Some(owner) if owner == shop => Ok(()),
            _ => Err(AppError::permission("cannot modify a value owned elsewhere")),
        },
    }
}

fn build_value_docs(
    attribute: &RecordId,
    scope: &Option<RecordId>,
    values: Vec<AttributeValueCreate>,
    now: i64,
) -> AppResult<Vec<AttributeValue>> {
    let mut docs = Vec::with_capacity(values.len());
    for value in values {
        let text = value.value.trim().to_string();
        if text.is_empty() {
            return Err(AppError::validation("value text cannot be empty"));
        }
        docs.push(AttributeValue {
            id: None,
            attribute: attribute.clone(),
            value: text,
            shop: scope.clone(),
            image: value.image.unwrap_or_default(),
            price_adjustment: value.price_adjustment.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        });
    }
    Ok(docs)
}
