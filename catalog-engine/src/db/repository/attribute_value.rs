//! Attribute Value Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{AttributeValue, AttributeValueUpdate};
use crate::utils::now_millis;

const VALUE_TABLE: &str = "attribute_value";

#[derive(Clone)]
pub struct AttributeValueRepository {
    base: BaseRepository,
}

impl AttributeValueRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Insert a batch of values in one atomic statement
    ///
    /// 任一重复 (attribute, value, shop) 使整个批次失败
    pub async fn insert_many(&self, values: Vec<AttributeValue>) -> RepoResult<Vec<AttributeValue>> {
        if values.is_empty() {
            return Ok(vec![]);
        }
        let created: Vec<AttributeValue> =
            self.base.db().insert(VALUE_TABLE).content(values).await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<AttributeValue>> {
        let value: Option<AttributeValue> = self.base.db().select(id.clone()).await?;
        Ok(value)
    }

    pub async fn get(&self, id: &RecordId) -> RepoResult<AttributeValue> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Attribute value {id} not found")))
    }

    /// 按 id 列表批量读取 (变体 pair 校验用)
    pub async fn find_by_ids(&self, ids: Vec<RecordId>) -> RepoResult<Vec<AttributeValue>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let values: Vec<AttributeValue> = self
            .base
            .db()
            .query("SELECT * FROM attribute_value WHERE id IN $ids")
            .bind(("ids", ids))
            .await?
            .take(0)?;
        Ok(values)
    }

    /// 平台视角：某属性下的全局值
    pub async fn find_global_by_attribute(
        &self,
        attribute: &RecordId,
    ) -> RepoResult<Vec<AttributeValue>> {
        let values: Vec<AttributeValue> = self
            .base
            .db()
            .query("SELECT * FROM attribute_value WHERE attribute = $attribute AND shop = NONE")
            .bind(("attribute", attribute.clone()))
            .await?
            .take(0)?;
        Ok(values)
    }

    /// 店铺视角：某属性下可见的值 (激活的全局值 + 店铺自己的全部值)
    pub async fn find_visible_for_shop(
        &self,
        attribute: &RecordId,
        shop: &RecordId,
    ) -> RepoResult<Vec<AttributeValue>> {
        let values: Vec<AttributeValue> = self
            .base
            .db()
            .query(
                "SELECT * FROM attribute_value WHERE attribute = $attribute \
                 AND ((shop = NONE AND is_active = true) OR shop = $shop)",
            )
            .bind(("attribute", attribute.clone()))
            .bind(("shop", shop.clone()))
            .await?
            .take(0)?;
        Ok(values)
    }

    /// 某属性下的全部值 (删除属性前收集图片用)
    pub async fn find_by_attribute(&self, attribute: &RecordId) -> RepoResult<Vec<AttributeValue>> {
        let values: Vec<AttributeValue> = self
            .base
            .db()
            .query("SELECT * FROM attribute_value WHERE attribute = $attribute")
            .bind(("attribute", attribute.clone()))
            .await?
            .take(0)?;
        Ok(values)
    }

    /// Partial update (value text / image / price adjustment)
    pub async fn update(
        &self,
        id: &RecordId,
        data: AttributeValueUpdate,
    ) -> RepoResult<AttributeValue> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.value.is_some() {
            set_parts.push("value = $value");
        }
        if data.image.is_some() {
            set_parts.push("image = $image");
        }
        if data.price_adjustment.is_some() {
            set_parts.push("price_adjustment = $price_adjustment");
        }

        if set_parts.is_empty() {
            return self.get(id).await;
        }
        set_parts.push("updated_at = $updated_at");

        let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
        let mut query = self
            .base
            .db()
            .query(&query_str)
            .bind(("thing", id.clone()))
            .bind(("updated_at", now_millis()));

        if let Some(v) = data.value {
            query = query.bind(("value", v));
        }
        if let Some(v) = data.image {
            query = query.bind(("image", v));
        }
        if let Some(v) = data.price_adjustment {
            query = query.bind(("price_adjustment", v));
        }

        let values: Vec<AttributeValue> = query.await?.take(0)?;
        values
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Attribute value {id} not found")))
    }

    pub async fn set_active(&self, id: &RecordId, active: bool) -> RepoResult<AttributeValue> {
        let values: Vec<AttributeValue> = self
            .base
            .db()
            .query("UPDATE $thing SET is_active = $active, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("active", active))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        values
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Attribute value {id} not found")))
    }

    /// Hard delete a single value
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let deleted: Option<AttributeValue> = self.base.db().delete(id.clone()).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!(
                "Attribute value {id} not found"
            )));
        }
        Ok(())
    }
}
