//! Shop Override Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ShopOverride, ShopOverrideUpsert};
use crate::utils::now_millis;

const OVERRIDE_TABLE: &str = "shop_override";

#[derive(Clone)]
pub struct OverrideRepository {
    base: BaseRepository,
}

impl OverrideRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a new override row (duplicate (shop, value) -> Duplicate)
    pub async fn create(&self, row: ShopOverride) -> RepoResult<ShopOverride> {
        let created: Option<ShopOverride> =
            self.base.db().create(OVERRIDE_TABLE).content(row).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create override".to_string()))
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<ShopOverride>> {
        let row: Option<ShopOverride> = self.base.db().select(id.clone()).await?;
        Ok(row)
    }

    pub async fn get(&self, id: &RecordId) -> RepoResult<ShopOverride> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Override {id} not found")))
    }

    /// 店铺的全部覆盖行
    pub async fn find_by_shop(&self, shop: &RecordId) -> RepoResult<Vec<ShopOverride>> {
        let rows: Vec<ShopOverride> = self
            .base
            .db()
            .query("SELECT * FROM shop_override WHERE shop = $shop")
            .bind(("shop", shop.clone()))
            .await?
            .take(0)?;
        Ok(rows)
    }

    /// 唯一键查找：(shop, attribute_value)
    pub async fn find_by_shop_value(
        &self,
        shop: &RecordId,
        value: &RecordId,
    ) -> RepoResult<Option<ShopOverride>> {
        let rows: Vec<ShopOverride> = self
            .base
            .db()
            .query("SELECT * FROM shop_override WHERE shop = $shop AND attribute_value = $value")
            .bind(("shop", shop.clone()))
            .bind(("value", value.clone()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Patch an existing override; None fields are left untouched
    pub async fn update(&self, id: &RecordId, data: ShopOverrideUpsert) -> RepoResult<ShopOverride> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.custom_value.is_some() {
            set_parts.push("custom_value = $custom_value");
        }
        if data.custom_image.is_some() {
            set_parts.push("custom_image = $custom_image");
        }
        if data.custom_price_adjustment.is_some() {
            set_parts.push("custom_price_adjustment = $custom_price_adjustment");
        }
        if data.is_active.is_some() {
            set_parts.push("is_active = $is_active");
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

        if let Some(v) = data.custom_value {
            query = query.bind(("custom_value", v));
        }
        if let Some(v) = data.custom_image {
            query = query.bind(("custom_image", v));
        }
        if let Some(v) = data.custom_price_adjustment {
            query = query.bind(("custom_price_adjustment", v));
        }
        if let Some(v) = data.is_active {
            query = query.bind(("is_active", v));
        }

        let rows: Vec<ShopOverride> = query.await?.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Override {id} not found")))
    }

    pub async fn set_active(&self, id: &RecordId, active: bool) -> RepoResult<ShopOverride> {
        let rows: Vec<ShopOverride> = self
            .base
            .db()
            .query("UPDATE $thing SET is_active = $active, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("active", active))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Override {id} not found")))
    }

    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let deleted: Option<ShopOverride> = self.base.db().delete(id.clone()).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Override {id} not found")));
        }
        Ok(())
    }
}
