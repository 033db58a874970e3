//! Attribute Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Attribute;
use crate::utils::now_millis;

#[derive(Clone)]
pub struct AttributeRepository {
    base: BaseRepository,
}

impl AttributeRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Attribute>> {
        let attribute: Option<Attribute> = self.base.db().select(id.clone()).await?;
        Ok(attribute)
    }

    pub async fn get(&self, id: &RecordId) -> RepoResult<Attribute> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Attribute {id} not found")))
    }

    /// 平台视角：所有全局属性 (含停用)
    pub async fn find_global(&self) -> RepoResult<Vec<Attribute>> {
        let attributes: Vec<Attribute> = self
            .base
            .db()
            .query("SELECT * FROM attribute WHERE is_global = true ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(attributes)
    }

    /// 店铺视角：可用的全局属性 + 店铺自己的全部属性 (含停用)
    pub async fn find_for_shop(&self, shop: &RecordId) -> RepoResult<Vec<Attribute>> {
        let attributes: Vec<Attribute> = self
            .base
            .db()
            .query(
                "SELECT * FROM attribute \
                 WHERE (is_global = true AND is_active = true) OR shop = $shop \
                 ORDER BY created_at DESC",
            )
            .bind(("shop", shop.clone()))
            .await?
            .take(0)?;
        Ok(attributes)
    }

    /// Rename an attribute
    pub async fn update_label(&self, id: &RecordId, label: String) -> RepoResult<Attribute> {
        let attributes: Vec<Attribute> = self
            .base
            .db()
            .query("UPDATE $thing SET label = $label, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("label", label))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        attributes
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Attribute {id} not found")))
    }

    /// 切换激活状态，并级联到该属性的所有值 (单事务)
    pub async fn set_active_cascade(&self, id: &RecordId, active: bool) -> RepoResult<Attribute> {
        let mut response = self
            .base
            .db()
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE $thing SET is_active = $active, updated_at = $updated_at RETURN AFTER; \
                 UPDATE attribute_value SET is_active = $active, updated_at = $updated_at \
                     WHERE attribute = $thing; \
                 COMMIT TRANSACTION;",
            )
            .bind(("thing", id.clone()))
            .bind(("active", active))
            .bind(("updated_at", now_millis()))
            .await?;
        let attributes: Vec<Attribute> = response.take(0)?;
        attributes
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Attribute {id} not found")))
    }
}
