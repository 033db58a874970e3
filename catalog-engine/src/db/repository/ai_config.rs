//! Product AI Config Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoResult};
use crate::db::models::{AiConfig, TargetGroup};
use crate::utils::now_millis;

#[derive(Clone)]
pub struct AiConfigRepository {
    base: BaseRepository,
}

impl AiConfigRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// 商品的 AI 配置 (每商品至多一份)
    pub async fn find_by_product(&self, product: &RecordId) -> RepoResult<Option<AiConfig>> {
        let rows: Vec<AiConfig> = self
            .base
            .db()
            .query("SELECT * FROM ai_config WHERE product = $product")
            .bind(("product", product.clone()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next())
    }

    /// 更新商品的分类提示
    pub async fn set_target_group(
        &self,
        product: &RecordId,
        target_group: TargetGroup,
    ) -> RepoResult<AiConfig> {
        let rows: Vec<AiConfig> = self
            .base
            .db()
            .query(
                "UPDATE ai_config SET target_group = $target_group, updated_at = $updated_at \
                 WHERE product = $product RETURN AFTER",
            )
            .bind(("product", product.clone()))
            .bind(("target_group", target_group))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        rows.into_iter().next().ok_or_else(|| {
            super::RepoError::NotFound(format!("AI config for {product} not found"))
        })
    }

    /// 记录最近一次索引派发时间 (best effort)
    pub async fn touch_indexed(&self, product: &RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE ai_config SET last_indexed_at = $ts WHERE product = $product")
            .bind(("product", product.clone()))
            .bind(("ts", now_millis()))
            .await?
            .check()
            .map_err(super::RepoError::from)?;
        Ok(())
    }
}
