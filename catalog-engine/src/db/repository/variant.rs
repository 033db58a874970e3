//! Product Variant Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{ProductVariant, VariantUpdate};
use crate::utils::now_millis;

#[derive(Clone)]
pub struct VariantRepository {
    base: BaseRepository,
}

impl VariantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<ProductVariant>> {
        let variant: Option<ProductVariant> = self.base.db().select(id.clone()).await?;
        Ok(variant)
    }

    pub async fn get(&self, id: &RecordId) -> RepoResult<ProductVariant> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))
    }

    pub async fn find_by_product(&self, product: &RecordId) -> RepoResult<Vec<ProductVariant>> {
        let variants: Vec<ProductVariant> = self
            .base
            .db()
            .query("SELECT * FROM product_variant WHERE product = $product ORDER BY created_at")
            .bind(("product", product.clone()))
            .await?
            .take(0)?;
        Ok(variants)
    }

    /// Partial update; duplicate (product, variant_key) -> Duplicate
    pub async fn update(&self, id: &RecordId, data: VariantUpdate) -> RepoResult<ProductVariant> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.attributes.is_some() {
            set_parts.push("attributes = $attributes");
        }
        if data.variant_key.is_some() {
            set_parts.push("variant_key = $variant_key");
        }
        if data.stock.is_some() {
            set_parts.push("stock = $stock");
        }
        if data.price_adjustment.is_some() {
            set_parts.push("price_adjustment = $price_adjustment");
        }
        if data.image.is_some() {
            set_parts.push("image = $image");
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

        if let Some(v) = data.attributes {
            query = query.bind(("attributes", v));
        }
        if let Some(v) = data.variant_key {
            query = query.bind(("variant_key", v));
        }
        if let Some(v) = data.stock {
            query = query.bind(("stock", v));
        }
        if let Some(v) = data.price_adjustment {
            query = query.bind(("price_adjustment", v));
        }
        if let Some(v) = data.image {
            query = query.bind(("image", v));
        }

        let variants: Vec<ProductVariant> = query.await?.take(0)?;
        variants
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))
    }

    /// Absolute stock set (stock >= 0 validated by the service)
    pub async fn set_stock(&self, id: &RecordId, stock: i64) -> RepoResult<ProductVariant> {
        let variants: Vec<ProductVariant> = self
            .base
            .db()
            .query("UPDATE $thing SET stock = $stock, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("stock", stock))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        variants
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))
    }

    /// Increment stock by n
    pub async fn increment_stock(&self, id: &RecordId, n: i64) -> RepoResult<ProductVariant> {
        let variants: Vec<ProductVariant> = self
            .base
            .db()
            .query("UPDATE $thing SET stock += $n, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("n", n))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        variants
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))
    }

    /// Decrement stock by n, clamped at zero
    pub async fn decrement_stock(&self, id: &RecordId, n: i64) -> RepoResult<ProductVariant> {
        let variants: Vec<ProductVariant> = self
            .base
            .db()
            .query(
                "UPDATE $thing SET stock = math::max([stock - $n, 0]), updated_at = $updated_at \
                 RETURN AFTER",
            )
            .bind(("thing", id.clone()))
            .bind(("n", n))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        variants
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Variant {id} not found")))
    }

    /// Hard delete a variant
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let deleted: Option<ProductVariant> = self.base.db().delete(id.clone()).await?;
        if deleted.is_none() {
            return Err(RepoError::NotFound(format!("Variant {id} not found")));
        }
        Ok(())
    }
}
