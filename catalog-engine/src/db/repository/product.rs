//! Product Repository

use surrealdb::RecordId;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Product, ProductUpdate};
use crate::utils::now_millis;

// =============================================================================
// Product Repository
// =============================================================================

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Product>> {
        let product: Option<Product> = self.base.db().select(id.clone()).await?;
        Ok(product)
    }

    /// Find product by id, NotFound if missing
    pub async fn get(&self, id: &RecordId) -> RepoResult<Product> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Find all products of a shop
    pub async fn find_by_shop(&self, shop: &RecordId) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE shop = $shop ORDER BY created_at DESC")
            .bind(("shop", shop.clone()))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Partial update of basic fields
    pub async fn update_basic(&self, id: &RecordId, data: ProductUpdate) -> RepoResult<Product> {
        let mut set_parts: Vec<&str> = Vec::new();
        if data.name.is_some() {
            set_parts.push("name = $name");
        }
        if data.base_price.is_some() {
            set_parts.push("base_price = $base_price");
        }
        if data.description.is_some() {
            set_parts.push("description = $description");
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

        if let Some(v) = data.name {
            query = query.bind(("name", v));
        }
        if let Some(v) = data.base_price {
            query = query.bind(("base_price", v));
        }
        if let Some(v) = data.description {
            query = query.bind(("description", v));
        }

        let products: Vec<Product> = query.await?.take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Replace the image list
    pub async fn set_images(&self, id: &RecordId, images: Vec<String>) -> RepoResult<Product> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $thing SET images = $images, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("images", images))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Toggle / set active flag
    pub async fn set_active(&self, id: &RecordId, active: bool) -> RepoResult<Product> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("UPDATE $thing SET is_active = $active, updated_at = $updated_at RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("active", active))
            .bind(("updated_at", now_millis()))
            .await?
            .take(0)?;
        products
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }
}
