//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Price Snapshots
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.unit_price is the CURRENT standard price.                    │
//! │                                                                         │
//! │  receipt creation ──► copies unit_price into receipt_items.std_price   │
//! │                                                                         │
//! │  Changing or deleting a product never rewrites existing receipts;      │
//! │  a deleted product can no longer be put on a new receipt.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use billing_core::{Money, Page, PageRequest, Product};

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub unit_price: Money,
}

/// Partial update; `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub unit_price: Option<Money>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns it.
    pub async fn insert(&self, new: &NewProduct, created_by: Option<&str>) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            prod_id: generate_product_id(),
            name: new.name.trim().to_string(),
            unit_price: new.unit_price,
            created_by: created_by.map(str::to_string),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        debug!(prod_id = %product.prod_id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                prod_id, name, unit_price, created_by,
                created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
            "#,
        )
        .bind(&product.prod_id)
        .bind(&product.name)
        .bind(product.unit_price)
        .bind(&product.created_by)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT prod_id, name, unit_price, created_by,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE prod_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products by name.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<Product>> {
        let total = self.count().await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT prod_id, name, unit_price, created_by,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL
            ORDER BY name, prod_id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(page.per_page as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(products, page, total))
    }

    /// The whole active catalog, for price comparisons.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT prod_id, name, unit_price, created_by,
                   created_at, updated_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL
            ORDER BY name, prod_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial update and returns the stored row.
    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> DbResult<Product> {
        debug!(prod_id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                unit_price = COALESCE(?3, unit_price),
                updated_at = ?4
            WHERE prod_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.unit_price)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product. Existing receipts keep their snapshot.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(prod_id = %id, "Soft-deleting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products SET deleted_at = ?2, updated_at = ?2
            WHERE prod_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn oil() -> NewProduct {
        NewProduct {
            name: "  Massage Oil ".to_string(),
            unit_price: Money::from_cents(10_000),
        }
    }

    #[tokio::test]
    async fn test_insert_get_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = repo.insert(&oil(), None).await.unwrap();
        assert_eq!(product.name, "Massage Oil");

        let updated = repo
            .update(
                &product.prod_id,
                &ProductUpdate {
                    unit_price: Some(Money::from_cents(12_500)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.unit_price.cents(), 12_500);
        assert_eq!(updated.name, "Massage Oil");
    }

    #[tokio::test]
    async fn test_soft_deleted_product_disappears() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let product = repo.insert(&oil(), None).await.unwrap();

        repo.soft_delete(&product.prod_id).await.unwrap();
        assert!(repo.get_by_id(&product.prod_id).await.unwrap().is_none());
        assert!(repo.list_active().await.unwrap().is_empty());
        assert!(matches!(
            repo.soft_delete(&product.prod_id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.update(&product.prod_id, &ProductUpdate::default()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_pages_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        for name in ["Towel", "Aloe", "Oil"] {
            repo.insert(
                &NewProduct {
                    name: name.to_string(),
                    unit_price: Money::from_cents(100),
                },
                None,
            )
            .await
            .unwrap();
        }

        let page = repo.list(PageRequest::new(1, 2)).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Aloe", "Oil"]);
        assert_eq!(page.pages, 2);
    }
}
