//! Repository for the `products` table.

use sqlx::PgPool;
use stockroom_core::locking::LockScope;
use stockroom_core::types::Timestamp;

use crate::models::product::{CreateProduct, Product, ProductDeletion, UpdateProduct};
use crate::repositories::ResourceLockRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, unit, quantity, locked_by, locked_at, created_at, updated_at";

/// Provides CRUD operations for products.
///
/// Writes here only touch domain columns; lock columns belong to
/// [`ResourceLockRepo`].
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product under a pre-generated id, returning the created row.
    pub async fn create(
        pool: &PgPool,
        id: &str,
        input: &CreateProduct,
    ) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (id, name, unit, quantity)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(input.name.trim())
            .bind(input.unit.trim())
            .bind(input.quantity)
            .fetch_one(pool)
            .await
    }

    /// Whether a product with this id exists.
    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Find a product by id, lock columns as stored.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all products ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products ORDER BY name ASC");
        sqlx::query_as::<_, Product>(&query).fetch_all(pool).await
    }

    /// Find a product for display, clearing its lock first if it has expired.
    pub async fn find_for_display(
        pool: &PgPool,
        scope: &LockScope,
        id: &str,
        now: Timestamp,
    ) -> Result<Option<Product>, sqlx::Error> {
        ResourceLockRepo::expire_stale(pool, scope, id, now).await;
        let mut product = Self::find_by_id(pool, id).await?;
        if let Some(product) = product.as_mut() {
            product.mask_expired_lock(now, scope.expiry);
        }
        Ok(product)
    }

    /// List products for display, clearing expired locks first.
    pub async fn list_for_display(
        pool: &PgPool,
        scope: &LockScope,
        now: Timestamp,
    ) -> Result<Vec<Product>, sqlx::Error> {
        ResourceLockRepo::expire_all_stale(pool, scope, now).await;
        let mut products = Self::list(pool).await?;
        for product in &mut products {
            product.mask_expired_lock(now, scope.expiry);
        }
        Ok(products)
    }

    /// Replace a product's editable fields.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                name = $2,
                unit = $3,
                quantity = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(input.name.trim())
            .bind(input.unit.trim())
            .bind(input.quantity)
            .fetch_optional(pool)
            .await
    }

    /// Delete a product unless sales still reference it.
    ///
    /// The product row is locked for the duration of the check so a sale
    /// cannot be recorded against it between the count and the delete.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<ProductDeletion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let found: Option<(String,)> =
            sqlx::query_as("SELECT id FROM products WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            tx.rollback().await?;
            return Ok(ProductDeletion::NotFound);
        }

        let (references,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sales WHERE product_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if references > 0 {
            tx.rollback().await?;
            return Ok(ProductDeletion::Referenced(references));
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ProductDeletion::Deleted)
    }
}
