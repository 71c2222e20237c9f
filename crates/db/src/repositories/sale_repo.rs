//! Repository for the `sales` table.
//!
//! Every write moves stock on `products` inside the same database
//! transaction, so a sale and the stock it consumed always change together.

use sqlx::{PgConnection, PgPool};
use stockroom_core::inventory::covers;
use stockroom_core::locking::LockScope;
use stockroom_core::types::Timestamp;

use crate::models::sale::{CreateSale, Sale, SaleWrite, UpdateSale};
use crate::repositories::ResourceLockRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, sold_on, product_id, quantity, locked_by, locked_at, created_at, updated_at";

/// Result of trying to take stock from a product.
enum StockCheck {
    Taken,
    ProductMissing,
    Short { available: i32 },
}

/// Provides CRUD operations for sales transactions.
pub struct SaleRepo;

impl SaleRepo {
    /// Record a sale under a pre-generated id and take its quantity from stock.
    ///
    /// The product row is locked and checked before anything is written; a
    /// sale larger than the available stock is rejected with no changes.
    pub async fn create(
        pool: &PgPool,
        id: &str,
        input: &CreateSale,
    ) -> Result<SaleWrite, sqlx::Error> {
        let mut tx = pool.begin().await?;

        match take_stock(&mut tx, &input.product_id, input.quantity).await? {
            StockCheck::Taken => {}
            StockCheck::ProductMissing => {
                tx.rollback().await?;
                return Ok(SaleWrite::ProductNotFound);
            }
            StockCheck::Short { available } => {
                tx.rollback().await?;
                return Ok(SaleWrite::InsufficientStock { available });
            }
        }

        let query = format!(
            "INSERT INTO sales (id, sold_on, product_id, quantity)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .bind(input.sold_on)
            .bind(&input.product_id)
            .bind(input.quantity)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(SaleWrite::Written(sale))
    }

    /// Whether a sale with this id exists.
    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM sales WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Find a sale by id, lock columns as stored.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Sale>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sales WHERE id = $1");
        sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all sales, most recent first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Sale>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sales ORDER BY sold_on DESC, id DESC");
        sqlx::query_as::<_, Sale>(&query).fetch_all(pool).await
    }

    /// Find a sale for display, clearing its lock first if it has expired.
    pub async fn find_for_display(
        pool: &PgPool,
        scope: &LockScope,
        id: &str,
        now: Timestamp,
    ) -> Result<Option<Sale>, sqlx::Error> {
        ResourceLockRepo::expire_stale(pool, scope, id, now).await;
        let mut sale = Self::find_by_id(pool, id).await?;
        if let Some(sale) = sale.as_mut() {
            sale.mask_expired_lock(now, scope.expiry);
        }
        Ok(sale)
    }

    /// List sales for display, clearing expired locks first.
    pub async fn list_for_display(
        pool: &PgPool,
        scope: &LockScope,
        now: Timestamp,
    ) -> Result<Vec<Sale>, sqlx::Error> {
        ResourceLockRepo::expire_all_stale(pool, scope, now).await;
        let mut sales = Self::list(pool).await?;
        for sale in &mut sales {
            sale.mask_expired_lock(now, scope.expiry);
        }
        Ok(sales)
    }

    /// Rewrite a sale, returning its old quantity to stock and taking the
    /// new quantity from the (possibly different) product.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateSale,
    ) -> Result<SaleWrite, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(String, i32)> =
            sqlx::query_as("SELECT product_id, quantity FROM sales WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((old_product_id, old_quantity)) = current else {
            tx.rollback().await?;
            return Ok(SaleWrite::SaleNotFound);
        };

        // Both product rows are locked in id order before any stock moves, so
        // two updates swapping products cannot deadlock each other.
        let product_ids = vec![old_product_id.clone(), input.product_id.clone()];
        let stock: Vec<(String, i32)> = sqlx::query_as(
            "SELECT id, quantity FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let Some(on_hand) = stock
            .iter()
            .find(|(product_id, _)| *product_id == input.product_id)
            .map(|(_, quantity)| *quantity)
        else {
            tx.rollback().await?;
            return Ok(SaleWrite::ProductNotFound);
        };
        let same_product = input.product_id == old_product_id;
        let available = if same_product {
            on_hand.saturating_add(old_quantity)
        } else {
            on_hand
        };
        if !covers(available, input.quantity) {
            tx.rollback().await?;
            return Ok(SaleWrite::InsufficientStock { available });
        }

        if same_product {
            // Net change only; both quantities are positive, so this cannot overflow.
            return_stock(&mut tx, &old_product_id, old_quantity - input.quantity).await?;
        } else {
            return_stock(&mut tx, &old_product_id, old_quantity).await?;
            remove_stock(&mut tx, &input.product_id, input.quantity).await?;
        }

        let query = format!(
            "UPDATE sales SET
                sold_on = $2,
                product_id = $3,
                quantity = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .bind(input.sold_on)
            .bind(&input.product_id)
            .bind(input.quantity)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(SaleWrite::Written(sale))
    }

    /// Delete a sale and return its quantity to stock. Returns `true` if a
    /// row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let removed: Option<(String, i32)> =
            sqlx::query_as("DELETE FROM sales WHERE id = $1 RETURNING product_id, quantity")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((product_id, quantity)) = removed else {
            tx.rollback().await?;
            return Ok(false);
        };

        return_stock(&mut tx, &product_id, quantity).await?;

        tx.commit().await?;
        Ok(true)
    }
}

/// Lock the product row and take `quantity` from it if there is enough.
async fn take_stock(
    conn: &mut PgConnection,
    product_id: &str,
    quantity: i32,
) -> Result<StockCheck, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((available,)) = row else {
        return Ok(StockCheck::ProductMissing);
    };
    if !covers(available, quantity) {
        return Ok(StockCheck::Short { available });
    }

    remove_stock(conn, product_id, quantity).await?;
    Ok(StockCheck::Taken)
}

/// Take `quantity` off a product whose row the caller already holds.
async fn remove_stock(
    conn: &mut PgConnection,
    product_id: &str,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET quantity = quantity - $2 WHERE id = $1")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Put `quantity` back on a product (a negative amount takes stock).
async fn return_stock(
    conn: &mut PgConnection,
    product_id: &str,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET quantity = quantity + $2 WHERE id = $1")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
