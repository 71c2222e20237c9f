//! Schema constraint checks: the lock column pair, stock bounds, and
//! referential integrity.

use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lock_columns_must_be_set_together(pool: PgPool) {
    sqlx::query("INSERT INTO products (id, name, unit, quantity) VALUES ('P1', 'Kopi', 'pcs', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query("UPDATE products SET locked_by = 'A' WHERE id = 'P1'")
        .execute(&pool)
        .await;
    let err = result.unwrap_err();
    let db_err = err.as_database_error().expect("expected a database error");
    assert_eq!(db_err.constraint(), Some("ck_products_lock_pair"));

    let result = sqlx::query("UPDATE products SET locked_at = NOW() WHERE id = 'P1'")
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_product_quantity_cannot_go_negative(pool: PgPool) {
    let result =
        sqlx::query("INSERT INTO products (id, name, unit, quantity) VALUES ('P1', 'Kopi', 'pcs', -1)")
            .execute(&pool)
            .await;
    let err = result.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("ck_products_quantity_non_negative")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sale_requires_existing_product(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO sales (id, sold_on, product_id, quantity) VALUES ('T1', '2026-03-01', 'NOPE', 1)",
    )
    .execute(&pool)
    .await;
    let err = result.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.code()).as_deref(),
        Some("23503")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_updated_at_trigger_bumps_timestamp(pool: PgPool) {
    sqlx::query("INSERT INTO products (id, name, unit, quantity) VALUES ('P1', 'Kopi', 'pcs', 1)")
        .execute(&pool)
        .await
        .unwrap();

    let (changed,): (bool,) = sqlx::query_as(
        "WITH before AS (SELECT updated_at FROM products WHERE id = 'P1')
         UPDATE products SET quantity = 2 WHERE id = 'P1'
         RETURNING updated_at >= (SELECT updated_at FROM before)",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(changed);
}
