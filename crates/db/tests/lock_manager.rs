//! Integration tests for `ResourceLockRepo` against a real database.

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::PgPool;
use stockroom_core::locking::{LockDecision, LockPolicy, LockScope, ResourceKind};
use stockroom_db::models::lock::{LockOutcome, LockState};
use stockroom_db::models::product::CreateProduct;
use stockroom_db::models::sale::CreateSale;
use stockroom_db::repositories::{ProductRepo, ResourceLockRepo, SaleRepo};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn product_scope() -> LockScope {
    LockPolicy::default().scope(ResourceKind::Product)
}

async fn seed_product(pool: &PgPool, id: &str) {
    ProductRepo::create(
        pool,
        id,
        &CreateProduct {
            name: format!("Product {id}"),
            unit: "pcs".into(),
            quantity: 10,
        },
    )
    .await
    .unwrap();
}

async fn lock_columns(pool: &PgPool, table: &str, id: &str) -> (Option<String>, Option<DateTime<Utc>>) {
    sqlx::query_as(&format!("SELECT locked_by, locked_at FROM {table} WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Acquire
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_acquire_unlocked_row_grants_fresh(pool: PgPool) {
    seed_product(&pool, "P1").await;

    let outcome = ResourceLockRepo::acquire(&pool, &product_scope(), "P1", "A", t0())
        .await
        .unwrap();
    assert_matches!(outcome, LockOutcome::Granted { decision: LockDecision::Fresh, .. });

    assert_eq!(
        lock_columns(&pool, "products", "P1").await,
        (Some("A".to_string()), Some(t0()))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reacquire_refreshes_locked_at(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();

    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();
    let later = t0() + Duration::seconds(120);
    let outcome = ResourceLockRepo::acquire(&pool, &scope, "P1", "A", later)
        .await
        .unwrap();

    assert_matches!(outcome, LockOutcome::Granted { decision: LockDecision::Refresh, .. });
    assert_eq!(lock_columns(&pool, "products", "P1").await.1, Some(later));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_contended_acquire_is_denied_until_expiry(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();

    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();

    let within = t0() + scope.expiry;
    let outcome = ResourceLockRepo::acquire(&pool, &scope, "P1", "B", within)
        .await
        .unwrap();
    assert_matches!(outcome, LockOutcome::Denied(holder) if holder.locked_by == "A");
    assert_eq!(lock_columns(&pool, "products", "P1").await.0.as_deref(), Some("A"));

    let after = within + Duration::seconds(1);
    let outcome = ResourceLockRepo::acquire(&pool, &scope, "P1", "B", after)
        .await
        .unwrap();
    assert_matches!(
        outcome,
        LockOutcome::Granted { decision: LockDecision::Takeover(previous), .. }
            if previous.locked_by == "A"
    );
    assert_eq!(
        lock_columns(&pool, "products", "P1").await,
        (Some("B".to_string()), Some(after))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_acquire_missing_row_is_not_found(pool: PgPool) {
    let outcome = ResourceLockRepo::acquire(&pool, &product_scope(), "NOPE", "A", t0())
        .await
        .unwrap();
    assert_eq!(outcome, LockOutcome::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_acquires_have_exactly_one_winner(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();

    let owners: Vec<String> = (0..8).map(|i| format!("owner-{i}")).collect();
    let attempts = owners
        .iter()
        .map(|owner| ResourceLockRepo::acquire(&pool, &scope, "P1", owner, t0()));
    let outcomes = futures::future::join_all(attempts).await;

    let winners: Vec<&LockOutcome> = outcomes
        .iter()
        .map(|o| o.as_ref().unwrap())
        .filter(|o| matches!(o, LockOutcome::Granted { .. }))
        .collect();
    assert_eq!(winners.len(), 1);

    let LockOutcome::Granted { holder, .. } = winners[0] else {
        unreachable!()
    };
    for outcome in &outcomes {
        if let Ok(LockOutcome::Denied(denied_by)) = outcome {
            assert_eq!(denied_by.locked_by, holder.locked_by);
        }
    }
    assert_eq!(
        lock_columns(&pool, "products", "P1").await.0.as_deref(),
        Some(holder.locked_by.as_str())
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transaction_scope_locks_sales_rows(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let sale = CreateSale {
        sold_on: t0().date_naive(),
        product_id: "P1".into(),
        quantity: 1,
    };
    SaleRepo::create(&pool, "TAA0001", &sale).await.unwrap();

    let scope = LockPolicy::default().scope(ResourceKind::Transaction);
    let outcome = ResourceLockRepo::acquire(&pool, &scope, "TAA0001", "A", t0())
        .await
        .unwrap();
    assert_matches!(outcome, LockOutcome::Granted { .. });
    assert_eq!(lock_columns(&pool, "sales", "TAA0001").await.0.as_deref(), Some("A"));
    assert_eq!(lock_columns(&pool, "products", "P1").await.0, None);
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_by_owner_clears_both_columns(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();
    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();

    assert!(ResourceLockRepo::release(&pool, &scope, "P1", "A").await.unwrap());
    assert_eq!(lock_columns(&pool, "products", "P1").await, (None, None));

    // Nothing left to release.
    assert!(!ResourceLockRepo::release(&pool, &scope, "P1", "A").await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_by_non_owner_keeps_lock(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();
    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();

    assert!(!ResourceLockRepo::release(&pool, &scope, "P1", "B").await.unwrap());
    assert!(!ResourceLockRepo::release_best_effort(&pool, &scope, "P1", "B").await);
    assert_eq!(
        lock_columns(&pool, "products", "P1").await,
        (Some("A".to_string()), Some(t0()))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_missing_row_returns_false(pool: PgPool) {
    assert!(!ResourceLockRepo::release(&pool, &product_scope(), "NOPE", "A")
        .await
        .unwrap());
}

// ---------------------------------------------------------------------------
// Passive expiry
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_clear_if_expired_only_clears_stale_locks(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();
    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();

    let at_threshold = t0() + scope.expiry;
    assert!(!ResourceLockRepo::clear_if_expired(&pool, &scope, "P1", at_threshold)
        .await
        .unwrap());

    let past = at_threshold + Duration::seconds(1);
    assert!(ResourceLockRepo::clear_if_expired(&pool, &scope, "P1", past)
        .await
        .unwrap());
    assert_eq!(lock_columns(&pool, "products", "P1").await, (None, None));

    // Idempotent.
    assert!(!ResourceLockRepo::clear_if_expired(&pool, &scope, "P1", past)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_clear_all_expired_leaves_fresh_locks(pool: PgPool) {
    seed_product(&pool, "P1").await;
    seed_product(&pool, "P2").await;
    let scope = product_scope();

    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();
    let later = t0() + Duration::seconds(200);
    ResourceLockRepo::acquire(&pool, &scope, "P2", "B", later).await.unwrap();

    let now = t0() + scope.expiry + Duration::seconds(1);
    let cleared = ResourceLockRepo::clear_all_expired(&pool, &scope, now)
        .await
        .unwrap();
    assert_eq!(cleared, 1);

    assert_eq!(lock_columns(&pool, "products", "P1").await, (None, None));
    assert_eq!(lock_columns(&pool, "products", "P2").await.0.as_deref(), Some("B"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_state_reports_raw_columns(pool: PgPool) {
    seed_product(&pool, "P1").await;
    let scope = product_scope();

    assert_eq!(
        ResourceLockRepo::state(&pool, &scope, "NOPE").await.unwrap(),
        LockState::Missing
    );
    assert_eq!(
        ResourceLockRepo::state(&pool, &scope, "P1").await.unwrap(),
        LockState::Unlocked
    );

    ResourceLockRepo::acquire(&pool, &scope, "P1", "A", t0()).await.unwrap();
    assert_matches!(
        ResourceLockRepo::state(&pool, &scope, "P1").await.unwrap(),
        LockState::Held(holder) if holder.locked_by == "A" && holder.locked_at == t0()
    );
}
