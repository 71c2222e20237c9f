//! Row-level advisory locks on `products` and `sales`.
//!
//! The lock lives in the `locked_by` / `locked_at` columns of the resource
//! row. Only this repository writes those two columns. Every method takes a
//! [`LockScope`] resolved once from the lock policy, so table and expiry
//! never have to be re-derived from strings at the call site.

use sqlx::PgPool;
use stockroom_core::locking::{decide, LockDecision, LockHolder, LockScope};
use stockroom_core::types::Timestamp;

use crate::models::lock::{LockOutcome, LockState};

/// Provides acquire, release, and passive-expiry operations on row locks.
pub struct ResourceLockRepo;

impl ResourceLockRepo {
    /// Try to take the lock on `resource_id` for `owner_id`.
    ///
    /// Reads the current holder with `SELECT ... FOR UPDATE`, so concurrent
    /// acquires on the same row serialize and exactly one of two competing
    /// owners wins. The lock is granted when the row is unlocked, already
    /// held by `owner_id` (refreshing `locked_at`), or held by someone whose
    /// lock is older than the scope's expiry. Otherwise the transaction is
    /// rolled back and the current holder is returned.
    pub async fn acquire(
        pool: &PgPool,
        scope: &LockScope,
        resource_id: &str,
        owner_id: &str,
        now: Timestamp,
    ) -> Result<LockOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!(
            "SELECT locked_by, locked_at FROM {} WHERE {} = $1 FOR UPDATE",
            scope.table, scope.id_column
        );
        let row: Option<(Option<String>, Option<Timestamp>)> = sqlx::query_as(&select)
            .bind(resource_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some((locked_by, locked_at)) = row else {
            tx.rollback().await?;
            return Ok(LockOutcome::NotFound);
        };

        let current = LockHolder::from_columns(locked_by, locked_at);
        let decision = decide(current.as_ref(), owner_id, now, scope.expiry);

        if let LockDecision::Deny(holder) = decision {
            tx.rollback().await?;
            tracing::warn!(
                resource_kind = %scope.kind,
                resource_id,
                owner_id,
                holder = %holder.locked_by,
                "Lock denied"
            );
            return Ok(LockOutcome::Denied(holder));
        }

        let update = format!(
            "UPDATE {} SET locked_by = $2, locked_at = $3 WHERE {} = $1",
            scope.table, scope.id_column
        );
        let result = sqlx::query(&update)
            .bind(resource_id)
            .bind(owner_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(LockOutcome::NotFound);
        }

        tx.commit().await?;

        if let LockDecision::Takeover(previous) = &decision {
            tracing::info!(
                resource_kind = %scope.kind,
                resource_id,
                owner_id,
                previous_holder = %previous.locked_by,
                "Expired lock taken over"
            );
        }

        Ok(LockOutcome::Granted {
            holder: LockHolder {
                locked_by: owner_id.to_string(),
                locked_at: now,
            },
            decision,
        })
    }

    /// Clear the lock if, and only if, `owner_id` holds it.
    ///
    /// Returns `false` both when the row does not exist and when it is not
    /// locked by `owner_id`.
    pub async fn release(
        pool: &PgPool,
        scope: &LockScope,
        resource_id: &str,
        owner_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET locked_by = NULL, locked_at = NULL \
             WHERE {} = $1 AND locked_by = $2",
            scope.table, scope.id_column
        );
        let result = sqlx::query(&query)
            .bind(resource_id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// [`release`](Self::release) that never fails: storage errors are
    /// logged and reported as "nothing released". A lock left behind this
    /// way expires on its own.
    pub async fn release_best_effort(
        pool: &PgPool,
        scope: &LockScope,
        resource_id: &str,
        owner_id: &str,
    ) -> bool {
        match Self::release(pool, scope, resource_id, owner_id).await {
            Ok(released) => released,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    resource_kind = %scope.kind,
                    resource_id,
                    owner_id,
                    "Failed to release lock, leaving it to expire"
                );
                false
            }
        }
    }

    /// Clear the lock on one row if it is older than the scope's expiry.
    ///
    /// The condition is re-checked by the `UPDATE` itself, so concurrent
    /// readers clearing the same stale lock are harmless and a lock that was
    /// refreshed in the meantime is left alone.
    pub async fn clear_if_expired(
        pool: &PgPool,
        scope: &LockScope,
        resource_id: &str,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET locked_by = NULL, locked_at = NULL \
             WHERE {} = $1 AND locked_at IS NOT NULL AND locked_at < $2",
            scope.table, scope.id_column
        );
        let result = sqlx::query(&query)
            .bind(resource_id)
            .bind(scope.stale_before(now))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear every stale lock in the scope's table. Returns the number of
    /// rows cleared.
    pub async fn clear_all_expired(
        pool: &PgPool,
        scope: &LockScope,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE {} SET locked_by = NULL, locked_at = NULL \
             WHERE locked_at IS NOT NULL AND locked_at < $1",
            scope.table
        );
        let result = sqlx::query(&query)
            .bind(scope.stale_before(now))
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Read the raw lock columns of one row, without any expiry handling.
    pub async fn state(
        pool: &PgPool,
        scope: &LockScope,
        resource_id: &str,
    ) -> Result<LockState, sqlx::Error> {
        let query = format!(
            "SELECT locked_by, locked_at FROM {} WHERE {} = $1",
            scope.table, scope.id_column
        );
        let row: Option<(Option<String>, Option<Timestamp>)> = sqlx::query_as(&query)
            .bind(resource_id)
            .fetch_optional(pool)
            .await?;

        Ok(match row {
            None => LockState::Missing,
            Some((locked_by, locked_at)) => match LockHolder::from_columns(locked_by, locked_at) {
                Some(holder) => LockState::Held(holder),
                None => LockState::Unlocked,
            },
        })
    }

    /// Passive expiry: clear a stale lock on one row before it is shown.
    ///
    /// Failures are logged and swallowed; the caller masks the stale lock in
    /// what it returns either way.
    pub async fn expire_stale(pool: &PgPool, scope: &LockScope, resource_id: &str, now: Timestamp) {
        match Self::clear_if_expired(pool, scope, resource_id, now).await {
            Ok(true) => tracing::debug!(
                resource_kind = %scope.kind,
                resource_id,
                "Cleared expired lock on read"
            ),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                error = %e,
                resource_kind = %scope.kind,
                resource_id,
                "Failed to clear expired lock on read"
            ),
        }
    }

    /// Passive expiry for a whole table before listing it.
    pub async fn expire_all_stale(pool: &PgPool, scope: &LockScope, now: Timestamp) {
        match Self::clear_all_expired(pool, scope, now).await {
            Ok(0) => {}
            Ok(cleared) => tracing::debug!(
                resource_kind = %scope.kind,
                cleared,
                "Cleared expired locks on list"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                resource_kind = %scope.kind,
                "Failed to clear expired locks on list"
            ),
        }
    }
}
