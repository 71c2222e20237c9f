//! Lock manager entry points and the lock-gated mutation gateway.
//!
//! Every update or delete of a product or sale goes through
//! [`MutationPermit::enter`], which re-validates the caller's lock by
//! running a full acquire. Only a granted acquire yields a permit, and the
//! mutation handlers cannot run without one.
//!
//! A failed mutation leaves the lock standing. After a successful update the
//! lock is kept for the editing session unless the policy asks for
//! auto-release; after a delete it is gone along with the row.

use stockroom_core::error::CoreError;
use stockroom_core::locking::{
    validate_owner_id, validate_resource_id, LockDecision, LockHolder, LockScope, LockTarget,
    ResourceKind,
};
use stockroom_db::models::lock::LockOutcome;
use stockroom_db::repositories::ResourceLockRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A granted lock.
#[derive(Debug, Clone)]
pub struct LockGrant {
    pub scope: LockScope,
    pub resource_id: String,
    pub holder: LockHolder,
    pub decision: LockDecision,
}

/// Acquire (or refresh) the lock on `target` for `owner_id`.
///
/// Denial surfaces as [`CoreError::Locked`] carrying the current holder; a
/// missing row surfaces as [`CoreError::NotFound`].
pub async fn acquire(state: &AppState, target: &LockTarget, owner_id: &str) -> AppResult<LockGrant> {
    let scope = state.lock_scope(target.kind);
    let outcome = ResourceLockRepo::acquire(
        &state.pool,
        &scope,
        &target.resource_id,
        owner_id,
        state.now(),
    )
    .await?;

    match outcome {
        LockOutcome::Granted { holder, decision } => {
            tracing::info!(
                owner_id,
                resource_kind = %target.kind,
                resource_id = %target.resource_id,
                refreshed = matches!(decision, LockDecision::Refresh),
                "Lock acquired"
            );
            Ok(LockGrant {
                scope,
                resource_id: target.resource_id.clone(),
                holder,
                decision,
            })
        }
        LockOutcome::Denied(holder) => Err(AppError::Core(CoreError::Locked {
            locked_by: holder.locked_by,
            locked_at: holder.locked_at,
        })),
        LockOutcome::NotFound => Err(AppError::not_found(
            target.kind.entity(),
            target.resource_id.clone(),
        )),
    }
}

/// Release the lock on `target` if `owner_id` holds it.
///
/// Best-effort: storage failures are logged and reported as `false`.
pub async fn release(state: &AppState, target: &LockTarget, owner_id: &str) -> bool {
    let scope = state.lock_scope(target.kind);
    let released =
        ResourceLockRepo::release_best_effort(&state.pool, &scope, &target.resource_id, owner_id)
            .await;
    if released {
        tracing::info!(
            owner_id,
            resource_kind = %target.kind,
            resource_id = %target.resource_id,
            "Lock released"
        );
    }
    released
}

/// Proof that the requesting owner holds a fresh lock on one resource.
#[derive(Debug)]
#[must_use = "a permit should be finished after the mutation succeeds"]
pub struct MutationPermit {
    grant: LockGrant,
}

impl MutationPermit {
    /// Validate the identifiers, then acquire the lock.
    ///
    /// Blank identifiers are rejected before the database is touched.
    pub async fn enter(
        state: &AppState,
        kind: ResourceKind,
        resource_id: &str,
        owner_id: &str,
    ) -> AppResult<Self> {
        validate_resource_id(resource_id).map_err(AppError::validation)?;
        let owner_id = validate_owner_id(owner_id).map_err(AppError::validation)?;

        let target = LockTarget {
            kind,
            resource_id: resource_id.to_string(),
        };
        let grant = acquire(state, &target, owner_id).await?;
        Ok(Self { grant })
    }

    /// Call after a successful update. Releases the lock only when the
    /// policy enables auto-release. Returns whether the lock was released.
    pub async fn finish_update(self, state: &AppState) -> bool {
        if !state.config.locks.auto_release_on_mutate {
            return false;
        }
        ResourceLockRepo::release_best_effort(
            &state.pool,
            &self.grant.scope,
            &self.grant.resource_id,
            &self.grant.holder.locked_by,
        )
        .await
    }

    /// Call after a successful delete. The lock columns went away with the
    /// row, so there is nothing to release.
    pub fn finish_delete(self) {
        tracing::debug!(
            resource_kind = %self.grant.scope.kind,
            resource_id = %self.grant.resource_id,
            "Lock dropped with deleted row"
        );
    }
}
