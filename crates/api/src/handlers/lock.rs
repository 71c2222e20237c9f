//! Handlers for acquiring, releasing, and inspecting record locks.
//!
//! These are what the editing UI calls: acquire when the user opens a row
//! for editing, release on save, cancel, or teardown.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use stockroom_core::locking::{
    validate_owner_id, validate_resource_id, LockDecision, LockTarget, ResourceKind,
};
use stockroom_core::types::Timestamp;
use stockroom_db::models::lock::{LockRequest, LockState};
use stockroom_db::repositories::ResourceLockRepo;

use crate::error::{AppError, AppResult};
use crate::gateway;
use crate::middleware::session::SessionOwner;
use crate::response::{DataResponse, SuccessResponse};
use crate::state::AppState;

/// Payload of a granted lock.
#[derive(Debug, Serialize)]
pub struct LockGranted {
    pub resource_kind: ResourceKind,
    pub resource_id: String,
    pub locked_by: String,
    pub locked_at: Timestamp,
    /// `true` when the caller already held the lock and only refreshed it.
    pub refreshed: bool,
}

/// Payload of a released lock.
#[derive(Debug, Serialize)]
pub struct LockReleased {
    pub resource_kind: ResourceKind,
    pub resource_id: String,
    pub released: bool,
}

/// Current lock status of one resource.
#[derive(Debug, Serialize)]
pub struct LockStatus {
    pub resource_kind: ResourceKind,
    pub resource_id: String,
    pub locked_by: Option<String>,
    pub locked_at: Option<Timestamp>,
    pub is_locked_by_me: bool,
}

/// Resolve target and owner from a lock request. The body's `owner_id`
/// wins over the `X-Session-ID` header.
fn resolve(input: &LockRequest, session: Option<&SessionOwner>) -> AppResult<(LockTarget, String)> {
    let owner_id = match (&input.owner_id, session) {
        (Some(owner_id), _) => validate_owner_id(owner_id)
            .map_err(AppError::validation)?
            .to_string(),
        (None, Some(session)) => session.owner_id.clone(),
        (None, None) => return Err(AppError::validation("owner_id is required")),
    };

    let target = LockTarget::resolve(
        input.resource_kind,
        input.resource_id.as_deref(),
        input.product_id.as_deref(),
        input.transaction_id.as_deref(),
    )
    .map_err(AppError::validation)?;

    Ok((target, owner_id))
}

/// POST /api/v1/locks
///
/// Acquire or refresh a lock. Returns 423 with the current holder when
/// another session holds a fresh lock, 404 when the resource is missing.
pub async fn acquire_lock(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
    payload: Result<Json<LockRequest>, JsonRejection>,
) -> AppResult<Json<SuccessResponse<LockGranted>>> {
    let Json(input) = payload?;
    let (target, owner_id) = resolve(&input, session.as_ref())?;

    let grant = gateway::acquire(&state, &target, &owner_id).await?;

    Ok(Json(SuccessResponse::new(LockGranted {
        resource_kind: target.kind,
        resource_id: target.resource_id,
        locked_by: grant.holder.locked_by,
        locked_at: grant.holder.locked_at,
        refreshed: matches!(grant.decision, LockDecision::Refresh),
    })))
}

/// DELETE /api/v1/locks
///
/// Release a lock held by the caller. Returns 404 when the resource does
/// not exist or is not locked by the caller.
pub async fn release_lock(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
    payload: Result<Json<LockRequest>, JsonRejection>,
) -> AppResult<Json<SuccessResponse<LockReleased>>> {
    let Json(input) = payload?;
    let (target, owner_id) = resolve(&input, session.as_ref())?;

    if !gateway::release(&state, &target, &owner_id).await {
        return Err(AppError::not_found("Lock", target.resource_id));
    }

    Ok(Json(SuccessResponse::new(LockReleased {
        resource_kind: target.kind,
        resource_id: target.resource_id,
        released: true,
    })))
}

/// GET /api/v1/locks/{resource_kind}/{resource_id}
///
/// Clears an expired lock first, then reports the holder (if any).
pub async fn get_lock_status(
    State(state): State<AppState>,
    session: Option<SessionOwner>,
    Path((resource_kind, resource_id)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<LockStatus>>> {
    let kind: ResourceKind = resource_kind.parse().map_err(AppError::validation)?;
    validate_resource_id(&resource_id).map_err(AppError::validation)?;

    let scope = state.lock_scope(kind);
    let now = state.now();
    ResourceLockRepo::expire_stale(&state.pool, &scope, &resource_id, now).await;

    let holder = match ResourceLockRepo::state(&state.pool, &scope, &resource_id).await? {
        LockState::Missing => return Err(AppError::not_found(kind.entity(), resource_id)),
        LockState::Unlocked => None,
        LockState::Held(holder) if holder.is_expired(now, scope.expiry) => None,
        LockState::Held(holder) => Some(holder),
    };

    let is_locked_by_me = match (&holder, &session) {
        (Some(holder), Some(session)) => holder.is_held_by(&session.owner_id),
        _ => false,
    };

    Ok(Json(DataResponse {
        data: LockStatus {
            resource_kind: kind,
            resource_id,
            locked_by: holder.as_ref().map(|h| h.locked_by.clone()),
            locked_at: holder.map(|h| h.locked_at),
            is_locked_by_me,
        },
    }))
}
