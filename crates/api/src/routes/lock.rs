//! Route definitions for record locks.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::lock;
use crate::state::AppState;

/// Lock routes mounted at `/locks`.
///
/// ```text
/// POST   /                                         -> acquire_lock
/// DELETE /                                         -> release_lock
/// GET    /{resource_kind}/{resource_id}            -> get_lock_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(lock::acquire_lock).delete(lock::release_lock))
        .route(
            "/{resource_kind}/{resource_id}",
            get(lock::get_lock_status),
        )
}
