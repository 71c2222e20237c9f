//! Liveness plus the lock policy this instance enforces.
//!
//! Clients use `locks` to size their heartbeat: an editing session must
//! re-acquire before the expiry for its resource kind runs out.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use stockroom_core::locking::LockPolicy;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when Postgres cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub locks: LockPolicyView,
}

/// Wire form of [`LockPolicy`].
#[derive(Serialize)]
pub struct LockPolicyView {
    pub product_expiry_secs: i64,
    pub transaction_expiry_secs: i64,
    pub auto_release_on_mutate: bool,
}

impl From<LockPolicy> for LockPolicyView {
    fn from(policy: LockPolicy) -> Self {
        Self {
            product_expiry_secs: policy.product_expiry_secs,
            transaction_expiry_secs: policy.transaction_expiry_secs,
            auto_release_on_mutate: policy.auto_release_on_mutate,
        }
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match stockroom_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        locks: state.config.locks.into(),
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
