use std::sync::Arc;

use stockroom_core::clock::Clock;
use stockroom_core::locking::{LockScope, ResourceKind};
use stockroom_core::types::Timestamp;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: stockroom_db::DbPool,
    /// Server configuration, including the lock policy.
    pub config: Arc<ServerConfig>,
    /// Time source for lock ages.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Lock parameters for `kind` under the configured policy.
    pub fn lock_scope(&self, kind: ResourceKind) -> LockScope {
        self.config.locks.scope(kind)
    }
}
