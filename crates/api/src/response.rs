//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "success": true, "data": T }`, used by the lock endpoints.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A row annotated with whether the caller's session holds its lock.
///
/// The row's own fields are flattened, so `locked_by` / `locked_at` sit
/// next to `is_locked_by_me`.
#[derive(Debug, Serialize)]
pub struct LockAware<T: Serialize> {
    #[serde(flatten)]
    pub row: T,
    pub is_locked_by_me: bool,
}

impl<T: Serialize> LockAware<T> {
    pub fn new(row: T, locked_by: Option<&str>, session: Option<&str>) -> Self {
        let is_locked_by_me = matches!((locked_by, session), (Some(a), Some(b)) if a == b);
        Self {
            row,
            is_locked_by_me,
        }
    }
}
