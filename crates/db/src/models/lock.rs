//! Lock request DTOs and lock manager outcomes.

use serde::Deserialize;
use stockroom_core::locking::{LockDecision, LockHolder, ResourceKind};

/// DTO for acquiring or releasing a lock.
///
/// The kind is explicit via `resource_kind` or inferred from which of
/// `product_id` / `transaction_id` is present. `owner_id` falls back to the
/// `X-Session-ID` header when omitted. The camelCase spellings used by the
/// browser client are accepted as well.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockRequest {
    #[serde(default, alias = "resourceKind")]
    pub resource_kind: Option<ResourceKind>,
    #[serde(default, alias = "resourceId")]
    pub resource_id: Option<String>,
    #[serde(default, alias = "productId")]
    pub product_id: Option<String>,
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(default, alias = "ownerId")]
    pub owner_id: Option<String>,
}

/// Outcome of an acquire attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Granted {
        holder: LockHolder,
        decision: LockDecision,
    },
    Denied(LockHolder),
    NotFound,
}

/// Lock columns of a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Missing,
    Unlocked,
    Held(LockHolder),
}
