//! Advisory record locking: resource kinds, expiry policy, and the
//! grant/deny decision.
//!
//! A lock is nothing more than the `locked_by` / `locked_at` column pair on
//! the resource row itself. This module holds the pure logic; the database
//! layer applies it under a row-exclusive read (`SELECT ... FOR UPDATE`).
//!
//! Expiry is pull-based: a lock is stale once `now - locked_at` exceeds the
//! kind's threshold, and that predicate is evaluated wherever a lock is read
//! or contended. There is no background sweeper.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Expiry thresholds
// ---------------------------------------------------------------------------

/// Short lock expiry in seconds (10 seconds).
pub const SHORT_LOCK_EXPIRY_SECS: i64 = 10;

/// Long lock expiry in seconds (5 minutes).
pub const LONG_LOCK_EXPIRY_SECS: i64 = 300;

/// Upper bound accepted from configuration for any expiry (24 hours).
pub const MAX_LOCK_EXPIRY_SECS: i64 = 86_400;

/// Maximum accepted length of an owner token.
pub const MAX_OWNER_ID_LEN: usize = 128;

/// Maximum accepted length of a resource identifier.
pub const MAX_RESOURCE_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// The two lockable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Product,
    Transaction,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Product, ResourceKind::Transaction];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Product => "product",
            ResourceKind::Transaction => "transaction",
        }
    }

    /// Backing table.
    pub fn table(self) -> &'static str {
        match self {
            ResourceKind::Product => "products",
            ResourceKind::Transaction => "sales",
        }
    }

    /// Primary key column of the backing table.
    pub fn id_column(self) -> &'static str {
        "id"
    }

    /// Human-readable entity name used in error messages.
    pub fn entity(self) -> &'static str {
        match self {
            ResourceKind::Product => "Product",
            ResourceKind::Transaction => "Transaction",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(ResourceKind::Product),
            "transaction" => Ok(ResourceKind::Transaction),
            other => Err(format!(
                "Invalid resource_kind '{other}'. Must be one of: product, transaction"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy and scope
// ---------------------------------------------------------------------------

/// Lock behaviour knobs, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub product_expiry_secs: i64,
    pub transaction_expiry_secs: i64,
    /// Release the lock after a successful gated update. Off by default:
    /// the editing session keeps its lock until an explicit unlock or expiry.
    pub auto_release_on_mutate: bool,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            product_expiry_secs: LONG_LOCK_EXPIRY_SECS,
            transaction_expiry_secs: LONG_LOCK_EXPIRY_SECS,
            auto_release_on_mutate: false,
        }
    }
}

impl LockPolicy {
    pub fn expiry_secs(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Product => self.product_expiry_secs,
            ResourceKind::Transaction => self.transaction_expiry_secs,
        }
    }

    /// Resolve everything the lock manager needs for `kind` into one value.
    pub fn scope(&self, kind: ResourceKind) -> LockScope {
        LockScope {
            kind,
            table: kind.table(),
            id_column: kind.id_column(),
            expiry: Duration::seconds(self.expiry_secs(kind)),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for kind in ResourceKind::ALL {
            validate_expiry_secs(self.expiry_secs(kind))
                .map_err(|e| format!("{kind} lock expiry: {e}"))?;
        }
        Ok(())
    }
}

/// Validate a configured expiry threshold.
pub fn validate_expiry_secs(secs: i64) -> Result<(), String> {
    if secs < 1 {
        return Err(format!("must be at least 1 second, got {secs}"));
    }
    if secs > MAX_LOCK_EXPIRY_SECS {
        return Err(format!(
            "must be at most {MAX_LOCK_EXPIRY_SECS} seconds, got {secs}"
        ));
    }
    Ok(())
}

/// Kind-specific lock parameters: where the lock columns live and how long
/// a lock stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockScope {
    pub kind: ResourceKind,
    pub table: &'static str,
    pub id_column: &'static str,
    pub expiry: Duration,
}

impl LockScope {
    /// Locks set before this instant are stale.
    pub fn stale_before(&self, now: Timestamp) -> Timestamp {
        now - self.expiry
    }
}

// ---------------------------------------------------------------------------
// Holder and decision
// ---------------------------------------------------------------------------

/// The current holder of a resource lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub locked_by: String,
    pub locked_at: Timestamp,
}

impl LockHolder {
    /// Build from the nullable column pair. A half-set pair is treated as
    /// unlocked; the schema forbids it anyway.
    pub fn from_columns(locked_by: Option<String>, locked_at: Option<Timestamp>) -> Option<Self> {
        match (locked_by, locked_at) {
            (Some(locked_by), Some(locked_at)) => Some(Self {
                locked_by,
                locked_at,
            }),
            _ => None,
        }
    }

    pub fn age(&self, now: Timestamp) -> Duration {
        now - self.locked_at
    }

    pub fn is_expired(&self, now: Timestamp, expiry: Duration) -> bool {
        self.age(now) > expiry
    }

    pub fn is_held_by(&self, owner_id: &str) -> bool {
        self.locked_by == owner_id
    }
}

/// Outcome of evaluating an acquire attempt against the current holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockDecision {
    /// Nobody held the lock.
    Fresh,
    /// The requester already held it; `locked_at` is refreshed.
    Refresh,
    /// A different owner held it but the lock had expired.
    Takeover(LockHolder),
    /// A different owner holds a fresh lock.
    Deny(LockHolder),
}

impl LockDecision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, LockDecision::Deny(_))
    }
}

/// Decide whether `owner_id` may take the lock at `now`.
pub fn decide(
    current: Option<&LockHolder>,
    owner_id: &str,
    now: Timestamp,
    expiry: Duration,
) -> LockDecision {
    match current {
        None => LockDecision::Fresh,
        Some(holder) if holder.is_held_by(owner_id) => LockDecision::Refresh,
        Some(holder) if holder.is_expired(now, expiry) => LockDecision::Takeover(holder.clone()),
        Some(holder) => LockDecision::Deny(holder.clone()),
    }
}

// ---------------------------------------------------------------------------
// Request resolution and validation
// ---------------------------------------------------------------------------

/// A fully resolved lock target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTarget {
    pub kind: ResourceKind,
    pub resource_id: String,
}

impl LockTarget {
    /// Resolve the kind and id from a lock request.
    ///
    /// An explicit `kind` wins and pairs with `resource_id` or the matching
    /// kind-specific field. Without it, `transaction_id` implies a
    /// transaction and `product_id` implies a product.
    pub fn resolve(
        kind: Option<ResourceKind>,
        resource_id: Option<&str>,
        product_id: Option<&str>,
        transaction_id: Option<&str>,
    ) -> Result<Self, String> {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }

        let resource_id = non_empty(resource_id);
        let product_id = non_empty(product_id);
        let transaction_id = non_empty(transaction_id);

        let (kind, id) = match kind {
            Some(ResourceKind::Product) => (ResourceKind::Product, resource_id.or(product_id)),
            Some(ResourceKind::Transaction) => {
                (ResourceKind::Transaction, resource_id.or(transaction_id))
            }
            None => match (transaction_id, product_id) {
                (Some(id), _) => (ResourceKind::Transaction, Some(id)),
                (None, Some(id)) => (ResourceKind::Product, Some(id)),
                (None, None) => {
                    return Err(
                        "resource_kind is required when neither product_id nor transaction_id is given"
                            .into(),
                    )
                }
            },
        };

        let id = id.ok_or_else(|| format!("A {kind} identifier is required"))?;
        validate_resource_id(id)?;
        Ok(Self {
            kind,
            resource_id: id.to_string(),
        })
    }
}

/// Validate an owner token. Returns the trimmed token.
pub fn validate_owner_id(owner_id: &str) -> Result<&str, String> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err("owner_id is required".into());
    }
    if owner_id.len() > MAX_OWNER_ID_LEN {
        return Err(format!(
            "owner_id must be at most {MAX_OWNER_ID_LEN} characters"
        ));
    }
    Ok(owner_id)
}

/// Validate a resource identifier.
pub fn validate_resource_id(resource_id: &str) -> Result<(), String> {
    if resource_id.trim().is_empty() {
        return Err("resource id is required".into());
    }
    if resource_id.len() > MAX_RESOURCE_ID_LEN {
        return Err(format!(
            "resource id must be at most {MAX_RESOURCE_ID_LEN} characters"
        ));
    }
    Ok(())
}
