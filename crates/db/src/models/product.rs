//! Product (stock item) model and DTOs.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::locking::LockHolder;
use stockroom_core::types::Timestamp;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub quantity: i32,
    pub locked_by: Option<String>,
    pub locked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    pub fn lock_holder(&self) -> Option<LockHolder> {
        LockHolder::from_columns(self.locked_by.clone(), self.locked_at)
    }

    /// Drop lock fields older than `expiry` from this in-memory copy.
    pub fn mask_expired_lock(&mut self, now: Timestamp, expiry: Duration) {
        if self
            .lock_holder()
            .is_some_and(|holder| holder.is_expired(now, expiry))
        {
            self.locked_by = None;
            self.locked_at = None;
        }
    }
}

/// DTO for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub unit: String,
    pub quantity: i32,
}

/// DTO for updating a product. Every editable field is replaced.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub unit: String,
    pub quantity: i32,
}

/// Result of a product delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductDeletion {
    Deleted,
    NotFound,
    /// Sales still reference the product.
    Referenced(i64),
}
