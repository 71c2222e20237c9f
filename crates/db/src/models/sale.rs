//! Sales transaction model and DTOs.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use stockroom_core::locking::LockHolder;
use stockroom_core::types::{SaleDate, Timestamp};

/// A row from the `sales` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sale {
    pub id: String,
    pub sold_on: SaleDate,
    pub product_id: String,
    pub quantity: i32,
    pub locked_by: Option<String>,
    pub locked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Sale {
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

/// DTO for recording a sale.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSale {
    pub sold_on: SaleDate,
    pub product_id: String,
    pub quantity: i32,
}

/// DTO for rewriting a sale. Every editable field is replaced.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSale {
    pub sold_on: SaleDate,
    pub product_id: String,
    pub quantity: i32,
}

/// Result of a stock-moving sale write.
#[derive(Debug, Clone)]
pub enum SaleWrite {
    Written(Sale),
    SaleNotFound,
    ProductNotFound,
    InsufficientStock { available: i32 },
}
