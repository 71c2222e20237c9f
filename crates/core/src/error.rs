use crate::types::Timestamp;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Resource is locked by {locked_by} since {locked_at}")]
    Locked {
        locked_by: String,
        locked_at: Timestamp,
    },

    #[error("Referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i32,
        available: i32,
    },
}
