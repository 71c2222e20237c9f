//! Domain building blocks shared by the database and HTTP layers.
//!
//! This crate has no internal dependencies: it holds the resource-kind
//! dispatch table, the lock policy and decision logic, the clock
//! abstraction, identifier generation, and input validation.

pub mod clock;
pub mod error;
pub mod ids;
pub mod inventory;
pub mod locking;
pub mod types;
