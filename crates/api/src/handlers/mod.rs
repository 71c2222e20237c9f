//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `stockroom_db`, route every
//! update and delete through the lock gate, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod lock;
pub mod product;
pub mod sale;
