//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod lock_repo;
pub mod product_repo;
pub mod sale_repo;

pub use lock_repo::ResourceLockRepo;
pub use product_repo::ProductRepo;
pub use sale_repo::SaleRepo;
