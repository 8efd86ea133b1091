//! Persistence implementations

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod database;

pub use memory::InMemoryCallStore;
#[cfg(feature = "postgres")]
pub use database::{create_pool, mask_password, run_migrations};
#[cfg(feature = "postgres")]
pub use postgres::PgCallStore;
