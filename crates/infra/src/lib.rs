//! Infrastructure layer: repository back-ends and database selection.
//!
//! Services only see `Arc<dyn Repository<E>>`; this crate decides whether that
//! is an in-memory map or a Postgres table.

pub mod db;
pub mod postgres;

pub use db::{DbBackend, DatabaseConfig, InfraError, Repositories};
pub use postgres::{PgProductRepository, PgRoleRepository, PgUserRepository};
pub use qsadmin_core::InMemoryRepository;
