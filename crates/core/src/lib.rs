//! `qsadmin-core`: domain foundation building blocks.
//!
//! Pure domain primitives shared by every entity family: typed ids,
//! optimistic-concurrency versions, the repository seam and the error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod memory;
pub mod repository;
pub mod validation;

pub use entity::{Entity, Version};
pub use error::{DomainError, DomainResult, FieldError};
pub use id::{ProductId, RoleId, UserId};
pub use memory::InMemoryRepository;
pub use repository::Repository;
