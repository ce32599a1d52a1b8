//! Products: catalog entity, its DTOs and the product service.
//!
//! Business rules only; storage is reached through `qsadmin_core::Repository`.

pub mod dto;
pub mod product;
pub mod service;

pub use dto::{ProductInputDto, ProductOutputDto, ProductUpdateInputDto};
pub use product::Product;
pub use service::ProductService;
