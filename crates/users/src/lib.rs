//! `qsadmin-users`: user and role administration.
//!
//! Users carry role ids; roles carry granted functions. Every role mutation
//! republishes the permission snapshot used by the request pipeline.

pub mod dto;
pub mod role;
pub mod role_service;
pub mod user;
pub mod user_service;

pub use dto::{
    RoleGrantDto, RoleInputDto, RoleOutputDto, RoleUpdateInputDto, UserInputDto, UserOutputDto,
    UserUpdateInputDto,
};
pub use role::Role;
pub use role_service::RoleService;
pub use user::{User, UserStatus};
pub use user_service::UserService;
