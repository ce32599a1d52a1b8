//! Application context: everything a request needs, assembled once at startup.

use std::sync::Arc;

use thiserror::Error;

use qsadmin_auth::{FunctionRegistry, Hs256JwtValidator, JwtValidator, PermissionCache, RegistryError};
use qsadmin_core::DomainError;
use qsadmin_infra::{InfraError, Repositories};
use qsadmin_products::ProductService;
use qsadmin_users::{RoleService, UserService};

use crate::app::routes;
use crate::config::AppConfig;

/// Name of the role seeded with every registered function.
pub const ADMIN_ROLE: &str = "Administrator";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("function registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("loading permissions failed: {0}")]
    Permissions(#[from] DomainError),
}

/// Shared, immutable-after-build application state.
pub struct AppContext {
    pub config: AppConfig,
    pub validator: Arc<dyn JwtValidator>,
    pub registry: Arc<FunctionRegistry>,
    pub cache: Arc<PermissionCache>,
    pub products: ProductService,
    pub users: UserService,
    pub roles: RoleService,
}

impl AppContext {
    /// Connect the configured back-end and wire services.
    pub async fn build(config: AppConfig) -> Result<Arc<Self>, StartupError> {
        let repos = Repositories::connect(&config.database).await?;
        Self::with_repositories(config, repos).await
    }

    /// Wire services over existing repositories, then publish the first
    /// permission snapshot (seeding the admin role if configured).
    pub async fn with_repositories(config: AppConfig, repos: Repositories) -> Result<Arc<Self>, StartupError> {
        let registry = Arc::new(routes::function_registry()?);
        let cache = Arc::new(PermissionCache::default());
        let validator: Arc<dyn JwtValidator> = Arc::new(Hs256JwtValidator::new(config.jwt.clone()));

        let products = ProductService::new(repos.products.clone());
        let users = UserService::new(repos.users.clone(), repos.roles.clone());
        let roles = RoleService::new(repos.roles, repos.users, registry.clone(), cache.clone());

        if config.seed_admin_role {
            let id = roles.ensure_role_with_all(ADMIN_ROLE).await?;
            tracing::info!(role_id = %id, functions = registry.len(), "administrator role seeded");
        } else {
            roles.rebuild_permissions().await?;
        }

        Ok(Arc::new(Self {
            config,
            validator,
            registry,
            cache,
            products,
            users,
            roles,
        }))
    }
}
