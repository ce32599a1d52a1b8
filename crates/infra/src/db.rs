//! Back-end selection.

use std::sync::Arc;

use thiserror::Error;

use qsadmin_core::{InMemoryRepository, Repository};
use qsadmin_products::Product;
use qsadmin_users::{Role, User};

use crate::postgres::{self, PgProductRepository, PgRoleRepository, PgUserRepository};

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("unknown database backend '{0}' (expected 'memory' or 'postgres')")]
    UnknownBackend(String),

    #[error("a database url is required for the postgres backend")]
    MissingUrl,

    #[error("postgres connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema bootstrap failed: {0}")]
    Schema(#[source] sqlx::Error),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DbBackend {
    #[default]
    Memory,
    Postgres,
}

impl core::str::FromStr for DbBackend {
    type Err = InfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(InfraError::UnknownBackend(other.to_string())),
        }
    }
}

impl core::fmt::Display for DbBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub backend: DbBackend,
    pub url: Option<String>,
    pub max_connections: u32,
}

// The url may carry credentials.
impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// One repository handle per entity family, all on the same back-end.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn Repository<Product>>,
    pub users: Arc<dyn Repository<User>>,
    pub roles: Arc<dyn Repository<Role>>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(InMemoryRepository::<Product>::new()),
            users: Arc::new(InMemoryRepository::<User>::new()),
            roles: Arc::new(InMemoryRepository::<Role>::new()),
        }
    }

    /// Open the configured back-end. Postgres also gets its schema bootstrapped.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, InfraError> {
        match config.backend {
            DbBackend::Memory => {
                tracing::info!(backend = %config.backend, "using in-memory repositories");
                Ok(Self::in_memory())
            }
            DbBackend::Postgres => {
                let url = config.url.as_deref().ok_or(InfraError::MissingUrl)?;
                let pool = postgres::connect_pool(url, config.max_connections).await?;
                postgres::bootstrap_schema(&pool).await?;
                tracing::info!(
                    backend = %config.backend,
                    max_connections = config.max_connections,
                    "connected to postgres"
                );
                Ok(Self {
                    products: Arc::new(PgProductRepository::new(pool.clone())),
                    users: Arc::new(PgUserRepository::new(pool.clone())),
                    roles: Arc::new(PgRoleRepository::new(pool)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!("Memory".parse::<DbBackend>().unwrap(), DbBackend::Memory);
        assert_eq!("postgresql".parse::<DbBackend>().unwrap(), DbBackend::Postgres);
        assert!(matches!("mysql".parse::<DbBackend>(), Err(InfraError::UnknownBackend(_))));
    }

    #[test]
    fn debug_output_hides_the_url() {
        let cfg = DatabaseConfig {
            backend: DbBackend::Postgres,
            url: Some("postgres://admin:secret@db/qs".into()),
            max_connections: 5,
        };
        assert!(!format!("{cfg:?}").contains("secret"));
    }

    #[tokio::test]
    async fn postgres_without_url_is_rejected() {
        let cfg = DatabaseConfig {
            backend: DbBackend::Postgres,
            url: None,
            max_connections: 5,
        };
        assert!(matches!(Repositories::connect(&cfg).await, Err(InfraError::MissingUrl)));
    }

    #[tokio::test]
    async fn memory_backend_starts_empty() {
        let cfg = DatabaseConfig {
            backend: DbBackend::Memory,
            url: None,
            max_connections: 1,
        };
        let repos = Repositories::connect(&cfg).await.unwrap();
        assert!(repos.products.list().await.unwrap().is_empty());
        assert!(repos.roles.list().await.unwrap().is_empty());
    }
}
