//! Postgres-backed repositories.
//!
//! Every table carries a `version BIGINT` column. Updates are a single guarded
//! statement (`... WHERE id = $1 AND version = $2`), so the compare-and-set is
//! atomic in the database and a cancelled request never leaves a partial write.
//!
//! ## Error Mapping
//!
//! | Situation | DomainError |
//! |-----------|-------------|
//! | guarded UPDATE hit no row, row absent | `NotFound` |
//! | guarded UPDATE hit no row, row present | `ConcurrencyConflict` |
//! | DELETE hit no row | `NotFound` |
//! | any `sqlx::Error` | `Storage` |

mod products;
mod roles;
mod users;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use qsadmin_core::{DomainError, DomainResult, Version};

use crate::InfraError;

pub use products::PgProductRepository;
pub use roles::PgRoleRepository;
pub use users::PgUserRepository;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idempotent schema, applied at startup before serving requests.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        sku         TEXT NOT NULL,
        price       BIGINT NOT NULL CHECK (price >= 0),
        remark      TEXT,
        version     BIGINT NOT NULL CHECK (version >= 1),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT,
        functions   TEXT[] NOT NULL DEFAULT '{}',
        version     BIGINT NOT NULL CHECK (version >= 1),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          UUID PRIMARY KEY,
        user_name   TEXT NOT NULL,
        nick_name   TEXT,
        status      TEXT NOT NULL CHECK (status IN ('enabled', 'disabled')),
        remark      TEXT,
        role_ids    UUID[] NOT NULL DEFAULT '{}',
        version     BIGINT NOT NULL CHECK (version >= 1),
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// Open a pool. The URL is never logged; it may carry credentials.
pub async fn connect_pool(url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await
        .map_err(InfraError::Connect)
}

pub async fn bootstrap_schema(pool: &PgPool) -> Result<(), InfraError> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await.map_err(InfraError::Schema)?;
    }
    tracing::info!(tables = SCHEMA.len(), "schema ready");
    Ok(())
}

pub(crate) fn storage_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::Database(db_err) => {
            DomainError::storage(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => DomainError::storage(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => {
            DomainError::storage(format!("timed out acquiring a connection in {operation}"))
        }
        other => DomainError::storage(format!("sqlx error in {operation}: {other}")),
    }
}

pub(crate) fn to_db(field: &'static str, value: u64) -> DomainResult<i64> {
    i64::try_from(value).map_err(|_| DomainError::invalid(field, "value is out of range"))
}

pub(crate) fn from_db(column: &'static str, value: i64) -> DomainResult<u64> {
    u64::try_from(value).map_err(|_| DomainError::storage(format!("negative value in column {column}")))
}

/// Classify a guarded UPDATE that matched no row.
///
/// `table` must come from a fixed allow-list, never from input.
pub(crate) async fn missed_update(
    pool: &PgPool,
    table: &'static str,
    kind: &'static str,
    id: Uuid,
    expected: Version,
) -> DomainError {
    let sql = format!("SELECT version FROM {table} WHERE id = $1");
    match sqlx::query_scalar::<_, i64>(&sql).bind(id).fetch_optional(pool).await {
        Ok(None) => DomainError::not_found(kind, id),
        Ok(Some(actual)) => match from_db("version", actual) {
            Ok(actual) => DomainError::conflict(kind, id, expected, Version::from(actual)),
            Err(err) => err,
        },
        Err(err) => storage_error("missed_update", err),
    }
}

/// Delete by id from an allow-listed table; `NotFound` when nothing was removed.
pub(crate) async fn delete_by_id(pool: &PgPool, table: &'static str, kind: &'static str, id: Uuid) -> DomainResult<()> {
    let sql = format!("DELETE FROM {table} WHERE id = $1");
    let result = sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| storage_error("delete", e))?;
    if result.rows_affected() == 0 {
        return Err(DomainError::not_found(kind, id));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_conversions_reject_out_of_range() {
        assert_eq!(to_db("price", 42).unwrap(), 42);
        assert_eq!(to_db("price", u64::MAX).unwrap_err().field_errors()[0].field, "price");
        assert!(matches!(from_db("version", -1), Err(DomainError::Storage(_))));
    }

    #[test]
    fn sqlx_errors_become_storage_errors() {
        let err = storage_error("product.list", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            DomainError::Storage("connection pool closed in product.list".into())
        );
    }
}
