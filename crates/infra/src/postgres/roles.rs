use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use qsadmin_auth::Function;
use qsadmin_core::{DomainResult, Entity, Repository, RoleId, Version};
use qsadmin_users::Role;

use super::{delete_by_id, from_db, missed_update, storage_error, to_db};

const TABLE: &str = "roles";

/// Roles with their granted functions stored as a `TEXT[]` column.
#[derive(Debug, Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode(row: &PgRow) -> DomainResult<Role> {
    let get = |e| storage_error("role.decode", e);
    let functions: Vec<String> = row.try_get("functions").map_err(get)?;
    Ok(Role::restore(
        RoleId::from_uuid(row.try_get("id").map_err(get)?),
        row.try_get("name").map_err(get)?,
        row.try_get("description").map_err(get)?,
        functions.into_iter().map(Function::new).collect::<BTreeSet<_>>(),
        Version::from(from_db("version", row.try_get("version").map_err(get)?)?),
        row.try_get("created_at").map_err(get)?,
        row.try_get("updated_at").map_err(get)?,
    ))
}

fn function_names(role: &Role) -> Vec<String> {
    role.functions().iter().map(|f| f.as_str().to_string()).collect()
}

#[async_trait]
impl Repository<Role> for PgRoleRepository {
    async fn list(&self) -> DomainResult<Vec<Role>> {
        let rows = sqlx::query(
            "SELECT id, name, description, functions, version, created_at, updated_at FROM roles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("role.list", e))?;
        rows.iter().map(decode).collect()
    }

    async fn get(&self, id: RoleId) -> DomainResult<Option<Role>> {
        let row = sqlx::query(
            "SELECT id, name, description, functions, version, created_at, updated_at FROM roles WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("role.get", e))?;
        row.as_ref().map(decode).transpose()
    }

    async fn insert(&self, role: Role) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, description, functions, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name())
        .bind(role.description())
        .bind(function_names(&role))
        .bind(to_db("version", role.version().get())?)
        .bind(role.created_at())
        .bind(role.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("role.insert", e))?;
        Ok(())
    }

    async fn update(&self, mut role: Role, expected: Version) -> DomainResult<Role> {
        let next = expected.next();
        let result = sqlx::query(
            r#"
            UPDATE roles
            SET name = $3, description = $4, functions = $5, updated_at = $6, version = $7
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(to_db("version", expected.get())?)
        .bind(role.name())
        .bind(role.description())
        .bind(function_names(&role))
        .bind(role.updated_at())
        .bind(to_db("version", next.get())?)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("role.update", e))?;

        if result.rows_affected() == 0 {
            return Err(missed_update(&self.pool, TABLE, Role::KIND, *role.id().as_uuid(), expected).await);
        }
        role.set_version(next);
        Ok(role)
    }

    async fn delete(&self, id: RoleId) -> DomainResult<()> {
        delete_by_id(&self.pool, TABLE, Role::KIND, *id.as_uuid()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::test_support;
    use chrono::Utc;

    #[tokio::test]
    async fn functions_survive_a_round_trip() {
        let Some(pool) = test_support::pool().await else {
            return;
        };
        let repo = PgRoleRepository::new(pool);
        let role = Role::create(
            RoleId::new(),
            "Editors",
            Some("edit things"),
            [Function::new("Product.Add"), Function::new("Product.Index")],
            Utc::now(),
        );
        repo.insert(role.clone()).await.unwrap();

        let loaded = repo.get(role.id()).await.unwrap().unwrap();
        assert_eq!(loaded.functions(), role.functions());
        assert_eq!(loaded.description(), Some("edit things"));
        repo.delete(role.id()).await.unwrap();
    }
}
