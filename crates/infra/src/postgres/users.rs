use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use qsadmin_core::{DomainError, DomainResult, Entity, Repository, RoleId, UserId, Version};
use qsadmin_users::{User, UserStatus};

use super::{delete_by_id, from_db, missed_update, storage_error, to_db};

const TABLE: &str = "users";

/// Users with their role ids stored as a `UUID[]` column.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode(row: &PgRow) -> DomainResult<User> {
    let get = |e| storage_error("user.decode", e);
    let status: String = row.try_get("status").map_err(get)?;
    let status = status
        .parse::<UserStatus>()
        .map_err(|e| DomainError::storage(e.to_string()))?;
    let role_ids: Vec<Uuid> = row.try_get("role_ids").map_err(get)?;
    Ok(User::restore(
        UserId::from_uuid(row.try_get("id").map_err(get)?),
        row.try_get("user_name").map_err(get)?,
        row.try_get("nick_name").map_err(get)?,
        status,
        row.try_get("remark").map_err(get)?,
        role_ids.into_iter().map(RoleId::from_uuid).collect(),
        Version::from(from_db("version", row.try_get("version").map_err(get)?)?),
        row.try_get("created_at").map_err(get)?,
        row.try_get("updated_at").map_err(get)?,
    ))
}

fn role_uuids(user: &User) -> Vec<Uuid> {
    user.role_ids().iter().map(|r| *r.as_uuid()).collect()
}

#[async_trait]
impl Repository<User> for PgUserRepository {
    async fn list(&self) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_name, nick_name, status, remark, role_ids, version, created_at, updated_at
            FROM users ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("user.list", e))?;
        rows.iter().map(decode).collect()
    }

    async fn get(&self, id: UserId) -> DomainResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_name, nick_name, status, remark, role_ids, version, created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("user.get", e))?;
        row.as_ref().map(decode).transpose()
    }

    async fn insert(&self, user: User) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, user_name, nick_name, status, remark, role_ids, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.user_name())
        .bind(user.nick_name())
        .bind(user.status().as_str())
        .bind(user.remark())
        .bind(role_uuids(&user))
        .bind(to_db("version", user.version().get())?)
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("user.insert", e))?;
        Ok(())
    }

    async fn update(&self, mut user: User, expected: Version) -> DomainResult<User> {
        let next = expected.next();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET user_name = $3, nick_name = $4, status = $5, remark = $6, role_ids = $7,
                updated_at = $8, version = $9
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(to_db("version", expected.get())?)
        .bind(user.user_name())
        .bind(user.nick_name())
        .bind(user.status().as_str())
        .bind(user.remark())
        .bind(role_uuids(&user))
        .bind(user.updated_at())
        .bind(to_db("version", next.get())?)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("user.update", e))?;

        if result.rows_affected() == 0 {
            return Err(missed_update(&self.pool, TABLE, User::KIND, *user.id().as_uuid(), expected).await);
        }
        user.set_version(next);
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> DomainResult<()> {
        delete_by_id(&self.pool, TABLE, User::KIND, *id.as_uuid()).await
    }
}
