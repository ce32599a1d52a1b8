use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use qsadmin_core::{DomainError, DomainResult, Entity, FieldError, Repository, RoleId, UserId};

use crate::user::UserFields;
use crate::{Role, User, UserInputDto, UserOutputDto, UserUpdateInputDto};

/// Get / Add / Update / Delete over user accounts.
///
/// Role ids on input must name existing roles.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn Repository<User>>,
    roles: Arc<dyn Repository<Role>>,
}

impl UserService {
    pub fn new(users: Arc<dyn Repository<User>>, roles: Arc<dyn Repository<Role>>) -> Self {
        Self { users, roles }
    }

    pub async fn get(&self) -> DomainResult<Vec<UserOutputDto>> {
        Ok(self.users.list().await?.into_iter().map(UserOutputDto::from).collect())
    }

    pub async fn get_by_id(&self, id: UserId) -> DomainResult<UserOutputDto> {
        self.users
            .get(id)
            .await?
            .map(UserOutputDto::from)
            .ok_or_else(|| DomainError::not_found(User::KIND, id))
    }

    pub async fn add(&self, dto: UserInputDto) -> DomainResult<UserId> {
        self.check(&dto, &dto.role_ids).await?;

        let id = UserId::new();
        let user = User::create(
            id,
            UserFields {
                user_name: &dto.user_name,
                nick_name: dto.nick_name.as_deref(),
                status: dto.status,
                remark: dto.remark.as_deref(),
                role_ids: &dto.role_ids,
            },
            Utc::now(),
        );
        self.users.insert(user).await?;

        tracing::info!(user_id = %id, roles = dto.role_ids.len(), "user added");
        Ok(id)
    }

    pub async fn update(&self, dto: UserUpdateInputDto) -> DomainResult<UserOutputDto> {
        self.check(&dto, &dto.role_ids).await?;

        let current = self
            .users
            .get(dto.id)
            .await?
            .ok_or_else(|| DomainError::not_found(User::KIND, dto.id))?;
        if current.version() != dto.version {
            return Err(DomainError::conflict(User::KIND, dto.id, dto.version, current.version()));
        }

        let revised = current.revise(
            UserFields {
                user_name: &dto.user_name,
                nick_name: dto.nick_name.as_deref(),
                status: dto.status,
                remark: dto.remark.as_deref(),
                role_ids: &dto.role_ids,
            },
            Utc::now(),
        );
        let stored = self.users.update(revised, dto.version).await?;

        tracing::info!(user_id = %dto.id, version = %stored.version(), "user updated");
        Ok(stored.into())
    }

    pub async fn delete(&self, id: UserId) -> DomainResult<()> {
        self.users.delete(id).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Field rules plus role existence, reported together.
    async fn check(&self, dto: &impl Validate, role_ids: &[RoleId]) -> DomainResult<()> {
        let mut fields = match dto.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match DomainError::from(errors) {
                DomainError::Validation(fields) => fields,
                other => return Err(other),
            },
        };

        for role in role_ids {
            if self.roles.get(*role).await?.is_none() {
                fields.push(FieldError::new("role_ids", format!("unknown role '{role}'")));
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsadmin_core::{InMemoryRepository, Version};

    use crate::UserStatus;

    struct Fixture {
        svc: UserService,
        roles: Arc<InMemoryRepository<Role>>,
    }

    fn fixture() -> Fixture {
        let roles = Arc::new(InMemoryRepository::<Role>::new());
        let svc = UserService::new(Arc::new(InMemoryRepository::<User>::new()), roles.clone());
        Fixture { svc, roles }
    }

    fn input(name: &str, role_ids: Vec<RoleId>) -> UserInputDto {
        UserInputDto {
            user_name: name.into(),
            nick_name: None,
            status: UserStatus::Enabled,
            remark: None,
            role_ids,
        }
    }

    async fn seed_role(f: &Fixture) -> RoleId {
        let role = Role::create(RoleId::new(), "Editors", None, [], Utc::now());
        let id = role.id();
        f.roles.insert(role).await.unwrap();
        id
    }

    #[tokio::test]
    async fn add_with_existing_role_is_retrievable() {
        let f = fixture();
        let role = seed_role(&f).await;
        let id = f.svc.add(input("alice", vec![role])).await.unwrap();

        let out = f.svc.get_by_id(id).await.unwrap();
        assert_eq!(out.user_name, "alice");
        assert_eq!(out.role_ids, vec![role]);
        assert_eq!(f.svc.get().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_reports_blank_name_and_unknown_role_together() {
        let f = fixture();
        let err = f.svc.add(input(" ", vec![RoleId::new()])).await.unwrap_err();

        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["user_name", "role_ids"]);
        assert!(f.svc.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_checks_version_then_bumps_once() {
        let f = fixture();
        let id = f.svc.add(input("alice", vec![])).await.unwrap();

        let dto = UserUpdateInputDto {
            id,
            user_name: "alice".into(),
            nick_name: Some("Al".into()),
            status: UserStatus::Disabled,
            remark: None,
            role_ids: vec![],
            version: Version::INITIAL,
        };
        let out = f.svc.update(dto.clone()).await.unwrap();
        assert_eq!(out.version, Version::from(2));
        assert_eq!(out.status, UserStatus::Disabled);

        let err = f.svc.update(dto).await.unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let f = fixture();
        assert!(matches!(f.svc.delete(UserId::new()).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn dangling_role_id_reads_back_and_must_be_dropped_on_update() {
        let f = fixture();
        let role = seed_role(&f).await;
        let id = f.svc.add(input("alice", vec![role])).await.unwrap();
        // Role removed after the user write, bypassing role deletion's cleanup.
        f.roles.delete(role).await.unwrap();

        assert_eq!(f.svc.get_by_id(id).await.unwrap().role_ids, vec![role]);

        let mut dto = UserUpdateInputDto {
            id,
            user_name: "alice".into(),
            nick_name: None,
            status: UserStatus::Enabled,
            remark: None,
            role_ids: vec![role],
            version: Version::INITIAL,
        };
        let err = f.svc.update(dto.clone()).await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "role_ids");

        dto.role_ids.clear();
        assert!(f.svc.update(dto).await.unwrap().role_ids.is_empty());
    }
}
