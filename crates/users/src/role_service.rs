use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use validator::Validate;

use qsadmin_auth::{Function, FunctionRegistry, PermissionCache, PermissionSnapshot};
use qsadmin_core::{DomainError, DomainResult, Entity, Repository, RoleId, Version};

use crate::{Role, RoleGrantDto, RoleInputDto, RoleOutputDto, RoleUpdateInputDto, User};

/// Attempts made to strip a deleted role from one user before giving up.
const STRIP_ATTEMPTS: usize = 3;

/// Role administration plus ownership of the permission snapshot.
///
/// Every successful mutation rebuilds the snapshot from the repository and
/// publishes it to the shared [`PermissionCache`].
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn Repository<Role>>,
    users: Arc<dyn Repository<User>>,
    registry: Arc<FunctionRegistry>,
    cache: Arc<PermissionCache>,
    rebuild_lock: Arc<Mutex<()>>,
}

impl RoleService {
    pub fn new(
        roles: Arc<dyn Repository<Role>>,
        users: Arc<dyn Repository<User>>,
        registry: Arc<FunctionRegistry>,
        cache: Arc<PermissionCache>,
    ) -> Self {
        Self {
            roles,
            users,
            registry,
            cache,
            rebuild_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get(&self) -> DomainResult<Vec<RoleOutputDto>> {
        Ok(self.roles.list().await?.into_iter().map(RoleOutputDto::from).collect())
    }

    pub async fn get_by_id(&self, id: RoleId) -> DomainResult<RoleOutputDto> {
        self.roles
            .get(id)
            .await?
            .map(RoleOutputDto::from)
            .ok_or_else(|| DomainError::not_found(Role::KIND, id))
    }

    pub async fn add(&self, dto: RoleInputDto) -> DomainResult<RoleId> {
        dto.validate()?;
        let functions = self.known_functions(&dto.functions)?;

        let id = RoleId::new();
        let role = Role::create(id, &dto.name, dto.description.as_deref(), functions, Utc::now());
        self.roles.insert(role).await?;
        self.rebuild_permissions().await?;

        tracing::info!(role_id = %id, name = %dto.name.trim(), "role added");
        Ok(id)
    }

    pub async fn update(&self, dto: RoleUpdateInputDto) -> DomainResult<RoleOutputDto> {
        dto.validate()?;
        let functions = dto.functions.as_deref().map(|f| self.known_functions(f)).transpose()?;

        let current = self.load(dto.id).await?;
        check_version(&current, dto.version)?;

        let revised = current.revise(&dto.name, dto.description.as_deref(), functions, Utc::now());
        let stored = self.roles.update(revised, dto.version).await?;
        self.rebuild_permissions().await?;

        tracing::info!(role_id = %dto.id, version = %stored.version(), "role updated");
        Ok(stored.into())
    }

    /// Delete a role and remove it from every user holding it.
    pub async fn delete(&self, id: RoleId) -> DomainResult<()> {
        self.roles.delete(id).await?;
        self.rebuild_permissions().await?;

        let stripped = self.strip_from_users(id).await?;
        tracing::info!(role_id = %id, users = stripped, "role deleted");
        Ok(())
    }

    pub async fn grant(&self, dto: RoleGrantDto) -> DomainResult<RoleOutputDto> {
        dto.validate()?;
        let function = self.known_function(&dto.function)?;
        let current = self.load(dto.role_id).await?;
        let expected = dto.version.unwrap_or_else(|| current.version());
        check_version(&current, expected)?;

        let stored = self.roles.update(current.granting(function.clone(), Utc::now()), expected).await?;
        self.rebuild_permissions().await?;

        tracing::info!(role_id = %dto.role_id, function = %function, "function granted");
        Ok(stored.into())
    }

    pub async fn revoke(&self, dto: RoleGrantDto) -> DomainResult<RoleOutputDto> {
        dto.validate()?;
        let function = self.known_function(&dto.function)?;
        let current = self.load(dto.role_id).await?;
        let expected = dto.version.unwrap_or_else(|| current.version());
        check_version(&current, expected)?;

        let stored = self.roles.update(current.revoking(&function, Utc::now()), expected).await?;
        self.rebuild_permissions().await?;

        tracing::info!(role_id = %dto.role_id, function = %function, "function revoked");
        Ok(stored.into())
    }

    /// Build a fresh snapshot from stored roles and publish it.
    ///
    /// Rebuilds are serialized, so the last published snapshot reflects the
    /// latest committed role state.
    pub async fn rebuild_permissions(&self) -> DomainResult<()> {
        let _guard = self.rebuild_lock.lock().await;
        let roles = self.roles.list().await?;
        let snapshot = PermissionSnapshot::from_grants(
            roles.into_iter().map(|r| (r.id(), r.functions().clone())),
        );
        self.cache.replace(snapshot);
        Ok(())
    }

    /// Ensure a role called `name` exists holding every registered function.
    pub async fn ensure_role_with_all(&self, name: &str) -> DomainResult<RoleId> {
        let all: BTreeSet<Function> = self.registry.functions().cloned().collect();
        let existing = self.roles.list().await?.into_iter().find(|r| r.name() == name);

        let id = match existing {
            Some(role) if role.functions() == &all => role.id(),
            Some(role) => {
                let expected = role.version();
                let revised = role.revise(role.name(), role.description(), Some(all), Utc::now());
                self.roles.update(revised, expected).await?.id()
            }
            None => {
                let role = Role::create(RoleId::new(), name, Some("all registered functions"), all, Utc::now());
                let id = role.id();
                self.roles.insert(role).await?;
                id
            }
        };
        self.rebuild_permissions().await?;

        tracing::info!(role_id = %id, name, "seed role ready");
        Ok(id)
    }

    async fn load(&self, id: RoleId) -> DomainResult<Role> {
        self.roles
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Role::KIND, id))
    }

    fn known_function(&self, name: &str) -> DomainResult<Function> {
        let function = Function::new(name.trim().to_string());
        if self.registry.contains(&function) {
            Ok(function)
        } else {
            Err(DomainError::invalid("function", format!("unknown function '{function}'")))
        }
    }

    fn known_functions(&self, functions: &[Function]) -> DomainResult<BTreeSet<Function>> {
        let unknown: Vec<_> = functions.iter().filter(|f| !self.registry.contains(f)).collect();
        if let Some(first) = unknown.first() {
            return Err(DomainError::invalid(
                "functions",
                format!("unknown function '{first}' ({} unknown)", unknown.len()),
            ));
        }
        Ok(functions.iter().cloned().collect())
    }

    async fn strip_from_users(&self, role: RoleId) -> DomainResult<usize> {
        let mut stripped = 0;
        for user in self.users.list().await? {
            if !user.role_ids().contains(&role) {
                continue;
            }
            let mut current = user;
            for attempt in 1..=STRIP_ATTEMPTS {
                let Some(next) = current.without_role(role, Utc::now()) else {
                    break;
                };
                match self.users.update(next, current.version()).await {
                    Ok(_) => {
                        stripped += 1;
                        break;
                    }
                    Err(DomainError::ConcurrencyConflict { .. }) if attempt < STRIP_ATTEMPTS => {
                        match self.users.get(current.id()).await? {
                            Some(fresh) => current = fresh,
                            None => break,
                        }
                    }
                    Err(DomainError::NotFound { .. }) => break,
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(stripped)
    }
}

fn check_version(current: &Role, expected: Version) -> DomainResult<()> {
    if current.version() == expected {
        Ok(())
    } else {
        Err(DomainError::conflict(Role::KIND, current.id(), expected, current.version()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsadmin_auth::{FunctionDescriptor, Principal};
    use qsadmin_core::{InMemoryRepository, UserId};

    use crate::user::UserFields;
    use crate::UserStatus;

    struct Fixture {
        svc: RoleService,
        users: Arc<InMemoryRepository<User>>,
        cache: Arc<PermissionCache>,
    }

    fn fixture() -> Fixture {
        let mut registry = FunctionRegistry::new();
        for action in ["Index", "Add"] {
            registry
                .register(FunctionDescriptor::area_action("Admin", "Product", action, action))
                .unwrap();
        }
        let users = Arc::new(InMemoryRepository::<User>::new());
        let cache = Arc::new(PermissionCache::default());
        let svc = RoleService::new(
            Arc::new(InMemoryRepository::<Role>::new()),
            users.clone(),
            Arc::new(registry),
            cache.clone(),
        );
        Fixture { svc, users, cache }
    }

    fn role_input(name: &str) -> RoleInputDto {
        RoleInputDto {
            name: name.into(),
            description: None,
            functions: vec![],
        }
    }

    fn grant(role_id: RoleId, function: &str) -> RoleGrantDto {
        RoleGrantDto {
            role_id,
            function: function.into(),
            version: None,
        }
    }

    fn role_update(id: RoleId, functions: Option<&[&'static str]>, version: Version) -> RoleUpdateInputDto {
        RoleUpdateInputDto {
            id,
            name: "Editors".into(),
            description: Some("content".into()),
            functions: functions.map(|names| names.iter().map(|n| Function::new(*n)).collect()),
            version,
        }
    }

    #[tokio::test]
    async fn grant_is_visible_in_the_published_snapshot() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();
        let principal = Principal::new(UserId::new(), vec![role]);
        let add = Function::new("Product.Add");

        assert!(!f.cache.load().is_granted(&principal, &add));

        let out = f.svc.grant(grant(role, "Product.Add")).await.unwrap();
        assert_eq!(out.version, Version::from(2));
        assert!(f.cache.load().is_granted(&principal, &add));

        f.svc.revoke(grant(role, "Product.Add")).await.unwrap();
        assert!(!f.cache.load().is_granted(&principal, &add));
    }

    #[tokio::test]
    async fn unknown_function_is_a_validation_error() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();

        let err = f.svc.grant(grant(role, "Nope.Nothing")).await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "function");

        let mut dto = role_input("Other");
        dto.functions = vec![Function::new("Nope.Nothing")];
        let err = f.svc.add(dto).await.unwrap_err();
        assert_eq!(err.field_errors()[0].field, "functions");
    }

    #[tokio::test]
    async fn stale_grant_version_conflicts() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();
        f.svc.grant(grant(role, "Product.Index")).await.unwrap();

        let mut stale = grant(role, "Product.Add");
        stale.version = Some(Version::INITIAL);
        assert!(matches!(
            f.svc.grant(stale).await,
            Err(DomainError::ConcurrencyConflict { .. })
        ));
        assert_eq!(f.svc.get_by_id(role).await.unwrap().functions.len(), 1);
    }

    #[tokio::test]
    async fn delete_strips_role_from_users_and_snapshot() {
        let f = fixture();
        let keep = f.svc.add(role_input("Keep")).await.unwrap();
        let gone = f.svc.add(role_input("Gone")).await.unwrap();
        f.svc.grant(grant(gone, "Product.Add")).await.unwrap();

        let user = User::create(
            UserId::new(),
            UserFields {
                user_name: "alice",
                nick_name: None,
                status: UserStatus::Enabled,
                remark: None,
                role_ids: &[keep, gone],
            },
            Utc::now(),
        );
        let user_id = user.id();
        f.users.insert(user).await.unwrap();

        f.svc.delete(gone).await.unwrap();

        let stored = f.users.get(user_id).await.unwrap().unwrap();
        assert_eq!(stored.role_ids(), &[keep]);
        assert_eq!(stored.version(), Version::from(2));
        assert_eq!(f.cache.load().role_count(), 1);
        assert!(matches!(f.svc.get_by_id(gone).await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn ensure_role_with_all_is_idempotent() {
        let f = fixture();
        let first = f.svc.ensure_role_with_all("Administrator").await.unwrap();
        let second = f.svc.ensure_role_with_all("Administrator").await.unwrap();
        assert_eq!(first, second);

        let principal = Principal::new(UserId::new(), vec![first]);
        assert_eq!(f.cache.load().effective_functions(&principal).len(), 2);
        assert_eq!(f.svc.get().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_function_set_in_the_snapshot() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();
        f.svc.grant(grant(role, "Product.Index")).await.unwrap();
        let principal = Principal::new(UserId::new(), vec![role]);

        let out = f
            .svc
            .update(role_update(role, Some(&["Product.Add"]), Version::from(2)))
            .await
            .unwrap();
        assert_eq!(out.version, Version::from(3));
        assert_eq!(out.functions, vec![Function::new("Product.Add")]);

        let snapshot = f.cache.load();
        assert!(snapshot.is_granted(&principal, &Function::new("Product.Add")));
        assert!(!snapshot.is_granted(&principal, &Function::new("Product.Index")));
    }

    #[tokio::test]
    async fn update_without_functions_keeps_grants() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();
        f.svc.grant(grant(role, "Product.Index")).await.unwrap();
        let principal = Principal::new(UserId::new(), vec![role]);

        let out = f.svc.update(role_update(role, None, Version::from(2))).await.unwrap();
        assert_eq!(out.description.as_deref(), Some("content"));
        assert_eq!(out.functions, vec![Function::new("Product.Index")]);
        assert!(f.cache.load().is_granted(&principal, &Function::new("Product.Index")));
    }

    #[tokio::test]
    async fn update_with_unknown_function_names_functions_field() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();

        let err = f
            .svc
            .update(role_update(role, Some(&["Nope.Nothing"]), Version::INITIAL))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.field_errors()[0].field, "functions");
        assert_eq!(f.svc.get_by_id(role).await.unwrap().version, Version::INITIAL);
    }

    #[tokio::test]
    async fn stale_update_leaves_role_and_snapshot_unchanged() {
        let f = fixture();
        let role = f.svc.add(role_input("Editors")).await.unwrap();
        f.svc.grant(grant(role, "Product.Index")).await.unwrap();
        let principal = Principal::new(UserId::new(), vec![role]);

        let err = f
            .svc
            .update(role_update(role, Some(&["Product.Add"]), Version::INITIAL))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ConcurrencyConflict { .. }));

        let stored = f.svc.get_by_id(role).await.unwrap();
        assert_eq!(stored.name, "Editors");
        assert_eq!(stored.description, None);
        assert_eq!(stored.version, Version::from(2));
        assert_eq!(stored.functions, vec![Function::new("Product.Index")]);

        let snapshot = f.cache.load();
        assert!(snapshot.is_granted(&principal, &Function::new("Product.Index")));
        assert!(!snapshot.is_granted(&principal, &Function::new("Product.Add")));
    }
}
