//! Data-access seam shared by all services.

use async_trait::async_trait;

use crate::{DomainResult, Entity, Version};

/// Versioned record store for one entity type.
///
/// Implementations must make `update` an atomic compare-and-set on the version:
/// the write is applied only if the stored version equals `expected`, and the
/// stored version then becomes `expected.next()`.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// All records, ordered by id (creation order).
    async fn list(&self) -> DomainResult<Vec<E>>;

    async fn get(&self, id: E::Id) -> DomainResult<Option<E>>;

    /// Persist a new record. The record's version is stored as given.
    async fn insert(&self, entity: E) -> DomainResult<()>;

    /// Replace a record if its stored version is still `expected`.
    ///
    /// Errors with `NotFound` if the id is unknown and `ConcurrencyConflict` if
    /// the stored version moved on. Returns the stored record (new version).
    async fn update(&self, entity: E, expected: Version) -> DomainResult<E>;

    /// Remove a record. Errors with `NotFound` if the id is unknown.
    async fn delete(&self, id: E::Id) -> DomainResult<()>;
}

#[async_trait]
impl<E, R> Repository<E> for std::sync::Arc<R>
where
    E: Entity,
    R: Repository<E> + ?Sized,
{
    async fn list(&self) -> DomainResult<Vec<E>> {
        (**self).list().await
    }

    async fn get(&self, id: E::Id) -> DomainResult<Option<E>> {
        (**self).get(id).await
    }

    async fn insert(&self, entity: E) -> DomainResult<()> {
        (**self).insert(entity).await
    }

    async fn update(&self, entity: E, expected: Version) -> DomainResult<E> {
        (**self).update(entity, expected).await
    }

    async fn delete(&self, id: E::Id) -> DomainResult<()> {
        (**self).delete(id).await
    }
}
