use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{DomainError, DomainResult, Entity, Repository, Version};

/// In-memory repository for tests/dev.
///
/// Records are kept ordered by id; `update` performs its version
/// compare-and-set under the write lock.
#[derive(Debug)]
pub struct InMemoryRepository<E: Entity> {
    inner: RwLock<BTreeMap<E::Id, E>>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    DomainError::storage("in-memory store lock poisoned")
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn list(&self) -> DomainResult<Vec<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn get(&self, id: E::Id) -> DomainResult<Option<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn insert(&self, entity: E) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(entity.id(), entity);
        Ok(())
    }

    async fn update(&self, mut entity: E, expected: Version) -> DomainResult<E> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = entity.id();
        let stored = map.get(&id).ok_or_else(|| DomainError::not_found(E::KIND, id))?;
        if stored.version() != expected {
            return Err(DomainError::conflict(E::KIND, id, expected, stored.version()));
        }
        entity.set_version(expected.next());
        map.insert(id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: E::Id) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }
}
