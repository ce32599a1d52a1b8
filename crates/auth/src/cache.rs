//! Role → function permission snapshot, swapped atomically on rebuild.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;

use qsadmin_core::RoleId;

use crate::{Function, Principal};

/// Immutable view of every role's granted functions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PermissionSnapshot {
    grants: HashMap<RoleId, HashSet<Function>>,
}

impl PermissionSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(role, granted functions)` pairs.
    pub fn from_grants<I, F>(roles: I) -> Self
    where
        I: IntoIterator<Item = (RoleId, F)>,
        F: IntoIterator<Item = Function>,
    {
        let grants = roles
            .into_iter()
            .map(|(role, functions)| (role, functions.into_iter().collect()))
            .collect();
        Self { grants }
    }

    /// True if any of the principal's roles grants `function`.
    pub fn is_granted(&self, principal: &Principal, function: &Function) -> bool {
        principal
            .roles()
            .iter()
            .filter_map(|r| self.grants.get(r))
            .any(|fs| fs.contains(function))
    }

    /// Union of the functions granted to all of the principal's roles.
    pub fn effective_functions(&self, principal: &Principal) -> BTreeSet<Function> {
        principal
            .roles()
            .iter()
            .filter_map(|r| self.grants.get(r))
            .flat_map(|fs| fs.iter().cloned())
            .collect()
    }

    pub fn role_count(&self) -> usize {
        self.grants.len()
    }
}

/// Shared, read-mostly holder of the current [`PermissionSnapshot`].
///
/// Readers never block and never see a half-built snapshot: a rebuild
/// constructs the full replacement and publishes it with a single swap.
#[derive(Debug)]
pub struct PermissionCache {
    current: ArcSwap<PermissionSnapshot>,
}

impl PermissionCache {
    pub fn new(snapshot: PermissionSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    pub fn load(&self) -> Arc<PermissionSnapshot> {
        self.current.load_full()
    }

    pub fn replace(&self, snapshot: PermissionSnapshot) {
        tracing::debug!(roles = snapshot.role_count(), "permission snapshot replaced");
        self.current.store(Arc::new(snapshot));
    }
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::new(PermissionSnapshot::empty())
    }
}
