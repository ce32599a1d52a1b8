//! Explicit route → function registration table, built once at startup.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::{Function, FunctionDescriptor};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("function '{0}' is already registered")]
    DuplicateFunction(Function),

    #[error("route '{0}' is already bound to a function")]
    DuplicateRoute(String),
}

/// Maps route templates to the function that gates them.
///
/// Each function is reachable through exactly one route and each route is
/// gated by at most one function. Routes that are never registered are
/// public.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    by_route: HashMap<String, Function>,
    by_function: BTreeMap<Function, FunctionDescriptor>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        if self.by_function.contains_key(&descriptor.function) {
            return Err(RegistryError::DuplicateFunction(descriptor.function));
        }
        if self.by_route.contains_key(&descriptor.route) {
            return Err(RegistryError::DuplicateRoute(descriptor.route));
        }
        self.by_route
            .insert(descriptor.route.clone(), descriptor.function.clone());
        self.by_function.insert(descriptor.function.clone(), descriptor);
        Ok(())
    }

    /// Function gating the given route template, if any.
    pub fn resolve(&self, route: &str) -> Option<&FunctionDescriptor> {
        self.by_route
            .get(route)
            .and_then(|f| self.by_function.get(f))
    }

    pub fn contains(&self, function: &Function) -> bool {
        self.by_function.contains_key(function)
    }

    /// All registered descriptors, ordered by function name.
    pub fn descriptors(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.by_function.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.by_function.keys()
    }

    pub fn len(&self) -> usize {
        self.by_function.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_function.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add() -> FunctionDescriptor {
        FunctionDescriptor::area_action("Admin", "Product", "Add", "add")
    }

    #[test]
    fn resolves_registered_route() {
        let mut reg = FunctionRegistry::new();
        reg.register(add()).unwrap();

        let d = reg.resolve("/admin/product/add").unwrap();
        assert_eq!(d.function.as_str(), "Product.Add");
        assert!(reg.resolve("/admin/product/index").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rejects_second_route_for_same_function() {
        let mut reg = FunctionRegistry::new();
        reg.register(add()).unwrap();

        let mut again = add();
        again.route = "/admin/product/create".to_string();
        assert_eq!(
            reg.register(again),
            Err(RegistryError::DuplicateFunction(Function::new("Product.Add")))
        );
    }

    #[test]
    fn rejects_second_function_on_same_route() {
        let mut reg = FunctionRegistry::new();
        reg.register(add()).unwrap();

        let mut other = FunctionDescriptor::area_action("Admin", "Product", "Create", "create");
        other.route = "/admin/product/add".to_string();
        assert_eq!(
            reg.register(other),
            Err(RegistryError::DuplicateRoute("/admin/product/add".to_string()))
        );
    }
}
