//! HTTP routes, one module per controller.
//!
//! Each module lists its [`Endpoint`]s once; the same table feeds both the
//! axum router and the [`FunctionRegistry`], so a gated function and its
//! route can never drift apart.

use axum::Router;
use axum::routing::MethodRouter;

use qsadmin_auth::{FunctionDescriptor, FunctionRegistry, RegistryError};

pub mod functions;
pub mod products;
pub mod roles;
pub mod system;
pub mod users;

/// Area every gated controller lives in.
pub const AREA: &str = "Admin";

/// One routed action. `descriptor == None` means the route is public.
pub struct Endpoint {
    pub path: String,
    pub descriptor: Option<FunctionDescriptor>,
    pub handler: MethodRouter,
}

impl Endpoint {
    pub fn gated(descriptor: FunctionDescriptor, handler: MethodRouter) -> Self {
        Self {
            path: descriptor.route.clone(),
            descriptor: Some(descriptor),
            handler,
        }
    }

    pub fn public(path: &str, handler: MethodRouter) -> Self {
        Self {
            path: path.to_string(),
            descriptor: None,
            handler,
        }
    }
}

fn endpoints() -> impl Iterator<Item = Endpoint> {
    products::endpoints()
        .into_iter()
        .chain(users::endpoints())
        .chain(roles::endpoints())
        .chain(functions::endpoints())
        .chain(system::endpoints())
}

/// Registry of every gated function, in registration order.
pub fn function_registry() -> Result<FunctionRegistry, RegistryError> {
    let mut registry = FunctionRegistry::new();
    for descriptor in endpoints().filter_map(|e| e.descriptor) {
        registry.register(descriptor)?;
    }
    Ok(registry)
}

/// Router over every endpoint, gated and public.
pub fn router() -> Router {
    endpoints().fold(Router::new(), |router, e| router.route(&e.path, e.handler))
}
