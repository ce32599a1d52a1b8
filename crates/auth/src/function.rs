use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Function identifier: an independently permission-gated capability.
///
/// Functions are opaque `"<Controller>.<Action>"` strings (e.g. `"Product.Add"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Function(Cow<'static, str>);

impl Function {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Build the canonical `"<Controller>.<Action>"` name.
    pub fn of(controller: &str, action: &str) -> Self {
        Self(Cow::Owned(format!("{controller}.{action}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Function {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registration metadata for a gated function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDescriptor {
    pub function: Function,
    pub area: Option<String>,
    pub controller: String,
    pub action: String,
    /// Route template the function is reachable through (e.g. `/admin/product/add`).
    pub route: String,
    pub description: String,
}

impl FunctionDescriptor {
    /// Descriptor for an action inside an area, routed as `/{area}/{controller}/{action}`.
    pub fn area_action(area: &str, controller: &str, action: &str, description: &str) -> Self {
        Self {
            function: Function::of(controller, action),
            area: Some(area.to_string()),
            controller: controller.to_string(),
            action: action.to_string(),
            route: format!(
                "/{}/{}/{}",
                area.to_lowercase(),
                controller.to_lowercase(),
                action.to_lowercase()
            ),
            description: description.to_string(),
        }
    }

    /// Same as [`FunctionDescriptor::area_action`] with a trailing `/:id` segment.
    pub fn area_action_with_id(area: &str, controller: &str, action: &str, description: &str) -> Self {
        let mut d = Self::area_action(area, controller, action, description);
        d.route.push_str("/:id");
        d
    }
}
