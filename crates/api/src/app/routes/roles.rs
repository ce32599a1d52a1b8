use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path};
use axum::routing::{get, post};

use qsadmin_auth::FunctionDescriptor;
use qsadmin_core::RoleId;
use qsadmin_users::{RoleGrantDto, RoleInputDto, RoleOutputDto, RoleUpdateInputDto};

use crate::app::dto::IdDto;
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::routes::{AREA, Endpoint};
use crate::context::AppContext;

const CONTROLLER: &str = "Role";

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Index", "List roles"), get(index)),
        Endpoint::gated(
            FunctionDescriptor::area_action_with_id(AREA, CONTROLLER, "Detail", "Show one role"),
            get(detail),
        ),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Add", "Add a role"), post(add)),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Update", "Update a role"), post(update)),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Delete", "Delete a role"), post(delete)),
        Endpoint::gated(
            FunctionDescriptor::area_action(AREA, CONTROLLER, "Grant", "Grant a function to a role"),
            post(grant),
        ),
        Endpoint::gated(
            FunctionDescriptor::area_action(AREA, CONTROLLER, "Revoke", "Revoke a function from a role"),
            post(revoke),
        ),
    ]
}

async fn index(Extension(app): Extension<Arc<AppContext>>) -> Result<Json<Vec<RoleOutputDto>>, ApiError> {
    Ok(Json(app.roles.get().await?))
}

async fn detail(
    Extension(app): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<RoleOutputDto>, ApiError> {
    let id: RoleId = id.parse()?;
    Ok(Json(app.roles.get_by_id(id).await?))
}

async fn add(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<RoleInputDto>,
) -> Result<Json<IdDto<RoleId>>, ApiError> {
    Ok(Json(IdDto::new(app.roles.add(dto).await?)))
}

async fn update(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<RoleUpdateInputDto>,
) -> Result<Json<RoleOutputDto>, ApiError> {
    Ok(Json(app.roles.update(dto).await?))
}

async fn delete(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<IdDto<RoleId>>,
) -> Result<Json<IdDto<RoleId>>, ApiError> {
    app.roles.delete(dto.id).await?;
    Ok(Json(dto))
}

async fn grant(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<RoleGrantDto>,
) -> Result<Json<RoleOutputDto>, ApiError> {
    Ok(Json(app.roles.grant(dto).await?))
}

async fn revoke(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<RoleGrantDto>,
) -> Result<Json<RoleOutputDto>, ApiError> {
    Ok(Json(app.roles.revoke(dto).await?))
}
