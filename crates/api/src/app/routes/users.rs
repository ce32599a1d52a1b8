use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path};
use axum::routing::{get, post};

use qsadmin_auth::FunctionDescriptor;
use qsadmin_core::UserId;
use qsadmin_users::{UserInputDto, UserOutputDto, UserUpdateInputDto};

use crate::app::dto::IdDto;
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::routes::{AREA, Endpoint};
use crate::context::AppContext;

const CONTROLLER: &str = "User";

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Index", "List users"), get(index)),
        Endpoint::gated(
            FunctionDescriptor::area_action_with_id(AREA, CONTROLLER, "Detail", "Show one user"),
            get(detail),
        ),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Add", "Add a user"), post(add)),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Update", "Update a user"), post(update)),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Delete", "Delete a user"), post(delete)),
    ]
}

async fn index(Extension(app): Extension<Arc<AppContext>>) -> Result<Json<Vec<UserOutputDto>>, ApiError> {
    Ok(Json(app.users.get().await?))
}

async fn detail(
    Extension(app): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<UserOutputDto>, ApiError> {
    let id: UserId = id.parse()?;
    Ok(Json(app.users.get_by_id(id).await?))
}

async fn add(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<UserInputDto>,
) -> Result<Json<IdDto<UserId>>, ApiError> {
    Ok(Json(IdDto::new(app.users.add(dto).await?)))
}

async fn update(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<UserUpdateInputDto>,
) -> Result<Json<UserOutputDto>, ApiError> {
    Ok(Json(app.users.update(dto).await?))
}

async fn delete(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<IdDto<UserId>>,
) -> Result<Json<IdDto<UserId>>, ApiError> {
    app.users.delete(dto.id).await?;
    Ok(Json(dto))
}
