use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path};
use axum::routing::{get, post};

use qsadmin_auth::FunctionDescriptor;
use qsadmin_core::ProductId;
use qsadmin_products::{ProductInputDto, ProductOutputDto, ProductUpdateInputDto};

use crate::app::dto::IdDto;
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::routes::{AREA, Endpoint};
use crate::context::AppContext;

const CONTROLLER: &str = "Product";

pub fn endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Index", "List products"), get(index)),
        Endpoint::gated(
            FunctionDescriptor::area_action_with_id(AREA, CONTROLLER, "Detail", "Show one product"),
            get(detail),
        ),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Add", "Add a product"), post(add)),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Update", "Update a product"), post(update)),
        Endpoint::gated(FunctionDescriptor::area_action(AREA, CONTROLLER, "Delete", "Delete a product"), post(delete)),
    ]
}

async fn index(Extension(app): Extension<Arc<AppContext>>) -> Result<Json<Vec<ProductOutputDto>>, ApiError> {
    Ok(Json(app.products.get().await?))
}

async fn detail(
    Extension(app): Extension<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<ProductOutputDto>, ApiError> {
    let id: ProductId = id.parse()?;
    Ok(Json(app.products.get_by_id(id).await?))
}

async fn add(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<ProductInputDto>,
) -> Result<Json<IdDto<ProductId>>, ApiError> {
    Ok(Json(IdDto::new(app.products.add(dto).await?)))
}

async fn update(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<ProductUpdateInputDto>,
) -> Result<Json<ProductOutputDto>, ApiError> {
    Ok(Json(app.products.update(dto).await?))
}

async fn delete(
    Extension(app): Extension<Arc<AppContext>>,
    ApiJson(dto): ApiJson<IdDto<ProductId>>,
) -> Result<Json<IdDto<ProductId>>, ApiError> {
    app.products.delete(dto.id).await?;
    Ok(Json(dto))
}
