use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use shop_core::CategoryId;
use shop_infra::read_model::EntityRef;

use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::app::routes::representation;
use crate::app::views::{Action, RepresentationBuilder, Resource};

pub fn router() -> Router {
    Router::new()
        .route(
            "/categories/",
            get(list_categories).fallback(errors::method_not_allowed),
        )
        .route(
            "/categories/:id/",
            get(get_category).fallback(errors::method_not_allowed),
        )
        .route(
            "/categories/:id/disable/",
            post(disable_category).fallback(errors::method_not_allowed),
        )
}

/// GET /categories/ : active categories, list view.
pub async fn list_categories(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let categories = services.list_categories().await?;
    let repr = representation(Resource::Category, Action::List)?;
    let views = RepresentationBuilder::new(&services).categories(repr, &categories).await?;
    Ok((StatusCode::OK, Json(views)).into_response())
}

/// GET /categories/{id}/ : detail view with the category's active products.
pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CategoryId = id.parse()?;
    let category = services.category(id).await?;

    let repr = representation(Resource::Category, Action::Retrieve)?;
    let mut views = RepresentationBuilder::new(&services)
        .categories(repr, std::slice::from_ref(&category))
        .await?;
    let view = views.pop().ok_or_else(|| ApiError::not_found(EntityRef::Category(id)))?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

/// POST /categories/{id}/disable/
pub async fn disable_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: CategoryId = id.parse()?;
    services.disable(EntityRef::Category(id)).await?;
    Ok(StatusCode::OK.into_response())
}
