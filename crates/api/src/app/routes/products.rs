use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use shop_core::{CategoryId, ProductId};
use shop_infra::read_model::EntityRef;

use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::app::routes::representation;
use crate::app::views::{Action, RepresentationBuilder, Resource};

pub fn router() -> Router {
    Router::new()
        .route(
            "/products/",
            get(list_products).fallback(errors::method_not_allowed),
        )
        .route(
            "/products/:id/",
            get(get_product).fallback(errors::method_not_allowed),
        )
        .route(
            "/products/:id/disable/",
            post(disable_product).fallback(errors::method_not_allowed),
        )
}

/// Query parameters of `GET /products/`.
///
/// - `category_id`: restrict to one category. A value that is not an integer
///   is ignored rather than rejected; when the key repeats, the last value wins.
#[derive(Debug, Default)]
pub struct ProductListQuery {
    pub category_id: Option<String>,
}

impl ProductListQuery {
    pub fn from_params(mut params: HashMap<String, String>) -> Self {
        Self {
            category_id: params.remove("category_id"),
        }
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id.as_deref().and_then(|s| s.parse().ok())
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = ProductListQuery::from_params(params);
    let products = services.list_products(query.category_id()).await?;

    let repr = representation(Resource::Product, Action::List)?;
    let views = RepresentationBuilder::new(&services).products(repr, &products).await?;
    Ok((StatusCode::OK, Json(views)).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: ProductId = id.parse()?;
    let product = services.product(id).await?;

    let repr = representation(Resource::Product, Action::Retrieve)?;
    let mut views = RepresentationBuilder::new(&services)
        .products(repr, std::slice::from_ref(&product))
        .await?;
    let view = views.pop().ok_or_else(|| ApiError::not_found(EntityRef::Product(id)))?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub async fn disable_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: ProductId = id.parse()?;
    services.disable(EntityRef::Product(id)).await?;
    Ok(StatusCode::OK.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_category_id_means_no_restriction() {
        let q = |v: &str| ProductListQuery {
            category_id: Some(v.to_string()),
        };
        assert_eq!(q("3").category_id(), Some(CategoryId::new(3)));
        assert_eq!(q("abc").category_id(), None);
        assert_eq!(q("").category_id(), None);
        assert_eq!(ProductListQuery::default().category_id(), None);
    }

    #[test]
    fn reads_category_id_from_params() {
        let params = HashMap::from([
            ("category_id".to_string(), "2".to_string()),
            ("page".to_string(), "9".to_string()),
        ]);
        assert_eq!(ProductListQuery::from_params(params).category_id(), Some(CategoryId::new(2)));
        assert_eq!(ProductListQuery::from_params(HashMap::new()).category_id(), None);
    }
}
