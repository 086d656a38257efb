use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use shop_core::{ArticleId, ProductId};

use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::app::routes::representation;
use crate::app::views::{Action, RepresentationBuilder, Resource};

pub fn router() -> Router {
    Router::new()
        .route(
            "/articles/",
            get(list_articles).fallback(errors::method_not_allowed),
        )
        .route(
            "/articles/:id/",
            get(get_article).fallback(errors::method_not_allowed),
        )
}

/// `product_id` follows the same lenient rule as `category_id` on products.
#[derive(Debug, Default)]
pub struct ArticleListQuery {
    pub product_id: Option<String>,
}

impl ArticleListQuery {
    pub fn from_params(mut params: HashMap<String, String>) -> Self {
        Self {
            product_id: params.remove("product_id"),
        }
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id.as_deref().and_then(|s| s.parse().ok())
    }
}

pub async fn list_articles(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = ArticleListQuery::from_params(params);
    let articles = services.list_articles(query.product_id()).await?;
    let repr = representation(Resource::Article, Action::List)?;
    let views = RepresentationBuilder::new(&services).articles(repr, &articles)?;
    Ok((StatusCode::OK, Json(views)).into_response())
}

pub async fn get_article(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: ArticleId = id.parse()?;
    let article = services.article(id).await?;
    let repr = representation(Resource::Article, Action::Retrieve)?;
    let mut views = RepresentationBuilder::new(&services).articles(repr, std::slice::from_ref(&article))?;
    let view = views
        .pop()
        .ok_or_else(|| ApiError::not_found(format!("article {id}")))?;
    Ok((StatusCode::OK, Json(view)).into_response())
}
