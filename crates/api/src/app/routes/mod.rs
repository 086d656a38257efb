use axum::{Router, routing::get};

use crate::app::errors::ApiError;
use crate::app::views::{Action, Representation, Resource};

pub mod articles;
pub mod categories;
pub mod products;
pub mod system;

/// Catalog routes. Paths keep their trailing slash; verbs a route does not
/// serve answer 405 through the route's fallback.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(categories::router())
        .merge(products::router())
        .merge(articles::router())
}

fn representation(resource: Resource, action: Action) -> Result<Representation, ApiError> {
    Representation::for_action(resource, action)
        .ok_or_else(|| ApiError::Internal(format!("{action:?} renders no {resource:?} view")))
}
