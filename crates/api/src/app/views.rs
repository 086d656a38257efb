//! Wire representations of catalog entities.
//!
//! Which shape an entity takes is an explicit table lookup:
//! [`Representation::select`] maps `(Resource, ViewMode)` to one of five
//! representations, and each representation has its own builder function on
//! [`RepresentationBuilder`].
//!
//! | Resource | List | Detail |
//! |---|---|---|
//! | Category | `CategoryList` | `CategoryDetail` (+ active products) |
//! | Product | `ProductList` | `ProductDetail` (+ active articles) |
//! | Article | `Article` | `Article` |

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use shop_catalog::{Article, Category, Product};
use shop_core::{ArticleId, CategoryId, Entity, ProductId};
use shop_infra::external::{EcoGrade, EnrichmentError};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Wire format of `date_created` / `date_updated`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Upper bound on eco-score lookups in flight for one response.
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Category,
    Product,
    Article,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewMode {
    List,
    Detail,
}

/// What the dispatcher was asked to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Disable,
}

impl Action {
    /// `None` for actions that render no entity.
    pub fn view_mode(self) -> Option<ViewMode> {
        match self {
            Action::List => Some(ViewMode::List),
            Action::Retrieve => Some(ViewMode::Detail),
            Action::Disable => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Representation {
    CategoryList,
    CategoryDetail,
    ProductList,
    ProductDetail,
    Article,
}

impl Representation {
    pub fn select(resource: Resource, mode: ViewMode) -> Self {
        match (resource, mode) {
            (Resource::Category, ViewMode::List) => Representation::CategoryList,
            (Resource::Category, ViewMode::Detail) => Representation::CategoryDetail,
            (Resource::Product, ViewMode::List) => Representation::ProductList,
            (Resource::Product, ViewMode::Detail) => Representation::ProductDetail,
            (Resource::Article, _) => Representation::Article,
        }
    }

    /// Representation rendered for `action` on `resource`, if it renders one.
    pub fn for_action(resource: Resource, action: Action) -> Option<Self> {
        action.view_mode().map(|mode| Self::select(resource, mode))
    }

    pub fn resource(self) -> Resource {
        match self {
            Representation::CategoryList | Representation::CategoryDetail => Resource::Category,
            Representation::ProductList | Representation::ProductDetail => Resource::Product,
            Representation::Article => Resource::Article,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryListView {
    pub id: CategoryId,
    pub name: String,
    pub date_created: String,
    pub date_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDetailView {
    #[serde(flatten)]
    pub category: CategoryListView,
    pub products: Vec<ProductListView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListView {
    pub id: ProductId,
    pub name: String,
    pub date_created: String,
    pub date_updated: String,
    pub category: CategoryId,
    /// `None` (rendered `null`) when the lookup failed or timed out.
    pub ecoscore: Option<EcoGrade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetailView {
    #[serde(flatten)]
    pub product: ProductListView,
    pub articles: Vec<ArticleView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleView {
    pub id: ArticleId,
    pub name: String,
    pub price: Decimal,
    pub date_created: String,
    pub date_updated: String,
    pub product: ProductId,
}

/// Any rendered entity; serializes as the inner view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CatalogView {
    CategoryList(CategoryListView),
    CategoryDetail(CategoryDetailView),
    ProductList(ProductListView),
    ProductDetail(ProductDetailView),
    Article(ArticleView),
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Turns entities into views, reading nested collections and eco-scores
/// through the injected services.
#[derive(Debug, Clone, Copy)]
pub struct RepresentationBuilder<'a> {
    services: &'a AppServices,
}

impl<'a> RepresentationBuilder<'a> {
    pub fn new(services: &'a AppServices) -> Self {
        Self { services }
    }

    pub async fn categories(
        &self,
        repr: Representation,
        categories: &[Category],
    ) -> Result<Vec<CatalogView>, ApiError> {
        match repr {
            Representation::CategoryList => Ok(categories
                .iter()
                .map(|c| CatalogView::CategoryList(self.category_list(c)))
                .collect()),
            Representation::CategoryDetail => {
                let mut views = Vec::with_capacity(categories.len());
                for category in categories {
                    views.push(CatalogView::CategoryDetail(self.category_detail(category).await?));
                }
                Ok(views)
            }
            other => Err(mismatch(other, Resource::Category)),
        }
    }

    pub async fn products(
        &self,
        repr: Representation,
        products: &[Product],
    ) -> Result<Vec<CatalogView>, ApiError> {
        match repr {
            Representation::ProductList => Ok(self
                .product_list(products)
                .await
                .into_iter()
                .map(CatalogView::ProductList)
                .collect()),
            Representation::ProductDetail => Ok(self
                .product_details(products)
                .await?
                .into_iter()
                .map(CatalogView::ProductDetail)
                .collect()),
            other => Err(mismatch(other, Resource::Product)),
        }
    }

    pub fn articles(&self, repr: Representation, articles: &[Article]) -> Result<Vec<CatalogView>, ApiError> {
        match repr {
            Representation::Article => Ok(articles.iter().map(|a| CatalogView::Article(self.article(a))).collect()),
            other => Err(mismatch(other, Resource::Article)),
        }
    }

    pub fn category_list(&self, category: &Category) -> CategoryListView {
        CategoryListView {
            id: category.id(),
            name: category.name().to_string(),
            date_created: format_timestamp(category.timestamps().date_created),
            date_updated: format_timestamp(category.timestamps().date_updated),
        }
    }

    pub async fn category_detail(&self, category: &Category) -> Result<CategoryDetailView, ApiError> {
        let products = self.services.list_products(Some(category.id())).await?;
        Ok(CategoryDetailView {
            category: self.category_list(category),
            products: self.product_list(&products).await,
        })
    }

    /// One eco-score lookup per product, at most [`MAX_CONCURRENT_LOOKUPS`]
    /// in flight. Grades come back in product order.
    pub async fn product_list(&self, products: &[Product]) -> Vec<ProductListView> {
        let lookups: Vec<_> = products.iter().map(|p| self.ecoscore(p)).collect();
        let grades: Vec<Option<EcoGrade>> = stream::iter(lookups)
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;
        products
            .iter()
            .zip(grades)
            .map(|(product, ecoscore)| ProductListView {
                id: product.id(),
                name: product.name().to_string(),
                date_created: format_timestamp(product.timestamps().date_created),
                date_updated: format_timestamp(product.timestamps().date_updated),
                category: product.category_id(),
                ecoscore,
            })
            .collect()
    }

    pub async fn product_detail(&self, product: &Product) -> Result<ProductDetailView, ApiError> {
        let mut views = self.product_details(std::slice::from_ref(product)).await?;
        views
            .pop()
            .ok_or_else(|| ApiError::Internal(format!("no view rendered for product {}", product.id())))
    }

    async fn product_details(&self, products: &[Product]) -> Result<Vec<ProductDetailView>, ApiError> {
        let bases = self.product_list(products).await;
        let mut views = Vec::with_capacity(bases.len());
        for base in bases {
            let articles = self.services.list_articles(Some(base.id)).await?;
            views.push(ProductDetailView {
                product: base,
                articles: articles.iter().map(|a| self.article(a)).collect(),
            });
        }
        Ok(views)
    }

    pub fn article(&self, article: &Article) -> ArticleView {
        ArticleView {
            id: article.id(),
            name: article.name().to_string(),
            price: article.price(),
            date_created: format_timestamp(article.timestamps().date_created),
            date_updated: format_timestamp(article.timestamps().date_updated),
            product: article.product_id(),
        }
    }

    async fn ecoscore(&self, product: &Product) -> Option<EcoGrade> {
        let key = product.ecoscore_key();
        let timeout = self.services.ecoscore_timeout();
        let outcome = match tokio::time::timeout(timeout, self.services.ecoscore().lookup(key)).await {
            Ok(result) => result,
            Err(_) => Err(EnrichmentError::Timeout(timeout)),
        };

        match outcome {
            Ok(grade) => Some(grade),
            Err(e) => {
                warn!(product_id = %product.id(), key, error = %e, "eco-score unavailable");
                None
            }
        }
    }
}

fn mismatch(repr: Representation, wanted: Resource) -> ApiError {
    ApiError::Internal(format!("{repr:?} cannot render {wanted:?} (renders {:?})", repr.resource()))
}
