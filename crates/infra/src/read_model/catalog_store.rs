use async_trait::async_trait;
use thiserror::Error;

use shop_catalog::{Article, Category, Product};
use shop_core::{ArticleId, CategoryId, Entity, ProductId};

/// Storage failure. Lookups that simply find nothing are `Ok(None)`, not errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed row: {0}")]
    Decode(String),

    #[error("missing parent row: {0}")]
    MissingParent(String),

    #[error("lock poisoned")]
    Poisoned,
}

/// Reference to a single catalog row, used by mutations that apply to any kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Category(CategoryId),
    Product(ProductId),
    Article(ArticleId),
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntityRef::Category(id) => write!(f, "category {id}"),
            EntityRef::Product(id) => write!(f, "product {id}"),
            EntityRef::Article(id) => write!(f, "article {id}"),
        }
    }
}

/// Field-equality filter over categories. `None` fields do not restrict.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub active: Option<bool>,
}

impl CategoryFilter {
    /// Active categories only.
    pub fn active() -> Self {
        Self { active: Some(true) }
    }

    pub fn matches(&self, category: &Category) -> bool {
        self.active.is_none_or(|a| category.is_active() == a)
    }
}

/// Field-equality filter over products.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub active: Option<bool>,
    pub category_id: Option<CategoryId>,
}

impl ProductFilter {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.active.is_none_or(|a| product.is_active() == a)
            && self.category_id.is_none_or(|c| product.category_id() == c)
    }
}

/// Field-equality filter over articles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    pub active: Option<bool>,
    pub product_id: Option<ProductId>,
}

impl ArticleFilter {
    pub fn active() -> Self {
        Self {
            active: Some(true),
            product_id: None,
        }
    }

    pub fn of_product(mut self, product_id: Option<ProductId>) -> Self {
        self.product_id = product_id;
        self
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.active.is_none_or(|a| article.is_active() == a)
            && self.product_id.is_none_or(|p| article.product_id() == p)
    }
}

/// Relational persistence port for the catalog.
///
/// Every `filter`-style method returns rows ordered by primary key ascending,
/// so callers can rely on a stable output sequence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    async fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError>;

    async fn categories(&self, filter: &CategoryFilter) -> Result<Vec<Category>, StoreError>;
    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, StoreError>;

    /// Flip the active flag of one row. Returns `false` when no such row exists.
    async fn set_active(&self, target: EntityRef, active: bool) -> Result<bool, StoreError>;
}
