use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use shop_catalog::{Article, Category, NewArticle, NewCategory, NewProduct, Product};
use shop_core::{ArticleId, CategoryId, Entity, ProductId};

use super::catalog_store::{
    ArticleFilter, CatalogStore, CategoryFilter, EntityRef, ProductFilter, StoreError,
};

/// One table: rows keyed (and therefore ordered) by primary key, plus the
/// sequence that hands out the next key.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: BTreeMap<E::Id, E>,
    next_id: i64,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<E: Entity + Clone> Table<E> {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn get(&self, id: &E::Id) -> Option<E> {
        self.rows.get(id).cloned()
    }

    fn select(&self, pred: impl Fn(&E) -> bool) -> Vec<E> {
        self.rows.values().filter(|e| pred(e)).cloned().collect()
    }

    fn insert(&mut self, entity: E) -> E {
        self.rows.insert(entity.id(), entity.clone());
        entity
    }
}

#[derive(Debug, Default)]
struct Tables {
    categories: Table<Category>,
    products: Table<Product>,
    articles: Table<Article>,
}

/// In-memory catalog store for tests/dev and fixture-seeded deployments.
///
/// Inserts do not run domain validation (that is the caller's job) but do
/// enforce foreign keys the way a relational store would.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_category(&self, draft: NewCategory) -> Result<Category, StoreError> {
        let mut tables = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let id = CategoryId::new(tables.categories.allocate());
        Ok(tables.categories.insert(Category::create(id, draft, Utc::now())))
    }

    pub fn insert_product(&self, draft: NewProduct) -> Result<Product, StoreError> {
        let mut tables = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if !tables.categories.rows.contains_key(&draft.category_id) {
            return Err(StoreError::MissingParent(format!("category {}", draft.category_id)));
        }
        let id = ProductId::new(tables.products.allocate());
        Ok(tables.products.insert(Product::create(id, draft, Utc::now())))
    }

    pub fn insert_article(&self, draft: NewArticle) -> Result<Article, StoreError> {
        let mut tables = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if !tables.products.rows.contains_key(&draft.product_id) {
            return Err(StoreError::MissingParent(format!("product {}", draft.product_id)));
        }
        let id = ArticleId::new(tables.articles.allocate());
        Ok(tables.articles.insert(Article::create(id, draft, Utc::now())))
    }

    /// Row counts as `(categories, products, articles)`.
    pub fn counts(&self) -> Result<(usize, usize, usize), StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok((
            tables.categories.rows.len(),
            tables.products.rows.len(),
            tables.articles.rows.len(),
        ))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.categories.get(&id))
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.products.get(&id))
    }

    async fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.articles.get(&id))
    }

    async fn categories(&self, filter: &CategoryFilter) -> Result<Vec<Category>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.categories.select(|c| filter.matches(c)))
    }

    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.products.select(|p| filter.matches(p)))
    }

    async fn articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.articles.select(|a| filter.matches(a)))
    }

    async fn set_active(&self, target: EntityRef, active: bool) -> Result<bool, StoreError> {
        let mut tables = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let now = Utc::now();
        let row_found = match target {
            EntityRef::Category(id) => tables.categories.rows.get_mut(&id).map(|c| c.set_active(active, now)),
            EntityRef::Product(id) => tables.products.rows.get_mut(&id).map(|p| p.set_active(active, now)),
            EntityRef::Article(id) => tables.articles.rows.get_mut(&id).map(|a| a.set_active(active, now)),
        };
        Ok(row_found.is_some())
    }
}
