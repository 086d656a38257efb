//! Loads a catalog fixture into the in-memory store.
//!
//! This is the write path of the service: every row goes through the same
//! validation rules an administrative client would hit, and the first
//! invalid row aborts the load.
//!
//! ```json
//! {"categories": [{"name": "Fruits", "description": "Fruits de saison",
//!   "products": [{"name": "Ananas", "barcode": "3270190207924",
//!     "articles": [{"name": "Ananas x1", "price": "2.50"}]}]}]}
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use shop_catalog::{NewArticle, NewCategory, NewProduct};
use shop_core::{DomainError, Entity, ValidationErrors};

use crate::read_model::{InMemoryCatalogStore, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {entity} {name:?}: {errors}")]
    Invalid {
        entity: &'static str,
        name: String,
        errors: ValidationErrors,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFixture {
    #[serde(default)]
    pub categories: Vec<CategoryFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryFixture {
    pub name: String,
    pub description: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default)]
    pub products: Vec<ProductFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFixture {
    pub name: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default)]
    pub articles: Vec<ArticleFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticleFixture {
    pub name: String,
    pub price: Decimal,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

/// Number of rows inserted by one load.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub articles: usize,
}

/// Read the fixture at `path` and insert its rows into `store`.
pub async fn load(path: &Path, store: &InMemoryCatalogStore) -> Result<SeedSummary, SeedError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fixture: CatalogFixture = serde_json::from_str(&raw)?;
    let summary = apply(&fixture, store)?;

    info!(
        path = %path.display(),
        categories = summary.categories,
        products = summary.products,
        articles = summary.articles,
        "catalog fixture loaded"
    );
    Ok(summary)
}

/// Validate and insert every row of `fixture`, parents before children.
pub fn apply(fixture: &CatalogFixture, store: &InMemoryCatalogStore) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();
    let mut category_names: Vec<String> = Vec::new();

    for cat in &fixture.categories {
        let mut draft = NewCategory::new(&cat.name, &cat.description);
        draft.active = cat.active;
        draft
            .validate(category_names.iter().map(String::as_str))
            .map_err(|e| invalid("category", &cat.name, e))?;
        let category = store.insert_category(draft)?;
        category_names.push(category.name().to_string());
        summary.categories += 1;

        for prod in &cat.products {
            let mut draft = NewProduct::new(category.id(), &prod.name);
            draft.barcode = prod.barcode.clone();
            draft.active = prod.active;
            draft
                .validate(Some(&category))
                .map_err(|e| invalid("product", &prod.name, e))?;
            let product = store.insert_product(draft)?;
            summary.products += 1;

            for art in &prod.articles {
                let mut draft = NewArticle::new(product.id(), &art.name, art.price);
                draft.active = art.active;
                draft
                    .validate(Some(&product))
                    .map_err(|e| invalid("article", &art.name, e))?;
                store.insert_article(draft)?;
                summary.articles += 1;
            }
        }
    }

    Ok(summary)
}

fn invalid(entity: &'static str, name: &str, err: DomainError) -> SeedError {
    let errors = match err {
        DomainError::Validation(errors) => errors,
        other => {
            let mut errors = ValidationErrors::new();
            errors.add("non_field_errors", other.to_string());
            errors
        }
    };
    SeedError::Invalid {
        entity,
        name: name.to_string(),
        errors,
    }
}
