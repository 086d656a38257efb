//! Service wiring and the query side of the API.
//!
//! `AppServices` owns the two injected collaborators (catalog store and
//! eco-score client) and resolves which entities a request is about. What
//! those entities look like on the wire is decided in `views`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use shop_catalog::{Article, Category, Product};
use shop_core::{ArticleId, CategoryId, ProductId};
use shop_infra::config::{AppConfig, EcoScoreConfig, PersistenceConfig};
use shop_infra::external::{EcoScoreClient, EnrichmentError, OpenFoodFactsClient, UnavailableEcoScore};
use shop_infra::read_model::{
    ArticleFilter, CatalogStore, CategoryFilter, EntityRef, InMemoryCatalogStore, ProductFilter, StoreError,
};
use shop_infra::seed::{self, SeedError};

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn CatalogStore>,
    ecoscore: Arc<dyn EcoScoreClient>,
    ecoscore_timeout: Duration,
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("ecoscore_timeout", &self.ecoscore_timeout)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        ecoscore: Arc<dyn EcoScoreClient>,
        ecoscore_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ecoscore,
            ecoscore_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn ecoscore(&self) -> &Arc<dyn EcoScoreClient> {
        &self.ecoscore
    }

    pub fn ecoscore_timeout(&self) -> Duration {
        self.ecoscore_timeout
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.store.categories(&CategoryFilter::active()).await?)
    }

    /// Active products, optionally restricted to one category.
    pub async fn list_products(&self, category_id: Option<CategoryId>) -> Result<Vec<Product>, ApiError> {
        let filter = ProductFilter::active().in_category(category_id);
        Ok(self.store.products(&filter).await?)
    }

    /// Active articles, optionally restricted to one product.
    pub async fn list_articles(&self, product_id: Option<ProductId>) -> Result<Vec<Article>, ApiError> {
        let filter = ArticleFilter::active().of_product(product_id);
        Ok(self.store.articles(&filter).await?)
    }

    /// Detail lookups ignore the active flag.
    pub async fn category(&self, id: CategoryId) -> Result<Category, ApiError> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| ApiError::not_found(EntityRef::Category(id)))
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.store
            .find_product(id)
            .await?
            .ok_or_else(|| ApiError::not_found(EntityRef::Product(id)))
    }

    pub async fn article(&self, id: ArticleId) -> Result<Article, ApiError> {
        self.store
            .find_article(id)
            .await?
            .ok_or_else(|| ApiError::not_found(EntityRef::Article(id)))
    }

    /// Set `active = false` on one row. Disabling an inactive row succeeds.
    pub async fn disable(&self, target: EntityRef) -> Result<(), ApiError> {
        if !self.store.set_active(target, false).await? {
            return Err(ApiError::not_found(target));
        }
        info!(%target, "disabled");
        Ok(())
    }
}

/// Failure while wiring services at startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("seeding failed: {0}")]
    Seed(#[from] SeedError),

    #[error("catalog store: {0}")]
    Store(#[from] StoreError),

    #[error("eco-score client: {0}")]
    EcoScore(#[from] EnrichmentError),
}

/// Build services from configuration.
///
/// Postgres is only available with the `postgres` feature; without it a
/// persistent configuration falls back to an empty in-memory catalog.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, BootstrapError> {
    let ecoscore = build_ecoscore_client(&config.ecoscore)?;

    let store: Arc<dyn CatalogStore> = match &config.persistence {
        PersistenceConfig::InMemory { seed_file } => {
            let store = InMemoryCatalogStore::new();
            if let Some(path) = seed_file {
                seed::load(path, &store).await?;
            }
            Arc::new(store)
        }
        PersistenceConfig::Postgres { database_url } => build_persistent_store(database_url).await?,
    };

    Ok(AppServices::new(store, ecoscore, config.ecoscore.timeout))
}

#[cfg(feature = "postgres")]
async fn build_persistent_store(database_url: &str) -> Result<Arc<dyn CatalogStore>, BootstrapError> {
    let store = shop_infra::read_model::PostgresCatalogStore::connect(database_url).await?;
    info!("using postgres catalog store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn build_persistent_store(_database_url: &str) -> Result<Arc<dyn CatalogStore>, BootstrapError> {
    tracing::warn!("USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory");
    Ok(Arc::new(InMemoryCatalogStore::new()))
}

fn build_ecoscore_client(config: &EcoScoreConfig) -> Result<Arc<dyn EcoScoreClient>, BootstrapError> {
    if !config.enabled {
        info!("eco-score lookups disabled");
        return Ok(Arc::new(UnavailableEcoScore));
    }
    Ok(Arc::new(OpenFoodFactsClient::new(&config.base_url, config.timeout)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shop_catalog::{NewArticle, NewCategory, NewProduct};
    use shop_core::Entity;
    use shop_infra::external::{EcoGrade, FixedEcoScore};

    fn services_with(store: InMemoryCatalogStore) -> AppServices {
        AppServices::new(
            Arc::new(store),
            Arc::new(FixedEcoScore::new(EcoGrade::B)),
            Duration::from_millis(200),
        )
    }

    fn catalog() -> InMemoryCatalogStore {
        let store = InMemoryCatalogStore::new();
        let fruits = store.insert_category(NewCategory::new("Fruits", "Fruits")).unwrap();
        let legumes = store.insert_category(NewCategory::new("Légumes", "Légumes")).unwrap();
        let ananas = store.insert_product(NewProduct::new(fruits.id(), "Ananas")).unwrap();
        store
            .insert_product(NewProduct::new(fruits.id(), "Banane").inactive())
            .unwrap();
        store.insert_product(NewProduct::new(legumes.id(), "Tomate")).unwrap();
        store
            .insert_article(NewArticle::new(ananas.id(), "Ananas x1", Decimal::new(250, 2)))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn product_list_honours_category_restriction() {
        let services = services_with(catalog());

        let all: Vec<_> = services.list_products(None).await.unwrap();
        assert_eq!(all.iter().map(|p| p.name()).collect::<Vec<_>>(), ["Ananas", "Tomate"]);

        let fruits = services.list_products(Some(CategoryId::new(1))).await.unwrap();
        assert_eq!(fruits.iter().map(|p| p.name()).collect::<Vec<_>>(), ["Ananas"]);

        let none = services.list_products(Some(CategoryId::new(42))).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn detail_lookup_sees_inactive_rows() {
        let services = services_with(catalog());
        let banane = services.product(ProductId::new(2)).await.unwrap();
        assert!(!banane.is_active());

        assert!(matches!(
            services.product(ProductId::new(99)).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn disable_is_idempotent_and_hides_from_lists() {
        let services = services_with(catalog());
        services.disable(EntityRef::Category(CategoryId::new(2))).await.unwrap();
        services.disable(EntityRef::Category(CategoryId::new(2))).await.unwrap();

        let categories = services.list_categories().await.unwrap();
        assert_eq!(categories.iter().map(|c| c.name()).collect::<Vec<_>>(), ["Fruits"]);

        assert!(matches!(
            services.disable(EntityRef::Product(ProductId::new(99))).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn disabled_ecoscore_config_yields_unavailable_client() {
        let config = AppConfig::from_lookup(|name| match name {
            "SHOP_ECOSCORE_ENABLED" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let services = build_services(&config).await.unwrap();
        assert!(services.ecoscore().lookup("Ananas").await.is_err());
        assert!(services.list_categories().await.unwrap().is_empty());
    }
}
