//! Catalog persistence: the store port and its adapters.

pub mod catalog_store;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use catalog_store::{
    ArticleFilter, CatalogStore, CategoryFilter, EntityRef, ProductFilter, StoreError,
};
pub use in_memory::InMemoryCatalogStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalogStore;
