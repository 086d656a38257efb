//! Postgres-backed catalog store.
//!
//! Reads the `shop_category`, `shop_product` and `shop_article` tables owned by
//! the administrative side of the shop. The only mutation issued from here is
//! the active-flag update behind the `disable` action.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | PoolTimedOut / PoolClosed / Io / Tls | `Unavailable` |
//! | ColumnDecode / ColumnNotFound / Decode | `Decode` |
//! | anything else | `Unavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;

use shop_catalog::{Article, Category, Product, Timestamps};
use shop_core::{ArticleId, CategoryId, ProductId};

use super::catalog_store::{
    ArticleFilter, CatalogStore, CategoryFilter, EntityRef, ProductFilter, StoreError,
};

const CATEGORY_COLUMNS: &str = "id, name, description, active, date_created, date_updated";
const PRODUCT_COLUMNS: &str = "id, category_id, name, barcode, active, date_created, date_updated";
const ARTICLE_COLUMNS: &str = "id, product_id, name, price, active, date_created, date_updated";

/// Postgres-backed catalog store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a small pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM shop_category WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM shop_product WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_article(&self, id: ArticleId) -> Result<Option<Article>, StoreError> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM shop_article WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_article", e))?;
        row.as_ref().map(article_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn categories(&self, filter: &CategoryFilter) -> Result<Vec<Category>, StoreError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM shop_category \
             WHERE ($1::bool IS NULL OR active = $1) \
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.active)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop_product \
             WHERE ($1::bool IS NULL OR active = $1) \
               AND ($2::bigint IS NULL OR category_id = $2) \
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.active)
            .bind(filter.category_id.map(|c| c.get()))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>, StoreError> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM shop_article \
             WHERE ($1::bool IS NULL OR active = $1) \
               AND ($2::bigint IS NULL OR product_id = $2) \
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.active)
            .bind(filter.product_id.map(|p| p.get()))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("articles", e))?;
        rows.iter().map(article_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn set_active(&self, target: EntityRef, active: bool) -> Result<bool, StoreError> {
        let (table, id) = match target {
            EntityRef::Category(id) => ("shop_category", id.get()),
            EntityRef::Product(id) => ("shop_product", id.get()),
            EntityRef::Article(id) => ("shop_article", id.get()),
        };
        let sql = format!("UPDATE {table} SET active = $1, date_updated = now() WHERE id = $2");
        let result = sqlx::query(&sql)
            .bind(active)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_active", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn timestamps_from_row(row: &PgRow) -> Result<Timestamps, sqlx::Error> {
    Ok(Timestamps {
        date_created: row.try_get::<DateTime<Utc>, _>("date_created")?,
        date_updated: row.try_get::<DateTime<Utc>, _>("date_updated")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    let decode = || -> Result<Category, sqlx::Error> {
        Ok(Category::from_row(
            CategoryId::new(row.try_get("id")?),
            row.try_get::<String, _>("name")?,
            row.try_get::<String, _>("description")?,
            row.try_get("active")?,
            timestamps_from_row(row)?,
        ))
    };
    decode().map_err(|e| map_sqlx_error("decode category", e))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let decode = || -> Result<Product, sqlx::Error> {
        Ok(Product::from_row(
            ProductId::new(row.try_get("id")?),
            CategoryId::new(row.try_get("category_id")?),
            row.try_get::<String, _>("name")?,
            row.try_get::<Option<String>, _>("barcode")?,
            row.try_get("active")?,
            timestamps_from_row(row)?,
        ))
    };
    decode().map_err(|e| map_sqlx_error("decode product", e))
}

fn article_from_row(row: &PgRow) -> Result<Article, StoreError> {
    let decode = || -> Result<Article, sqlx::Error> {
        Ok(Article::from_row(
            ArticleId::new(row.try_get("id")?),
            ProductId::new(row.try_get("product_id")?),
            row.try_get::<String, _>("name")?,
            row.try_get::<Decimal, _>("price")?,
            row.try_get("active")?,
            timestamps_from_row(row)?,
        ))
    };
    decode().map_err(|e| map_sqlx_error("decode article", e))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        other => StoreError::Unavailable(format!("{operation}: {other}")),
    }
}
