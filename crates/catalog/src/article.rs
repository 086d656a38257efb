use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shop_core::{ArticleId, DomainResult, Entity, ProductId, ValidationErrors};

use crate::{Product, Timestamps};

/// A purchasable article of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    id: ArticleId,
    product_id: ProductId,
    name: String,
    price: Decimal,
    active: bool,
    timestamps: Timestamps,
}

impl Article {
    /// Materialize a stored article.
    pub fn from_row(
        id: ArticleId,
        product_id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        active: bool,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            product_id,
            name: name.into(),
            price,
            active,
            timestamps,
        }
    }

    /// Build the stored entity for a validated draft.
    pub fn create(id: ArticleId, draft: NewArticle, now: DateTime<Utc>) -> Self {
        Self::from_row(
            id,
            draft.product_id,
            draft.name,
            draft.price,
            draft.active,
            Timestamps::at(now),
        )
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price in currency units, e.g. `2.50`.
    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        self.active = active;
        self.timestamps.touch(now);
    }

    pub fn disable(&mut self, now: DateTime<Utc>) {
        self.set_active(false, now);
    }
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> ArticleId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Draft for an article about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub active: bool,
}

impl NewArticle {
    pub fn new(product_id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Write-path rules: price strictly above one currency unit, and the
    /// referenced product exists and is active.
    pub fn validate(&self, product: Option<&Product>) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "name cannot be empty");
        }
        if self.price <= Decimal::ONE {
            errors.add("price", "price must be greater than 1");
        }
        match product {
            Some(p) if p.id() == self.product_id => {
                if !p.is_active() {
                    errors.add("product", "inactive product");
                }
            }
            _ => errors.add("product", format!("product {} does not exist", self.product_id)),
        }

        errors.into_result()
    }
}
