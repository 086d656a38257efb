use chrono::{DateTime, Utc};

use shop_core::{CategoryId, DomainResult, Entity, ProductId, ValidationErrors};

use crate::{Category, Timestamps};

/// A product, owned by exactly one category. Owns zero or more articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    category_id: CategoryId,
    name: String,
    barcode: Option<String>,
    active: bool,
    timestamps: Timestamps,
}

impl Product {
    /// Materialize a stored product.
    pub fn from_row(
        id: ProductId,
        category_id: CategoryId,
        name: impl Into<String>,
        barcode: Option<String>,
        active: bool,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            category_id,
            name: name.into(),
            barcode,
            active,
            timestamps,
        }
    }

    /// Build the stored entity for a validated draft.
    pub fn create(id: ProductId, draft: NewProduct, now: DateTime<Utc>) -> Self {
        Self::from_row(
            id,
            draft.category_id,
            draft.name,
            draft.barcode,
            draft.active,
            Timestamps::at(now),
        )
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn barcode(&self) -> Option<&str> {
        self.barcode.as_deref()
    }

    /// Key handed to the eco-score service: the barcode when known,
    /// otherwise the product name.
    pub fn ecoscore_key(&self) -> &str {
        self.barcode().unwrap_or(&self.name)
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

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Draft for a product about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub barcode: Option<String>,
    pub active: bool,
}

impl NewProduct {
    pub fn new(category_id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            category_id,
            name: name.into(),
            barcode: None,
            active: true,
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Write-path rules: non-blank name, existing owning category, and a
    /// barcode made of digits only when one is given.
    pub fn validate(&self, category: Option<&Category>) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "name cannot be empty");
        }
        if category.map(|c| c.id()) != Some(self.category_id) {
            errors.add("category", format!("category {} does not exist", self.category_id));
        }
        if let Some(barcode) = &self.barcode {
            if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_digit()) {
                errors.add("barcode", "barcode must contain digits only");
            }
        }

        errors.into_result()
    }
}
