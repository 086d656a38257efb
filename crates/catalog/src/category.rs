use chrono::{DateTime, Utc};

use shop_core::{CategoryId, DomainResult, Entity, ValidationErrors};

use crate::Timestamps;

/// A catalog category. Owns zero or more products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    name: String,
    description: String,
    active: bool,
    timestamps: Timestamps,
}

impl Category {
    /// Materialize a stored category.
    pub fn from_row(
        id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        active: bool,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            active,
            timestamps,
        }
    }

    /// Build the stored entity for a validated draft.
    pub fn create(id: CategoryId, draft: NewCategory, now: DateTime<Utc>) -> Self {
        Self::from_row(id, draft.name, draft.description, draft.active, Timestamps::at(now))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Hide the category from default listings. Disabling twice is a no-op
    /// apart from refreshing `date_updated`.
    pub fn set_active(&mut self, active: bool, now: DateTime<Utc>) {
        self.active = active;
        self.timestamps.touch(now);
    }

    pub fn disable(&mut self, now: DateTime<Utc>) {
        self.set_active(false, now);
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Draft for a category about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub active: bool,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Write-path rules: the name is non-blank and unique among
    /// `existing_names`, and the description mentions the name verbatim.
    pub fn validate<'a>(&self, existing_names: impl IntoIterator<Item = &'a str>) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "name cannot be empty");
        } else {
            if existing_names.into_iter().any(|n| n == self.name) {
                errors.add("name", "category already exists");
            }
            if !self.description.contains(&self.name) {
                errors.add("description", "description must contain the category name");
            }
        }

        errors.into_result()
    }
}
