//! Catalog domain module.
//!
//! This crate contains the catalog entities (categories, products, articles)
//! and the validation rules a write path must enforce, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

use chrono::{DateTime, Utc};

pub mod article;
pub mod category;
pub mod product;

pub use article::{Article, NewArticle};
pub use category::{Category, NewCategory};
pub use product::{NewProduct, Product};

/// Creation/update timestamps shared by every catalog entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timestamps {
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl Timestamps {
    /// Both timestamps set to `now` (freshly created row).
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            date_created: now,
            date_updated: now,
        }
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.date_updated = now;
    }
}
