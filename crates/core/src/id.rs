//! Strongly-typed identifiers used across the domain.
//!
//! Catalog rows are keyed by positive integer primary keys; the newtypes keep
//! a category id from being passed where a product id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(i64);

/// Identifier of a product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

/// Identifier of an article.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(CategoryId, "CategoryId");
impl_int_newtype!(ProductId, "ProductId");
impl_int_newtype!(ArticleId, "ArticleId");
