//! Domain error model.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lookups, malformed identifiers). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    /// Single-field validation failure.
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, msg);
        Self::Validation(errors)
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Field → messages mapping collected while validating a draft.
///
/// Serializes as a plain JSON object (`{"name": ["..."]}`) so it can be
/// returned as-is in a 400 response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, msg: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was collected, otherwise a `DomainError::Validation`.
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for msg in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {msg}")?;
                first = false;
            }
        }
        Ok(())
    }
}
