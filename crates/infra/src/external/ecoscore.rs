//! Eco-score lookups against a third-party food database.
//!
//! The representation layer only depends on [`EcoScoreClient`]; the live
//! Open Food Facts adapter and the deterministic stand-ins all implement it.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Sustainability grade as published by the eco-score service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcoGrade {
    A,
    B,
    C,
    D,
    E,
    /// The service knows the product but could not compute a grade.
    Unknown,
    /// Grading does not apply to this product (e.g. water).
    NotApplicable,
}

impl EcoGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            EcoGrade::A => "a",
            EcoGrade::B => "b",
            EcoGrade::C => "c",
            EcoGrade::D => "d",
            EcoGrade::E => "e",
            EcoGrade::Unknown => "unknown",
            EcoGrade::NotApplicable => "not-applicable",
        }
    }
}

impl core::fmt::Display for EcoGrade {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EcoGrade {
    type Err = EnrichmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(EcoGrade::A),
            "b" => Ok(EcoGrade::B),
            "c" => Ok(EcoGrade::C),
            "d" => Ok(EcoGrade::D),
            "e" => Ok(EcoGrade::E),
            "unknown" => Ok(EcoGrade::Unknown),
            "not-applicable" | "not_applicable" => Ok(EcoGrade::NotApplicable),
            other => Err(EnrichmentError::Decode(format!("unrecognized grade {other:?}"))),
        }
    }
}

/// Why a lookup produced no grade. Never fatal for a request: the caller
/// downgrades it to a missing value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("eco-score lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("eco-score transport error: {0}")]
    Transport(String),

    #[error("eco-score service answered with status {0}")]
    Status(u16),

    #[error("no eco-score for {0:?}")]
    NotFound(String),

    #[error("malformed eco-score response: {0}")]
    Decode(String),

    #[error("invalid eco-score base url: {0}")]
    InvalidBaseUrl(String),

    #[error("eco-score lookups are disabled")]
    Disabled,
}

/// Capability to fetch the eco-score grade of a product by its lookup key.
#[async_trait]
pub trait EcoScoreClient: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<EcoGrade, EnrichmentError>;
}

/// Live adapter for the Open Food Facts product API
/// (`GET {base}/api/v0/product/{key}.json`).
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    product: Option<ProductPayload>,
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    ecoscore_grade: Option<String>,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EnrichmentError> {
        let base_url =
            Url::parse(base_url).map_err(|e| EnrichmentError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(EnrichmentError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shop-catalog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn product_url(&self, key: &str) -> Result<Url, EnrichmentError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EnrichmentError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v0", "product", format!("{key}.json").as_str()]);
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> EnrichmentError {
        if err.is_timeout() {
            EnrichmentError::Timeout(self.timeout)
        } else {
            EnrichmentError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl EcoScoreClient for OpenFoodFactsClient {
    async fn lookup(&self, key: &str) -> Result<EcoGrade, EnrichmentError> {
        let url = self.product_url(key)?;
        debug!(%url, "fetching eco-score");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !resp.status().is_success() {
            return Err(EnrichmentError::Status(resp.status().as_u16()));
        }

        let body: ProductResponse = resp
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout(self.timeout)
                } else {
                    EnrichmentError::Decode(e.to_string())
                }
            })?;

        if body.status != 1 {
            return Err(EnrichmentError::NotFound(key.to_string()));
        }
        body.product
            .and_then(|p| p.ecoscore_grade)
            .ok_or_else(|| EnrichmentError::NotFound(key.to_string()))?
            .parse()
    }
}

/// Deterministic stand-in: always answers with the same grade and records the
/// keys it was asked for.
#[derive(Debug)]
pub struct FixedEcoScore {
    grade: EcoGrade,
    calls: Mutex<Vec<String>>,
}

impl FixedEcoScore {
    pub fn new(grade: EcoGrade) -> Self {
        Self {
            grade,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Keys looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.to_vec()).unwrap_or_default()
    }
}

#[async_trait]
impl EcoScoreClient for FixedEcoScore {
    async fn lookup(&self, key: &str) -> Result<EcoGrade, EnrichmentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.to_string());
        }
        Ok(self.grade)
    }
}

/// Stand-in with one grade per key; unknown keys fail with `NotFound`.
/// An optional delay makes concurrent lookups overlap in tests.
#[derive(Debug, Default)]
pub struct KeyedEcoScore {
    grades: HashMap<String, EcoGrade>,
    delay: Option<Duration>,
}

impl KeyedEcoScore {
    pub fn new(grades: impl IntoIterator<Item = (String, EcoGrade)>) -> Self {
        Self {
            grades: grades.into_iter().collect(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl EcoScoreClient for KeyedEcoScore {
    async fn lookup(&self, key: &str) -> Result<EcoGrade, EnrichmentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.grades
            .get(key)
            .copied()
            .ok_or_else(|| EnrichmentError::NotFound(key.to_string()))
    }
}

/// Client used when lookups are switched off: every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEcoScore;

#[async_trait]
impl EcoScoreClient for UnavailableEcoScore {
    async fn lookup(&self, _key: &str) -> Result<EcoGrade, EnrichmentError> {
        Err(EnrichmentError::Disabled)
    }
}
