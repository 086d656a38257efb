//! Process configuration read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `SHOP_BIND_ADDR` | `0.0.0.0:8080` |
//! | `SHOP_ECOSCORE_BASE_URL` | `https://world.openfoodfacts.org` |
//! | `SHOP_ECOSCORE_TIMEOUT_MS` | `2000` |
//! | `SHOP_ECOSCORE_ENABLED` | `true` |
//! | `SHOP_SEED_FILE` | unset |
//! | `USE_PERSISTENT_STORES` | `false` |
//! | `DATABASE_URL` | unset |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ECOSCORE_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const DEFAULT_ECOSCORE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcoScoreConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Upper bound for one lookup, applied per product.
    pub timeout: Duration,
}

impl Default for EcoScoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_ECOSCORE_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_ECOSCORE_TIMEOUT_MS),
        }
    }
}

/// Where catalog rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceConfig {
    /// In-memory store, optionally seeded from a JSON fixture.
    InMemory { seed_file: Option<PathBuf> },
    /// Existing Postgres tables.
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub ecoscore: EcoScoreConfig,
    pub persistence: PersistenceConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("SHOP_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("SHOP_BIND_ADDR", e.to_string()))?;

        let timeout_ms = match var("SHOP_ECOSCORE_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid("SHOP_ECOSCORE_TIMEOUT_MS", e.to_string()))?,
            None => DEFAULT_ECOSCORE_TIMEOUT_MS,
        };
        if timeout_ms == 0 {
            return Err(ConfigError::invalid("SHOP_ECOSCORE_TIMEOUT_MS", "must be positive"));
        }

        let ecoscore = EcoScoreConfig {
            enabled: parse_flag("SHOP_ECOSCORE_ENABLED", var("SHOP_ECOSCORE_ENABLED"), true)?,
            base_url: var("SHOP_ECOSCORE_BASE_URL").unwrap_or_else(|| DEFAULT_ECOSCORE_BASE_URL.to_string()),
            timeout: Duration::from_millis(timeout_ms),
        };

        let persistent = parse_flag("USE_PERSISTENT_STORES", var("USE_PERSISTENT_STORES"), false)?;
        let persistence = if persistent {
            PersistenceConfig::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            }
        } else {
            PersistenceConfig::InMemory {
                seed_file: var("SHOP_SEED_FILE").map(PathBuf::from),
            }
        };

        Ok(Self {
            bind_addr,
            ecoscore,
            persistence,
        })
    }
}

fn parse_flag(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, format!("expected a boolean, got {raw:?}"))),
    }
}
