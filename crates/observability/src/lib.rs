//! Process-wide logging setup shared by the binaries.

/// Tracing subscriber installation.
pub mod tracing;

pub use self::tracing::{LogFormat, TracingConfig};

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    tracing::init(&TracingConfig::from_env());
}
