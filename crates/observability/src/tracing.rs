//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Output encoding of log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Directive used when `RUST_LOG` is unset or unparsable.
    pub default_directive: String,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl TracingConfig {
    /// `SHOP_LOG_FORMAT=pretty` switches to human-readable output.
    pub fn from_env() -> Self {
        Self::from_format_var(std::env::var("SHOP_LOG_FORMAT").ok().as_deref())
    }

    fn from_format_var(raw: Option<&str>) -> Self {
        let format = match raw.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };
        Self {
            format,
            ..Self::default()
        }
    }
}

/// Install the global subscriber. Subsequent calls are no-ops.
pub fn init(config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match config.format {
        LogFormat::Json => builder.json().with_current_span(true).with_target(false).try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
