//! Logging and tracing utilities

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Options for [`init_tracing`]
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is not set
    pub default_directive: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LogOptions {
    /// Build options whose default filter is `warn` globally and `info`
    /// (`debug` when `debug` is set) for the given crates.
    pub fn for_crates(crates: &[&str], debug: bool) -> Self {
        Self {
            default_directive: crate_directive(crates, debug),
            format: LogFormat::Text,
        }
    }

    /// Switch to JSON output
    pub fn json(mut self, enabled: bool) -> Self {
        if enabled {
            self.format = LogFormat::Json;
        }
        self
    }
}

/// Build a filter directive such as `warn,my_crate=info`.
pub fn crate_directive(crates: &[&str], debug: bool) -> String {
    let level = if debug { "debug" } else { "info" };
    let mut directive = String::from("warn");
    for name in crates {
        directive.push(',');
        directive.push_str(&name.replace('-', "_"));
        directive.push('=');
        directive.push_str(level);
    }
    directive
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `options.default_directive`. Fails if a
/// global subscriber is already installed.
pub fn init_tracing(options: &LogOptions) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&options.default_directive));
    let registry = tracing_subscriber::registry().with(filter);

    match options.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    }
}
