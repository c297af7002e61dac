//! Logging setup for dsync.
//!
//! Nothing is installed unless logging is requested through the environment:
//!
//! - `DSYNC_DEBUG=true|1|yes` - enable debug logging
//! - `DSYNC_LOG_LEVEL=trace|debug|info|warn|error` - set a specific level
//! - `DSYNC_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! Within the crate use the plain tracing macros:
//!
//! ```rust,ignore
//! use tracing::{debug, info};
//!
//! info!(endpoint = %endpoint.label(), "Backed up destination");
//! debug!(bytes = dump.len(), "Dump received");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Environment variable enabling debug logging.
pub const DEBUG_ENV: &str = "DSYNC_DEBUG";
/// Environment variable selecting the log level.
pub const LEVEL_ENV: &str = "DSYNC_LOG_LEVEL";
/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "DSYNC_LOG_FORMAT";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase).as_deref() {
            Some("pretty") => Self::Pretty,
            Some("compact") => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level directive applied to the dsync crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read the settings from the environment.
    ///
    /// Returns `None` when neither `DSYNC_DEBUG` nor `DSYNC_LOG_LEVEL` is set.
    pub fn from_env() -> Option<Self> {
        Self::resolve(
            env::var(DEBUG_ENV).ok().as_deref(),
            env::var(LEVEL_ENV).ok().as_deref(),
            env::var(FORMAT_ENV).ok().as_deref(),
        )
    }

    fn resolve(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Option<Self> {
        let debug = debug.is_some_and(is_truthy);
        if !debug && level.is_none() {
            return None;
        }

        let fallback = if debug { "debug" } else { "warn" };
        let level = match level.map(str::to_lowercase).as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => fallback,
        };

        Some(Self {
            level,
            format: LogFormat::parse(format),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Initialize logging from the environment.
///
/// Call once at startup; later calls are no-ops.
pub fn init() {
    if let Some(settings) = LogSettings::from_env() {
        init_with(settings);
    }
}

/// Initialize logging with explicit settings.
///
/// Only the first initialization in a process takes effect.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "dsync={0},dsync_migrate={0},dsync_cli={0}",
                settings.level
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let registry = tracing_subscriber::registry().with(filter);
            match settings.format {
                LogFormat::Json => registry
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init(),
                LogFormat::Pretty => registry
                    .with(fmt::layer().pretty().with_writer(std::io::stderr))
                    .init(),
                LogFormat::Compact => registry
                    .with(fmt::layer().compact().with_writer(std::io::stderr))
                    .init(),
            }

            tracing::debug!(level = settings.level, "dsync logging initialized");
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            // Without the subscriber feature the embedding application owns tracing.
            let _ = settings;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_requested() {
        assert_eq!(LogSettings::resolve(None, None, None), None);
        assert_eq!(LogSettings::resolve(Some("0"), None, Some("json")), None);
    }

    #[test]
    fn test_debug_flag() {
        let settings = LogSettings::resolve(Some("TRUE"), None, None).unwrap();
        assert_eq!(settings.level, "debug");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_explicit_level_wins() {
        let settings = LogSettings::resolve(Some("yes"), Some("Info"), Some("compact")).unwrap();
        assert_eq!(settings.level, "info");
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        assert_eq!(
            LogSettings::resolve(None, Some("loud"), None).unwrap().level,
            "warn"
        );
        assert_eq!(
            LogSettings::resolve(Some("1"), Some("loud"), Some("pretty")),
            Some(LogSettings {
                level: "debug",
                format: LogFormat::Pretty,
            })
        );
    }
}
