//! Test logging for beanbox.
//!
//! Provider operations emit `tracing` events: registrations, fabricated
//! doubles and bean creation at `debug`, registry lookups at `trace`. This
//! module installs a subscriber that routes those events through the test
//! harness's captured output.
//!
//! # Examples
//!
//! ```no_run
//! use beanbox_core::logging::*;
//!
//! // Level and format from BEANBOX_LOG / BEANBOX_LOG_FORMAT
//! init();
//!
//! // Explicit configuration
//! LogConfig::new()
//!     .level(LogLevel::Trace)
//!     .format(LogFormat::Compact)
//!     .init();
//! ```
//!
//! # Environment Variables
//!
//! - `BEANBOX_LOG=debug` - Level or full filter directive (`beanbox_core=trace`)
//! - `BEANBOX_LOG_FORMAT=pretty|compact|json` - Output format

use std::env;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use tracing::{debug, error, info, trace, warn};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Convert to string for EnvFilter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable
    Pretty,
    /// Single line per event (default)
    Compact,
    /// Structured JSON
    Json,
}

impl LogFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Include span close events
    pub spans: bool,
    /// Custom filter directive (overrides level if set)
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            spans: false,
            env_filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from `BEANBOX_LOG` and `BEANBOX_LOG_FORMAT`.
    ///
    /// `BEANBOX_LOG` may be a bare level or a full filter directive.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(directive) = env::var("BEANBOX_LOG") {
            match LogLevel::from_str(&directive) {
                Some(level) => config.level = level,
                None => config.env_filter = Some(directive),
            }
        }

        if let Some(format) = env::var("BEANBOX_LOG_FORMAT")
            .ok()
            .and_then(|s| LogFormat::from_str(&s))
        {
            config.format = format;
        }

        config
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.spans = enable;
        self
    }

    /// Set a filter directive such as `"beanbox_core=trace"`.
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(directive) => {
                EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Install the subscriber.
    ///
    /// Returns `false` when a global subscriber was already installed, which
    /// is the normal case for every test after the first one.
    pub fn init(&self) -> bool {
        let fmt_span = if self.spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = match self.format {
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_test_writer()
                .with_span_events(fmt_span)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_test_writer()
                .with_span_events(fmt_span)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_test_writer()
                .with_span_events(fmt_span)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(self.filter())
            .with(layer)
            .try_init()
            .is_ok()
    }
}

/// Install a subscriber configured from the environment.
pub fn init() -> bool {
    LogConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("beanbox_core=trace"), None);
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::from_str("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_str("Pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_str("xml"), None);
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::new()
            .level(LogLevel::Debug)
            .format(LogFormat::Json)
            .with_spans(true)
            .with_env_filter("beanbox_core=trace");

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.spans);
        assert_eq!(config.env_filter.as_deref(), Some("beanbox_core=trace"));
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LogConfig::new().level(LogLevel::Trace);
        config.init();
        // A second install never succeeds
        assert!(!config.init());
    }
}
