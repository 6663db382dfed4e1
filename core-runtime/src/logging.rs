//! # Logging
//!
//! One `tracing` subscriber per process, installed by [`init_logging`]
//! (normally from `CoreService::bootstrap` when `CoreConfig::logging` is set).
//!
//! Workspace crates log at the configured level while `sqlx`, `reqwest` and
//! the HTTP stack stay at `warn`. When the host passes a [`LoggerSink`], every
//! event that survives the filter is mirrored into it with token-like fields
//! replaced by `[REDACTED]`, so the desktop shell can show upload and sync
//! activity in its own console.
//!
//! ```ignore
//! let logging = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_logger_sink(Arc::new(RendererConsole::new()));
//! init_logging(logging)?;
//! tracing::warn!(target: "core_sync", "Quota exceeded, queue halted");
//! ```

use crate::error::{Error, Result};

use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use tokio::runtime;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

const CORE_TARGETS: &[&str] = &[
    "core_runtime",
    "core_auth",
    "core_sync",
    "core_library",
    "core_service",
    "provider_youtube",
    "bridge_desktop",
];

const QUIET_TARGETS: &[&str] = &["h2", "hyper", "reqwest", "sqlx"];

const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "password",
    "secret",
    "authorization",
    "bearer",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, coloured
    Pretty,
    /// One JSON object per line
    Json,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Replaces the default per-crate filter, e.g. `"core_sync=trace,sqlx=info"`.
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Redact token-like fields before they reach `logger_sink`.
    pub redact_secrets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger_sink: None,
            redact_secrets: true,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .field("redact_secrets", &self.redact_secrets)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_secret_redaction(mut self, redact: bool) -> Self {
        self.redact_secrets = redact;
        self
    }

    /// Checks that the filter directives parse.
    pub fn validate(&self) -> Result<()> {
        build_filter(self).map(|_| ())
    }
}

/// Installs the global subscriber.
///
/// # Errors
///
/// `Error::Config` for an unparsable filter, or when a global subscriber is
/// already installed in this process.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => {
            Box::new(tracing_subscriber::fmt::layer().pretty().with_writer(io::stdout))
        }
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(io::stdout),
        ),
        LogFormat::Compact => {
            Box::new(tracing_subscriber::fmt::layer().compact().with_writer(io::stdout))
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .with(LoggerSinkLayer::new(config.logger_sink, config.redact_secrets))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let level = match config.level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    };

    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => CORE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .chain(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)))
            .collect::<Vec<_>>()
            .join(","),
    };

    EnvFilter::try_new(directives).map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

/// Mirrors events into the host's [`LoggerSink`].
struct LoggerSinkLayer {
    sink: Option<Arc<dyn LoggerSink>>,
    redact: bool,
}

impl LoggerSinkLayer {
    fn new(sink: Option<Arc<dyn LoggerSink>>, redact: bool) -> Self {
        Self { sink, redact }
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        let level = log_level(*metadata.level());
        if level < sink.min_level() {
            return;
        }

        let mut visitor = SinkVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .message
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);

        for (key, value) in visitor.fields {
            let value = if self.redact {
                redact_if_sensitive(&key, &value)
            } else {
                value
            };
            entry = entry.with_field(key, value);
        }

        if let Some(span) = ctx.lookup_current() {
            entry.span_id = Some(span.name().to_string());
        }

        let sink = Arc::clone(sink);

        // Inside a runtime the sink runs detached; otherwise drive it inline.
        if let Ok(handle) = runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = sink.log(entry).await {
                    eprintln!("LoggerSink error: {}", err);
                }
            });
            return;
        }

        if let Err(err) = futures::executor::block_on(sink.log(entry)) {
            eprintln!("LoggerSink error: {}", err);
        }
    }
}

#[derive(Default)]
struct SinkVisitor {
    message: Option<String>,
    fields: HashMap<String, String>,
}

impl Visit for SinkVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_debug(field, &format_args!("{}", value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

fn log_level(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// `[REDACTED]` for token, secret and authorization fields, and for values
/// that look like email addresses (first character kept).
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let field = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|s| field.contains(s)) {
        return "[REDACTED]".to_string();
    }

    match value.find('@') {
        Some(at) if value[at..].contains('.') => {
            let initial: String = value[..at].chars().take(1).collect();
            format!("{}***@[REDACTED]", initial)
        }
        _ => value.to_string(),
    }
}
