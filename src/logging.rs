// ABOUTME: Logging configuration and structured tracing setup for the analysis pipeline
// ABOUTME: Chooses format, level and detail from the environment and silences HTTP client noise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging setup
//!
//! Logs go to stderr so machine-readable command output on stdout stays clean.

use anyhow::{anyhow, Result};
use std::env;
use std::io;
use tracing::{debug, Level, Subscriber};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Emit span open/close events
    pub include_spans: bool,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines
    Json,
    /// Full human-readable output with event targets
    Pretty,
    /// Single-line output
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    ///
    /// `RUST_LOG`, `LOG_FORMAT` (`json`, `pretty`, `compact`),
    /// `LOG_INCLUDE_LOCATION`, `LOG_INCLUDE_THREAD`, `LOG_INCLUDE_SPANS`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env::var("RUST_LOG").unwrap_or(defaults.level),
            format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                Ok("pretty") => LogFormat::Pretty,
                _ => LogFormat::Compact,
            },
            include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
        }
    }

    /// Same configuration at a different level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Filter with the configured level plus fixed noise reduction for the HTTP stack
    fn env_filter(&self) -> EnvFilter {
        let quiet = |directive: &str, fallback: Level| -> Directive {
            directive.parse().unwrap_or_else(|_| fallback.into())
        };
        let mut filter = EnvFilter::new(&self.level)
            .add_directive(quiet("hyper=warn", Level::WARN))
            .add_directive(quiet("hyper_util=warn", Level::WARN))
            .add_directive(quiet("reqwest=warn", Level::WARN))
            .add_directive(quiet("rustls=warn", Level::WARN));

        // A bare level also applies to our own targets
        if let Ok(level) = self.level.parse::<Level>() {
            filter = filter.add_directive(quiet(&format!("platewise={level}"), level));
        }
        filter
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Formatting layer for the configured format, writing to stderr
    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        match self.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_file(self.include_location)
                .with_line_number(self.include_location)
                .with_thread_ids(self.include_thread)
                .with_thread_names(self.include_thread)
                .with_writer(io::stderr)
                .with_span_events(self.span_events())
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_file(self.include_location)
                .with_line_number(self.include_location)
                .with_thread_ids(self.include_thread)
                .with_thread_names(self.include_thread)
                .with_writer(io::stderr)
                .with_span_events(self.span_events())
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_file(self.include_location)
                .with_line_number(self.include_location)
                .with_thread_ids(self.include_thread)
                .with_target(false)
                .with_writer(io::stderr)
                .with_span_events(self.span_events())
                .boxed(),
        }
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(self.fmt_layer())
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

        debug!(
            level = %self.level,
            format = ?self.format,
            version = env!("CARGO_PKG_VERSION"),
            "Logging initialized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("LOG_FORMAT", "json");
        env::set_var("LOG_INCLUDE_LOCATION", "1");
        env::remove_var("LOG_INCLUDE_THREAD");
        let config = LoggingConfig::from_env();
        env::remove_var("LOG_FORMAT");
        env::remove_var("LOG_INCLUDE_LOCATION");

        assert_eq!(config.format, LogFormat::Json);
        assert!(config.include_location);
        assert!(!config.include_thread);
    }

    #[test]
    fn test_every_format_builds_a_layer() {
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            let config = LoggingConfig {
                format,
                include_location: true,
                include_thread: true,
                include_spans: true,
                ..LoggingConfig::default()
            };
            let subscriber = tracing_subscriber::registry()
                .with(config.env_filter())
                .with(config.fmt_layer());
            tracing::subscriber::with_default(subscriber, || {
                tracing::warn!(format = ?format, "layer installed");
            });
        }
    }

    #[test]
    fn test_filter_accepts_directives() {
        let config = LoggingConfig::default().with_level("platewise::comparison=debug,info");
        let rendered = config.env_filter().to_string().to_lowercase();
        assert!(rendered.contains("reqwest=warn"));
        assert!(rendered.contains("platewise::comparison=debug"));

        let bare = LoggingConfig::default()
            .with_level("debug")
            .env_filter()
            .to_string()
            .to_lowercase();
        assert!(bare.contains("platewise=debug"));
    }
}
