use super::config::{LogFormat, TracingLevel};
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug, Clone)]
pub enum LoggingError {
    #[error("Invalid filter '{filter}': {details}")]
    InvalidFilter { filter: String, details: String },
    #[error("Logging system initialization failed: {0}")]
    InitFailed(String),
}

/// Builds the tracing subscriber: a default level plus per-target directives.
pub struct LoggingSystem {
    directives: Vec<(String, TracingLevel)>,
    format: LogFormat,
}

impl LoggingSystem {
    pub fn new(format: LogFormat) -> Self {
        Self {
            directives: Vec::new(),
            format,
        }
    }

    pub fn add_directive(&mut self, target: impl Into<String>, level: TracingLevel) {
        let target = target.into();
        if target.trim().is_empty() {
            return;
        }
        self.directives.push((target, level));
    }

    /// Quiets chatty dependencies.
    pub fn add_default_directives(&mut self) {
        for target in ["lapin", "amq_protocol", "hyper", "hyper_util", "reqwest", "h2"] {
            self.add_directive(target, TracingLevel::Warn);
        }
    }

    pub fn build_filter_string(&self, default_level: TracingLevel) -> String {
        let mut parts = Vec::with_capacity(self.directives.len() + 1);
        parts.push(default_level.as_str().to_string());
        for (target, level) in &self.directives {
            parts.push(format!("{target}={}", level.as_str()));
        }
        parts.join(",")
    }

    /// Installs the global subscriber. `RUST_LOG` overrides the built filter.
    pub fn initialize_tracing(&self, default_level: TracingLevel) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&filter_string).map_err(|e| LoggingError::InvalidFilter {
                filter: filter_string.clone(),
                details: e.to_string(),
            })?,
        };

        let result = match self.format {
            LogFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_current_span(false))
                .try_init(),
        };

        result.map_err(|e| LoggingError::InitFailed(e.to_string()))
    }
}

/// Sets up global logging once; later calls return the first outcome.
pub fn setup_logging_safe(level: TracingLevel, format: LogFormat) -> Result<(), LoggingError> {
    static INIT: OnceLock<Result<(), LoggingError>> = OnceLock::new();

    INIT.get_or_init(|| {
        let mut logging_system = LoggingSystem::new(format);
        logging_system.add_default_directives();
        logging_system.initialize_tracing(level)
    })
    .clone()
}
