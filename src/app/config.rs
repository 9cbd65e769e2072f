use crate::domain::LogLevel;
use crate::sender::client::DEFAULT_ENDPOINT;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Argument error: {0}")]
    Args(#[from] clap::Error),
}

/// Verbosity of the forwarder's own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl TracingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TracingLevel::Error => "error",
            TracingLevel::Warn => "warn",
            TracingLevel::Info => "info",
            TracingLevel::Debug => "debug",
            TracingLevel::Trace => "trace",
        }
    }
}

/// Output format of the forwarder's own logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// RabbitMQ host
    #[arg(long, env = "RABBITMQ_HOST", default_value = "localhost")]
    pub rabbitmq_host: String,

    /// RabbitMQ port
    #[arg(long, env = "RABBITMQ_PORT", default_value = "5672")]
    pub rabbitmq_port: u16,

    /// Connection name reported to the broker
    #[arg(
        long,
        env = "RABBITMQ_CONNECTIONNAME",
        default_value = "error-report-forwarder"
    )]
    pub rabbitmq_connection_name: String,

    /// Queue carrying the log entries
    #[arg(long, env = "RABBITMQ_QUEUE_NAME", default_value = "")]
    pub rabbitmq_queue_name: String,

    /// Number of independent sequential consumers
    #[arg(long, env = "CONCURRENT_CONSUMERS", default_value = "1")]
    pub concurrent_consumers: usize,

    /// Raygun API key
    #[arg(long, env = "RAYGUN_API_KEY", default_value = "", hide_env_values = true)]
    pub raygun_api_key: String,

    /// Raygun intake endpoint
    #[arg(long, env = "RAYGUN_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub raygun_endpoint: String,

    /// Minimum severity a message needs to be reported as an error (integer or name)
    #[arg(long, env = "MIN_LEVEL", default_value = "3")]
    pub min_level: LogLevel,

    /// Deadline for delivering one report, in seconds
    #[arg(long, env = "SEND_TIMEOUT_SECS", default_value = "60")]
    pub send_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    pub log_level: TracingLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Derived fields (not CLI arguments)
    #[arg(skip)]
    pub send_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rabbitmq_host: "localhost".to_string(),
            rabbitmq_port: 5672,
            rabbitmq_connection_name: "error-report-forwarder".to_string(),
            rabbitmq_queue_name: String::new(),
            concurrent_consumers: 1,
            raygun_api_key: String::new(),
            raygun_endpoint: DEFAULT_ENDPOINT.to_string(),
            min_level: LogLevel::ERROR,
            send_timeout_secs: 60,
            log_level: TracingLevel::Info,
            log_format: LogFormat::Compact,
            send_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Parses CLI args, falling back to the environment for unset flags.
    pub fn from_args_and_env<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::try_parse_from(args)?;
        config.post_process();
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) {
        self.send_timeout = Duration::from_secs(self.send_timeout_secs);
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.raygun_endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid Raygun endpoint URL '{}': {}",
                self.raygun_endpoint, e
            ))
        })?;

        if self.rabbitmq_queue_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "RABBITMQ_QUEUE_NAME must be set".to_string(),
            ));
        }

        if self.raygun_api_key.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "RAYGUN_API_KEY must be set".to_string(),
            ));
        }

        if self.concurrent_consumers == 0 {
            return Err(ConfigError::InvalidConfig(
                "Concurrent consumers must be greater than 0".to_string(),
            ));
        }

        if self.concurrent_consumers > usize::from(u16::MAX) {
            return Err(ConfigError::InvalidConfig(format!(
                "Concurrent consumers must not exceed {}",
                u16::MAX
            )));
        }

        if self.send_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Send timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn amqp_uri(&self) -> String {
        format!("amqp://{}:{}/%2f", self.rabbitmq_host, self.rabbitmq_port)
    }
}
