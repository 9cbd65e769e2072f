#[cfg(feature = "amqp")]
pub mod amqp;
pub mod config;
pub mod consumer;
pub mod coordinator;
pub mod logging_system;
pub mod shutdown;

pub use config::{Config, ConfigError, LogFormat, TracingLevel};
pub use consumer::{ConsumerPool, Delivery};
pub use coordinator::{DeliveryCoordinator, DeliveryOutcome};
pub use logging_system::{LoggingSystem, setup_logging_safe};

use crate::domain::ForwarderError;
use crate::sender::{ClientConfig, RaygunClient};
use crate::translator::ErrorReportTranslator;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

pub struct App {
    config: Config,
    coordinator: DeliveryCoordinator<RaygunClient>,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args_and_env(args)?;
        Ok(Self::from_config(config)?)
    }

    pub fn from_config(config: Config) -> Result<Self, ForwarderError> {
        let client_config = ClientConfig {
            endpoint: config.raygun_endpoint.clone(),
            api_key: config.raygun_api_key.clone(),
            timeout: config.send_timeout,
            ..ClientConfig::default()
        };
        let client = RaygunClient::new(client_config)
            .map_err(|e| ForwarderError::Transport(e.to_string()))?;

        let coordinator = DeliveryCoordinator::new(
            ErrorReportTranslator::new(config.min_level),
            Arc::new(client),
        )
        .with_send_timeout(config.send_timeout);

        Ok(Self {
            config,
            coordinator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn coordinator(&self) -> &DeliveryCoordinator<RaygunClient> {
        &self.coordinator
    }

    /// Consumes until SIGINT/SIGTERM, then drains in-flight messages and closes the connection.
    #[cfg(feature = "amqp")]
    pub async fn run(self) -> Result<(), ForwarderError> {
        use tokio::sync::mpsc;
        use tokio_util::sync::CancellationToken;

        let cancel = CancellationToken::new();
        let signals = shutdown::spawn_signal_listener(cancel.clone());

        let mut source = amqp::AmqpSource::connect(&self.config).await?;
        let (tx, rx) = mpsc::channel(self.config.concurrent_consumers);
        let pool = ConsumerPool::new(self.coordinator, self.config.concurrent_consumers);
        let workers = tokio::spawn(pool.run(rx, cancel.clone()));

        info!(
            "error-report-forwarder is running on queue '{}'. Press Ctrl+C to stop.",
            self.config.rabbitmq_queue_name
        );

        let consumed = source.run(tx, cancel.clone()).await;

        cancel.cancel();
        if let Err(e) = workers.await {
            error!("Consumer pool task failed: {e}");
        }
        signals.abort();

        let closed = source.close().await;
        info!("error-report-forwarder stopped.");
        consumed.and(closed)
    }

    #[cfg(not(feature = "amqp"))]
    pub async fn run(self) -> Result<(), ForwarderError> {
        Err(ForwarderError::Config(
            "built without the `amqp` feature; no queue source available".to_string(),
        ))
    }
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-V") {
        println!("error-report-forwarder {}", get_version());
        return Ok(());
    }

    let config = match Config::from_args_and_env(&args) {
        Ok(config) => config,
        Err(ConfigError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging_safe(config.log_level, config.log_format) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(1);
    }

    info!(
        "Starting error-report-forwarder v{} (min_level={}, consumers={}, send_timeout={}s)",
        get_version(),
        config.min_level,
        config.concurrent_consumers,
        config.send_timeout_secs
    );

    let app = match App::from_config(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Initialization error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("Application error: {e}");
        process::exit(1);
    }

    Ok(())
}
