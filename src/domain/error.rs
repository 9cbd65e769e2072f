use thiserror::Error;

/// Top-level error type for forwarder startup and shutdown.
///
/// Per-message failures never surface here; they are reported through the
/// coordinator's ack/requeue outcome instead.
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
