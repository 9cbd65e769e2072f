pub mod client;
pub mod envelope;

pub use client::{ClientConfig, RaygunClient};
pub use envelope::RaygunEntry;

use crate::domain::ErrorReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP error: {status} - {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outbound delivery of error reports to the tracking service.
///
/// Completion, successful or not, is what the coordinator waits for; the
/// result itself never decides whether the queue message is acknowledged.
pub trait ErrorReportTransport: Send + Sync {
    fn send(
        &self,
        report: &ErrorReport,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
