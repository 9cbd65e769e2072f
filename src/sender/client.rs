use super::envelope::RaygunEntry;
use super::{ErrorReportTransport, TransportError};
use crate::domain::ErrorReport;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.raygun.com/entries";
const API_KEY_HEADER: &str = "X-ApiKey";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub user_agent: String,
    pub machine_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
            connection_timeout: Duration::from_secs(10),
            user_agent: format!("error-report-forwarder/{}", env!("CARGO_PKG_VERSION")),
            machine_name: hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_default(),
        }
    }
}

/// HTTP transport posting error reports to the Raygun intake API.
#[derive(Debug, Clone)]
pub struct RaygunClient {
    client: Client,
    config: ClientConfig,
    endpoint_url: Url,
}

impl RaygunClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let endpoint_url: Url = config.endpoint.parse().map_err(|e| {
            TransportError::InvalidConfiguration(format!("Invalid endpoint URL: {e}"))
        })?;

        if config.api_key.trim().is_empty() {
            return Err(TransportError::InvalidConfiguration(
                "API key must not be empty".to_string(),
            ));
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                TransportError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            endpoint_url,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint_url.as_str()
    }

    async fn post_report(&self, report: &ErrorReport) -> Result<(), TransportError> {
        let entry = RaygunEntry::new(report, &self.config.machine_name, chrono::Utc::now());
        let payload = serde_json::to_vec(&entry)?;

        let response = self
            .client
            .post(self.endpoint_url.clone())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(
                service = %report.client.name,
                status = status.as_u16(),
                "Error report accepted"
            );
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Error report rejected: {body}");
            Err(TransportError::HttpStatus {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

impl ErrorReportTransport for RaygunClient {
    async fn send(&self, report: &ErrorReport) -> Result<(), TransportError> {
        self.post_report(report).await
    }
}
