use super::log_level::LogLevel;
use super::serde_helpers::{KeyValueList, RawBody, null_as_default};
use serde::Deserialize;
use serde_json::Value;

/// One structured event consumed from the queue.
///
/// Built once per queue message by the decoder and never mutated afterwards.
/// A single entry may carry several sub-errors in `messages`, e.g. an exception
/// and its inner exceptions recorded as siblings by the producer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub correlation_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub service_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_version: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_instance_id: String,

    pub level: LogLevel,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub protocol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub route: String,

    #[serde(default)]
    pub headers: KeyValueList<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<LogEntryMessage>,

    #[serde(default)]
    pub http: Option<HttpCapture>,
    #[serde(default, rename = "rabbitMQ", alias = "rabbitMq")]
    pub rabbit_mq: Option<RabbitMqCapture>,
}

/// A single sub-error within a log entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stacktrace: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: LogLevel,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
}

/// Captured HTTP exchange attached to a log entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpCapture {
    #[serde(default)]
    pub request: Option<HttpRequestCapture>,
    #[serde(default)]
    pub response: Option<HttpResponseCapture>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequestCapture {
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,
    /// Not necessarily an absolute URL; may carry a query string after `?`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(default)]
    pub headers: KeyValueList<String>,
    #[serde(default)]
    pub body: RawBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponseCapture {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub body: RawBody,
}

/// Transport metadata recorded by the producer for diagnostics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RabbitMqCapture {
    #[serde(default, deserialize_with = "null_as_default")]
    pub queue_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub acked: bool,
}
