//! Domain layer for error-report-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEntry`: The inbound queue payload
//! - `ErrorReport`: The outbound error-tracking payload
//! - `LogLevel`: Integer-comparable severity
//! - `CustomData`: Ordered first-writer-wins string map
//! - `QueueMessage`: Raw message bytes plus headers
//! - `ForwarderError`: Top-level error type

pub mod custom_data;
pub mod error;
pub mod error_report;
pub mod log_entry;
pub mod log_level;
pub mod queue_message;
pub mod serde_helpers;

pub use custom_data::CustomData;
pub use error::ForwarderError;
pub use error_report::{ClientInfo, ErrorNode, ErrorReport, RequestInfo, ResponseInfo, StackFrame};
pub use log_entry::{
    Attachment, HttpCapture, HttpRequestCapture, HttpResponseCapture, LogEntry, LogEntryMessage,
    RabbitMqCapture,
};
pub use log_level::{LogLevel, ParseLevelError};
pub use queue_message::{CONTENT_ENCODING, QueueMessage};
pub use serde_helpers::{KeyValueList, RawBody};
