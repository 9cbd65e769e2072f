pub mod http;
pub mod metadata;
pub mod selection;
pub mod stack_trace;
pub mod tags;

pub use http::parse_query_string;
pub use selection::select_error;
pub use stack_trace::parse_stack_trace;
pub use tags::build_tags;

use crate::domain::{ClientInfo, ErrorReport, LogEntry, LogLevel};

/// Maps log entries onto error reports. Pure and deterministic.
#[derive(Debug, Clone, Copy)]
pub struct ErrorReportTranslator {
    min_level: LogLevel,
}

impl Default for ErrorReportTranslator {
    fn default() -> Self {
        Self::new(LogLevel::ERROR)
    }
}

impl ErrorReportTranslator {
    /// `min_level` is the severity a message needs to be reported as an error.
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    pub fn translate(&self, entry: &LogEntry) -> ErrorReport {
        ErrorReport {
            client: ClientInfo {
                name: entry.service_id.clone(),
                version: entry.service_version.clone(),
            },
            user_custom_data: metadata::user_custom_data(entry),
            error: select_error(entry, self.min_level),
            request: http::request_info(entry.http.as_ref()),
            response: http::response_info(entry.http.as_ref()),
            tags: build_tags(entry),
        }
    }
}
