use bytes::Bytes;
use std::collections::HashMap;

pub const CONTENT_ENCODING: &str = "Content-Encoding";

/// A raw message as handed over by the queue client.
#[derive(Debug, Clone, Default)]
pub struct QueueMessage {
    pub body: Bytes,
    headers: HashMap<String, String>,
}

impl QueueMessage {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_encoding(&self) -> Option<&str> {
        self.header(CONTENT_ENCODING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let message = QueueMessage::new("{}").with_header("content-encoding", "gzip");
        assert_eq!(message.content_encoding(), Some("gzip"));
        assert_eq!(message.header("CONTENT-ENCODING"), Some("gzip"));
        assert_eq!(message.header("X-Missing"), None);
    }
}
