use crate::domain::{LogEntry, QueueMessage};
use flate2::read::GzDecoder;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Gzip decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Incomplete log entry: {0}")]
    Incomplete(String),
}

const UTF8_BOM: char = '\u{feff}';

/// Turns raw queue message bodies into `LogEntry` records.
#[derive(Debug, Clone, Default)]
pub struct PayloadDecoder {}

impl PayloadDecoder {
    pub fn new() -> Self {
        Self {}
    }

    pub fn decode(&self, message: &QueueMessage) -> Result<LogEntry, DecodeError> {
        self.decode_payload(&message.body, message.content_encoding())
    }

    pub fn decode_payload(
        &self,
        body: &[u8],
        content_encoding: Option<&str>,
    ) -> Result<LogEntry, DecodeError> {
        let raw = if is_gzip(content_encoding) {
            gunzip(body)?
        } else {
            body.to_vec()
        };

        let json = String::from_utf8(raw)?;
        let json = json.strip_prefix(UTF8_BOM).unwrap_or(&json);
        let entry: LogEntry = serde_json::from_str(json)?;

        if entry.messages.is_empty() {
            return Err(DecodeError::Incomplete(format!(
                "log entry '{}' carries no messages",
                entry.id
            )));
        }

        Ok(entry)
    }
}

fn is_gzip(content_encoding: Option<&str>) -> bool {
    content_encoding.is_some_and(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"))
}

fn gunzip(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = GzDecoder::new(body);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(DecodeError::Decompress)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogLevel;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const ENTRY: &str = r#"{"id":"e-1","level":3,"serviceId":"billing","messages":[{"message":"boom","level":3}]}"#;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_plain_json() {
        let decoder = PayloadDecoder::new();
        let entry = decoder.decode_payload(ENTRY.as_bytes(), None).unwrap();

        assert_eq!(entry.id, "e-1");
        assert_eq!(entry.level, LogLevel::ERROR);
        assert_eq!(entry.messages.len(), 1);
    }

    #[test]
    fn test_decode_gzip_payload_case_insensitive() {
        let decoder = PayloadDecoder::new();
        let message = QueueMessage::new(gzip(ENTRY.as_bytes())).with_header("Content-Encoding", "GZip");

        let entry = decoder.decode(&message).unwrap();
        assert_eq!(entry.service_id, "billing");
    }

    #[test]
    fn test_decode_skips_leading_bom() {
        let decoder = PayloadDecoder::new();
        let body = [b"\xEF\xBB\xBF".as_slice(), ENTRY.as_bytes()].concat();

        let plain = decoder.decode_payload(&body, None).unwrap();
        assert_eq!(plain.id, "e-1");

        let zipped = decoder.decode_payload(&gzip(&body), Some("gzip")).unwrap();
        assert_eq!(zipped.service_id, "billing");
    }

    #[test]
    fn test_gzip_flag_with_plain_bytes_fails() {
        let decoder = PayloadDecoder::new();
        let result = decoder.decode_payload(ENTRY.as_bytes(), Some("gzip"));
        assert!(matches!(result.unwrap_err(), DecodeError::Decompress(_)));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let decoder = PayloadDecoder::new();
        let result = decoder.decode_payload(&[0x7b, 0xff, 0xfe, 0x7d], None);
        assert!(matches!(result.unwrap_err(), DecodeError::Utf8(_)));
    }

    #[test]
    fn test_malformed_json_fails() {
        let decoder = PayloadDecoder::new();
        let result = decoder.decode_payload(br#"{"id":"e-1","level":3"#, None);
        assert!(matches!(result.unwrap_err(), DecodeError::Json(_)));
    }

    #[test]
    fn test_empty_messages_is_incomplete() {
        let decoder = PayloadDecoder::new();
        let result = decoder.decode_payload(br#"{"id":"e-1","level":3,"messages":[]}"#, None);
        assert!(matches!(result.unwrap_err(), DecodeError::Incomplete(_)));

        let result = decoder.decode_payload(br#"{"id":"e-1","level":3}"#, None);
        assert!(matches!(result.unwrap_err(), DecodeError::Incomplete(_)));
    }
}
