use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity carried by log entries and their messages.
///
/// Levels are integer-comparable: producers may emit values outside the
/// well-known set, and those still order correctly against the thresholds.
/// This is distinct from `TracingLevel`, which configures the forwarder's own logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogLevel(i32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid log level '{0}'. Expected an integer or one of: debug, info, warning, error, critical")]
pub struct ParseLevelError(pub String);

impl LogLevel {
    pub const DEBUG: LogLevel = LogLevel(0);
    pub const INFO: LogLevel = LogLevel(1);
    pub const WARNING: LogLevel = LogLevel(2);
    pub const ERROR: LogLevel = LogLevel(3);
    pub const CRITICAL: LogLevel = LogLevel(4);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Name of a well-known level, `None` for any other value.
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("Debug"),
            1 => Some("Info"),
            2 => Some("Warning"),
            3 => Some("Error"),
            4 => Some("Critical"),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i32>() {
            return Ok(Self(value));
        }
        match trimmed.to_lowercase().as_str() {
            "debug" => Ok(Self::DEBUG),
            "info" | "information" => Ok(Self::INFO),
            "warn" | "warning" => Ok(Self::WARNING),
            "error" => Ok(Self::ERROR),
            "critical" | "fatal" => Ok(Self::CRITICAL),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<i32> for LogLevel {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LogLevelVisitor)
    }
}

struct LogLevelVisitor;

impl Visitor<'_> for LogLevelVisitor {
    type Value = LogLevel;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an integer severity or a level name")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<LogLevel, E> {
        i32::try_from(value)
            .map(LogLevel)
            .map_err(|_| E::custom(format!("level out of range: {value}")))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<LogLevel, E> {
        i32::try_from(value)
            .map(LogLevel)
            .map_err(|_| E::custom(format!("level out of range: {value}")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<LogLevel, E> {
        value.parse().map_err(E::custom)
    }
}
