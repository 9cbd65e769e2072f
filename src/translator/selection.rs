// Severity-based selection and aggregation of error messages
use super::metadata::message_data;
use super::stack_trace::parse_stack_trace;
use crate::domain::{ErrorNode, LogEntry, LogEntryMessage, LogLevel};
use tracing::debug;

/// Builds the error tree for an entry.
///
/// Messages at or above `min_level` qualify. No qualifying message falls back to
/// the highest-level message overall; one yields a single node; several yield an
/// aggregate node whose children are all qualifying messages in order.
pub fn select_error(entry: &LogEntry, min_level: LogLevel) -> ErrorNode {
    let qualifying: Vec<&LogEntryMessage> = entry
        .messages
        .iter()
        .filter(|m| m.level >= min_level)
        .collect();

    match qualifying.as_slice() {
        [] => {
            debug!(
                entry_id = %entry.id,
                %min_level,
                "No message meets the minimum level; using the most severe one"
            );
            highest_level(entry.messages.iter())
                .map(|message| error_node(message, &entry.service_id))
                .unwrap_or_default()
        }
        [single] => error_node(single, &entry.service_id),
        many => {
            let message = highest_level(many.iter().copied())
                .map(|m| prefixed(&entry.service_id, &m.message))
                .unwrap_or_default();
            ErrorNode {
                message,
                inner_errors: many.iter().copied().map(leaf_node).collect(),
                ..ErrorNode::default()
            }
        }
    }
}

/// First message holding the maximum level.
pub fn highest_level<'a, I>(messages: I) -> Option<&'a LogEntryMessage>
where
    I: IntoIterator<Item = &'a LogEntryMessage>,
{
    messages
        .into_iter()
        .reduce(|best, next| if next.level > best.level { next } else { best })
}

fn error_node(message: &LogEntryMessage, service_id: &str) -> ErrorNode {
    ErrorNode {
        message: prefixed(service_id, &message.message),
        ..leaf_node(message)
    }
}

fn leaf_node(message: &LogEntryMessage) -> ErrorNode {
    ErrorNode {
        message: message.message.clone(),
        stack_trace: parse_stack_trace(&message.stacktrace),
        data: message_data(message),
        inner_errors: Vec::new(),
    }
}

fn prefixed(service_id: &str, text: &str) -> String {
    format!("{service_id} {text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str, level: LogLevel) -> LogEntryMessage {
        LogEntryMessage {
            message: text.to_string(),
            level,
            ..Default::default()
        }
    }

    fn entry(messages: Vec<LogEntryMessage>) -> LogEntry {
        LogEntry {
            id: "e-1".to_string(),
            service_id: "billing".to_string(),
            level: LogLevel::ERROR,
            messages,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_qualifying_message() {
        let entry = entry(vec![
            message("debug noise", LogLevel::DEBUG),
            message("payment failed", LogLevel::ERROR),
        ]);

        let node = select_error(&entry, LogLevel::ERROR);
        assert_eq!(node.message, "billing payment failed");
        assert!(node.inner_errors.is_empty());
        assert_eq!(node.data.get("level"), Some("Error"));
    }

    #[test]
    fn test_multiple_qualifying_messages_aggregate() {
        let entry = entry(vec![
            message("outer", LogLevel::ERROR),
            message("info", LogLevel::INFO),
            message("inner fatal", LogLevel::CRITICAL),
        ]);

        let node = select_error(&entry, LogLevel::ERROR);
        assert_eq!(node.message, "billing inner fatal");
        assert!(node.stack_trace.is_empty());
        assert!(node.data.is_empty());

        let children: Vec<&str> = node.inner_errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(children, vec!["outer", "inner fatal"]);
        assert_eq!(node.inner_errors[1].data.get("level"), Some("Critical"));
    }

    #[test]
    fn test_fallback_uses_highest_level_overall() {
        let entry = entry(vec![
            message("first", LogLevel::INFO),
            message("second", LogLevel::WARNING),
            message("third", LogLevel::DEBUG),
        ]);

        let node = select_error(&entry, LogLevel::ERROR);
        assert_eq!(node.message, "billing second");
        assert!(node.inner_errors.is_empty());
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        let tied_warnings = entry(vec![
            message("early", LogLevel::WARNING),
            message("late", LogLevel::WARNING),
        ]);
        assert_eq!(select_error(&tied_warnings, LogLevel::ERROR).message, "billing early");

        let tied_errors = entry(vec![
            message("a", LogLevel::CRITICAL),
            message("b", LogLevel::ERROR),
            message("c", LogLevel::CRITICAL),
        ]);
        let node = select_error(&tied_errors, LogLevel::ERROR);
        assert_eq!(node.message, "billing a");
        assert_eq!(node.inner_errors.len(), 3);
    }
}
