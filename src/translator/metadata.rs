// Custom metadata for error nodes and reports
use crate::domain::{CustomData, LogEntry, LogEntryMessage};

/// Per-message `data`: level, attachment ids and trace id.
pub fn message_data(message: &LogEntryMessage) -> CustomData {
    let mut data = CustomData::new();
    data.insert_if_absent("level", message.level.to_string());

    if let Some(attachments) = message.attachments.as_ref().filter(|a| !a.is_empty()) {
        let ids: Vec<&str> = attachments.iter().map(|a| a.id.as_str()).collect();
        data.insert_if_absent("attachmentIds", ids.join(","));
    }

    if let Some(trace_id) = message.trace_id.as_deref().filter(|t| !t.is_empty()) {
        data.insert_if_absent("traceId", trace_id);
    }

    data
}

/// Report-level `userCustomData`.
///
/// Fixed fields are written first; headers come last and can never replace them.
pub fn user_custom_data(entry: &LogEntry) -> CustomData {
    let mut data = CustomData::new();
    data.insert_if_absent("id", entry.id.as_str());
    data.insert_if_absent("correlationId", entry.correlation_id.as_str());
    data.insert_if_absent("duration", entry.duration.to_string());
    data.insert_if_absent("serviceId", entry.service_id.as_str());
    data.insert_if_absent("serviceVersion", entry.service_version.as_str());
    data.insert_if_absent("serviceInstanceId", entry.service_instance_id.as_str());
    data.insert_if_absent("level", entry.level.to_string());

    if let Some(parent_id) = entry.parent_id.as_deref().filter(|p| !p.is_empty()) {
        data.insert_if_absent("parentId", parent_id);
    }
    if !entry.protocol.is_empty() {
        data.insert_if_absent("protocol", entry.protocol.as_str());
    }
    if !entry.route.is_empty() {
        data.insert_if_absent("route", entry.route.as_str());
    }

    if let Some(rabbit_mq) = &entry.rabbit_mq {
        data.insert_if_absent("rabbitMq.queueName", rabbit_mq.queue_name.as_str());
        data.insert_if_absent("rabbitMq.messageId", rabbit_mq.message_id.as_str());
        data.insert_if_absent("rabbitMq.acked", rabbit_mq.acked.to_string());
    }

    for (key, value) in entry.headers.iter() {
        if !key.is_empty() {
            data.insert_if_absent(key, value.to_string());
        }
    }

    data
}
