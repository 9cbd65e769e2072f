use crate::domain::LogEntry;

/// Level, protocol, route, then service id and "<service> <version>".
/// Blank entries are dropped; duplicates are kept.
pub fn build_tags(entry: &LogEntry) -> Vec<String> {
    let mut tags = vec![
        entry.level.to_string(),
        entry.protocol.clone(),
        entry.route.clone(),
    ];

    if !entry.service_id.is_empty() {
        tags.push(entry.service_id.clone());
        tags.push(format!("{} {}", entry.service_id, entry.service_version));
    }

    tags.retain(|tag| !tag.trim().is_empty());
    tags
}
