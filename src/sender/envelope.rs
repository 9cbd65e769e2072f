use crate::domain::ErrorReport;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Wire envelope for one entry posted to the tracking service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaygunEntry<'a> {
    pub occurred_on: String,
    pub details: RaygunDetails<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaygunDetails<'a> {
    pub machine_name: &'a str,
    pub version: &'a str,
    #[serde(flatten)]
    pub report: &'a ErrorReport,
}

impl<'a> RaygunEntry<'a> {
    pub fn new(report: &'a ErrorReport, machine_name: &'a str, occurred_on: DateTime<Utc>) -> Self {
        Self {
            occurred_on: occurred_on.to_rfc3339_opts(SecondsFormat::Millis, true),
            details: RaygunDetails {
                machine_name,
                version: &report.client.version,
                report,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientInfo, ErrorNode};
    use chrono::TimeZone;

    #[test]
    fn test_envelope_flattens_report_into_details() {
        let report = ErrorReport {
            client: ClientInfo {
                name: "billing".to_string(),
                version: "2.1".to_string(),
            },
            user_custom_data: [("id", "e-1")].into_iter().collect(),
            error: ErrorNode {
                message: "billing boom".to_string(),
                ..Default::default()
            },
            request: None,
            response: None,
            tags: vec!["Error".to_string()],
        };
        let occurred_on = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let value = serde_json::to_value(RaygunEntry::new(&report, "worker-1", occurred_on)).unwrap();

        assert_eq!(value["occurredOn"], "2024-05-01T12:00:00.000Z");
        assert_eq!(value["details"]["machineName"], "worker-1");
        assert_eq!(value["details"]["version"], "2.1");
        assert_eq!(value["details"]["client"]["name"], "billing");
        assert_eq!(value["details"]["error"]["message"], "billing boom");
        assert_eq!(value["details"]["userCustomData"]["id"], "e-1");
        assert_eq!(value["details"]["tags"][0], "Error");
        assert!(value["details"].get("request").is_none());
    }
}
