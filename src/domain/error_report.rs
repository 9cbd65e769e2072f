use super::custom_data::CustomData;
use serde::Serialize;

/// The translated structure handed to the error-tracking transport.
///
/// Field names follow the tracking service's JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub client: ClientInfo,
    pub user_custom_data: CustomData,
    pub error: ErrorNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseInfo>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// One node of the error tree. Aggregated reports nest their members in `inner_errors`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNode {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<StackFrame>,
    #[serde(skip_serializing_if = "CustomData::is_empty")]
    pub data: CustomData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inner_errors: Vec<ErrorNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub file_name: String,
    pub class_name: String,
    pub method_name: String,
    pub line_number: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub http_method: String,
    pub url: String,
    pub host_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<CustomData>,
    pub headers: CustomData,
    pub raw_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    pub status_code: u16,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_node_serializes_in_camel_case() {
        let node = ErrorNode {
            message: "billing boom".to_string(),
            stack_trace: vec![StackFrame {
                file_name: "Invoice.cs".to_string(),
                class_name: "Billing.Invoice".to_string(),
                method_name: "Send".to_string(),
                line_number: 12,
            }],
            data: [("level", "Error")].into_iter().collect(),
            inner_errors: Vec::new(),
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "billing boom",
                "stackTrace": [{
                    "fileName": "Invoice.cs",
                    "className": "Billing.Invoice",
                    "methodName": "Send",
                    "lineNumber": 12
                }],
                "data": {"level": "Error"}
            })
        );
    }
}
