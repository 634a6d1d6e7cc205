// ABOUTME: Custom-resource response sent back to the stack engine.
// ABOUTME: Exactly one per request, SUCCESS or FAILED, with optional data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::request::CustomResourceRequest;

/// Longest `Reason` sent back; the stack engine caps the whole body at 4 KiB.
const MAX_REASON_CHARS: usize = 1000;

/// Attribute values exposed to the template.
pub type ResponseData = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: ResponseData,
}

impl CustomResourceResponse {
    pub fn for_request(
        request: &CustomResourceRequest,
        status: ResponseStatus,
        reason: &str,
        data: ResponseData,
    ) -> Self {
        Self {
            status,
            reason: truncate_chars(reason, MAX_REASON_CHARS),
            physical_resource_id: request.stable_physical_id(),
            stack_id: request.stack_id.clone(),
            request_id: request.request_id.clone(),
            logical_resource_id: request.logical_resource_id.clone(),
            no_echo: false,
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Cut a message to at most `limit` characters, marking the cut.
pub(crate) fn truncate_chars(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message.to_string();
    }
    let mut cut: String = message.chars().take(limit.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let request = CustomResourceRequest::from_json(
            r#"{"RequestType":"Create","ResponseURL":"http://x/","StackId":"s","RequestId":"r","LogicalResourceId":"L"}"#,
        )
        .unwrap();
        let mut data = ResponseData::new();
        data.insert("MinSize".to_string(), Value::from(2));

        let response =
            CustomResourceResponse::for_request(&request, ResponseStatus::Success, "ok", data);
        let json: Value = serde_json::to_value(&response).unwrap();

        assert_eq!(json["Status"], "SUCCESS");
        assert_eq!(json["PhysicalResourceId"], "L");
        assert_eq!(json["NoEcho"], false);
        assert_eq!(json["Data"]["MinSize"], 2);
    }

    #[test]
    fn long_messages_are_truncated_on_char_boundaries() {
        let message = "é".repeat(20);
        let cut = truncate_chars(&message, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));

        assert_eq!(truncate_chars("short", 10), "short");
    }
}
