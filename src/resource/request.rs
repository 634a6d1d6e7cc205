// ABOUTME: Custom-resource request as delivered by the stack engine.
// ABOUTME: PascalCase wire format with a loosely typed property map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which lifecycle operation the stack engine is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// One custom-resource operation. Consumed exactly once; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceRequest {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    #[serde(default)]
    pub resource_type: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
    #[serde(default)]
    pub old_resource_properties: Option<Map<String, Value>>,
}

impl CustomResourceRequest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn is_delete(&self) -> bool {
        self.request_type == RequestType::Delete
    }

    /// A resource property as text. The stack engine sends scalars as strings,
    /// but numbers and booleans are accepted too.
    pub fn property(&self, name: &str) -> Option<String> {
        match self.resource_properties.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Physical id to report: the existing one when the resource already exists,
    /// so updates are never mistaken for replacements.
    pub fn stable_physical_id(&self) -> String {
        self.physical_resource_id
            .clone()
            .unwrap_or_else(|| self.logical_resource_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPDATE: &str = r#"{
        "RequestType": "Update",
        "ResponseURL": "http://127.0.0.1:9/callback",
        "StackId": "arn:stack/web/1",
        "RequestId": "req-1",
        "ResourceType": "Custom::FleetSize",
        "LogicalResourceId": "FleetSize",
        "PhysicalResourceId": "FleetSize-abc",
        "ResourceProperties": {"ServiceToken": "arn:fn", "MinSize": "1", "MaxSize": 4, "Unset": null}
    }"#;

    #[test]
    fn parses_wire_format() {
        let request = CustomResourceRequest::from_json(UPDATE).unwrap();
        assert_eq!(request.request_type, RequestType::Update);
        assert_eq!(request.response_url, "http://127.0.0.1:9/callback");
        assert!(!request.is_delete());
    }

    #[test]
    fn properties_are_read_as_text() {
        let request = CustomResourceRequest::from_json(UPDATE).unwrap();
        assert_eq!(request.property("MinSize").as_deref(), Some("1"));
        assert_eq!(request.property("MaxSize").as_deref(), Some("4"));
        assert_eq!(request.property("Unset"), None);
        assert_eq!(request.property("Missing"), None);
    }

    #[test]
    fn physical_id_is_kept_across_updates() {
        let mut request = CustomResourceRequest::from_json(UPDATE).unwrap();
        assert_eq!(request.stable_physical_id(), "FleetSize-abc");

        request.physical_resource_id = None;
        assert_eq!(request.stable_physical_id(), "FleetSize");
    }
}
