//! Custom resource lifecycle requests and responses

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Lifecycle request sent by the provisioning service for a custom resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,

    /// Pre-signed URL the response is written to
    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    pub stack_id: String,

    pub request_id: String,

    pub logical_resource_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    #[serde(default)]
    pub resource_properties: HashMap<String, Value>,
}

impl CustomResourceEvent {
    /// String-valued resource property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.resource_properties.get(key).and_then(Value::as_str)
    }
}

/// Response written back for a custom resource request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    pub stack_id: String,

    pub request_id: String,

    pub logical_resource_id: String,
}

impl CustomResourceResponse {
    /// Response skeleton echoing the request identity
    pub fn for_event(event: &CustomResourceEvent, status: ResponseStatus) -> Self {
        Self {
            status,
            reason: None,
            physical_resource_id: event.physical_resource_id.clone(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
        }
    }
}
